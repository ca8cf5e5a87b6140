//! Mapping of the host OS to the way `jcmd` is invoked.

use std::path::{Path, PathBuf};

/// Name of the JDK diagnostic command.
pub const JCMD: &str = "jcmd";

/// How the diagnostic command is located on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPlatform {
    /// Linux and other `*nix`/`*nux` systems: run the `jcmd` shipped in the
    /// installation's `bin` directory.
    Unix,
    /// Windows and macOS: `jcmd` is expected on `PATH`.
    WindowsOrMac,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("OS not supported: {os} (only Windows, macOS and Unix systems can run jcmd)")]
pub struct UnsupportedPlatform {
    pub os: String,
}

impl CommandPlatform {
    /// Resolves the platform of the running host.
    pub fn detect() -> Result<Self, UnsupportedPlatform> {
        Self::from_os_name(std::env::consts::OS)
    }

    pub fn from_os_name(os: &str) -> Result<Self, UnsupportedPlatform> {
        let os_lower = os.to_lowercase();
        if os_lower.contains("nix") || os_lower.contains("nux") {
            Ok(CommandPlatform::Unix)
        } else if os_lower.contains("win") || os_lower.contains("mac") {
            Ok(CommandPlatform::WindowsOrMac)
        } else {
            Err(UnsupportedPlatform { os: os.to_string() })
        }
    }

    /// Program to execute, given the `bin` directory used as working directory.
    pub fn program(&self, bin_dir: &Path) -> PathBuf {
        match self {
            CommandPlatform::Unix => bin_dir.join(JCMD),
            CommandPlatform::WindowsOrMac => PathBuf::from(JCMD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_name() {
        assert_eq!(CommandPlatform::from_os_name("linux"), Ok(CommandPlatform::Unix));
        assert_eq!(
            CommandPlatform::from_os_name("windows"),
            Ok(CommandPlatform::WindowsOrMac)
        );
        assert_eq!(
            CommandPlatform::from_os_name("macos"),
            Ok(CommandPlatform::WindowsOrMac)
        );
        assert_eq!(
            CommandPlatform::from_os_name("Mac OS X"),
            Ok(CommandPlatform::WindowsOrMac)
        );
    }

    #[test]
    fn test_unsupported_os() {
        let err = CommandPlatform::from_os_name("freebsd").unwrap_err();
        assert_eq!(err.os, "freebsd");
        assert!(err.to_string().contains("freebsd"));
    }

    #[test]
    fn test_program_location() {
        let bin = Path::new("/opt/jdk/bin");
        assert_eq!(
            CommandPlatform::Unix.program(bin),
            PathBuf::from("/opt/jdk/bin/jcmd")
        );
        assert_eq!(
            CommandPlatform::WindowsOrMac.program(bin),
            PathBuf::from("jcmd")
        );
    }
}
