//! Native Memory Tracking detection.
//!
//! NMT is a JVM startup switch, so whether it is active can only change
//! with a restart of the target process. The gate is therefore resolved
//! once and then passed around as an immutable value.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Startup flag that enables summary-level tracking.
pub const NMT_SUMMARY_FLAG: &str = "-XX:NativeMemoryTracking=summary";

/// Environment variables whose content the JVM adds to its options.
pub const OPTION_ENV_VARS: [&str; 2] = ["JAVA_TOOL_OPTIONS", "JDK_JAVA_OPTIONS"];

/// Launcher options that take the next argument as their value.
const OPTIONS_WITH_VALUE: [&str; 14] = [
    "-cp",
    "-classpath",
    "--class-path",
    "-p",
    "--module-path",
    "--upgrade-module-path",
    "--add-modules",
    "--limit-modules",
    "--add-reads",
    "--add-exports",
    "--add-opens",
    "--patch-module",
    "--enable-native-access",
    "--source",
];

/// JVM options of a `java` command line.
///
/// `argv[0]` is the launcher. Scanning stops at the main class, `-jar` or
/// `-m`/`--module`, since what follows belongs to the application.
pub fn jvm_options(argv: &[String]) -> Vec<&str> {
    let mut options = Vec::new();
    let mut args = argv.iter().skip(1).map(String::as_str);

    while let Some(arg) = args.next() {
        if !arg.starts_with('-')
            || matches!(arg, "-jar" | "-m" | "--module")
            || arg.starts_with("--module=")
        {
            break;
        }
        options.push(arg);
        if OPTIONS_WITH_VALUE.contains(&arg) {
            args.next();
        }
    }

    options
}

/// Whitespace separated options from `JAVA_TOOL_OPTIONS` and `JDK_JAVA_OPTIONS`.
pub fn env_options(environ: &[String]) -> Vec<String> {
    OPTION_ENV_VARS
        .iter()
        .filter_map(|var| {
            let prefix = format!("{var}=");
            environ
                .iter()
                .find_map(|entry| entry.strip_prefix(prefix.as_str()))
        })
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

/// Reads a NUL separated `/proc` file such as `cmdline` or `environ`.
fn read_nul_separated(path: &Path) -> io::Result<Vec<String>> {
    let raw = fs::read(path)?;
    Ok(String::from_utf8_lossy(&raw)
        .split('\0')
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect())
}

/// Cached answer to "is NMT summary tracking enabled in the target JVM?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentationGate {
    enabled: bool,
}

impl InstrumentationGate {
    /// Gate with a fixed answer, used for operator overrides.
    pub fn fixed(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Scans a startup flag list for the exact summary flag.
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled = flags.into_iter().any(|f| f.as_ref() == NMT_SUMMARY_FLAG);
        debug!("NMT summary flag present: {}", enabled);
        Self { enabled }
    }

    /// Reads the target JVM's options from `<proc_root>/<pid>`.
    ///
    /// Options come from the launcher arguments in `cmdline` and from the
    /// option variables in `environ`. `environ` is only readable by the
    /// process owner, so failing to read it is not an error.
    pub fn from_proc(proc_root: &Path, pid: &str) -> io::Result<Self> {
        let pid_dir = proc_root.join(pid);
        let argv = read_nul_separated(&pid_dir.join("cmdline"))?;

        let mut flags = match read_nul_separated(&pid_dir.join("environ")) {
            Ok(environ) => env_options(&environ),
            Err(e) => {
                debug!("Cannot read environment of pid {}: {}", pid, e);
                Vec::new()
            }
        };
        flags.extend(jvm_options(&argv).into_iter().map(str::to_string));

        Ok(Self::from_flags(flags))
    }

    /// Resolves the gate from explicit flags, falling back to `/proc`.
    ///
    /// An unreadable command line disables collection rather than failing.
    pub fn detect(explicit_flags: Option<&[String]>, proc_root: &Path, pid: &str) -> Self {
        if let Some(flags) = explicit_flags {
            return Self::from_flags(flags);
        }

        match Self::from_proc(proc_root, pid) {
            Ok(gate) => gate,
            Err(e) => {
                warn!(
                    "Cannot read command line of pid {} under {}: {} - treating NMT as disabled",
                    pid,
                    proc_root.display(),
                    e
                );
                Self::fixed(false)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs the operator hint once at startup when tracking is off.
    pub fn log_status(&self) {
        if self.enabled {
            info!("Native Memory Tracking (summary) is enabled");
        } else {
            warn!("Native Memory Tracking is not enabled - no NMT metrics will be collected");
            warn!("   Add {} to the JVM command line", NMT_SUMMARY_FLAG);
        }
    }
}
