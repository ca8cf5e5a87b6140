//! Runs `jcmd <pid> VM.native_memory summary` and captures its output.
//!
//! Every call spawns exactly one child process and does not return before
//! that child has exited and both of its pipes have been drained. On Unix the
//! child leads its own process group, so a timeout takes down whatever it
//! forked as well.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::platform::CommandPlatform;

/// Diagnostic command requesting the NMT summary.
pub const NMT_SUMMARY_COMMAND: &str = "VM.native_memory summary";

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Bytes kept per output stream; the rest is read and discarded.
pub const MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Source of raw NMT report text.
///
/// This is the seam the collector is tested through.
pub trait ReportFetcher {
    fn fetch_report(&self, pid: &str, install_root: &str) -> Result<String, FetchError>;
}

/// Fetches reports by running the JDK's `jcmd`.
#[derive(Debug, Clone)]
pub struct JcmdFetcher {
    platform: CommandPlatform,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl JcmdFetcher {
    /// `timeout: None` waits for `jcmd` indefinitely.
    pub fn new(platform: CommandPlatform, timeout: Option<Duration>) -> Self {
        Self {
            platform,
            timeout,
            max_output_bytes: MAX_OUTPUT_BYTES,
        }
    }

    /// Caps the bytes captured from each of stdout and stderr.
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn platform(&self) -> CommandPlatform {
        self.platform
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn build_command(&self, pid: &str, bin_dir: &Path) -> Command {
        let mut command = Command::new(self.platform.program(bin_dir));
        command
            .arg(pid)
            .arg(NMT_SUMMARY_COMMAND)
            .current_dir(bin_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use nix::unistd::{setpgid, Pid};
            use std::os::unix::process::CommandExt;

            // SAFETY: setpgid is async-signal-safe and runs in the forked
            // child before exec.
            unsafe {
                command.pre_exec(|| {
                    setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(io::Error::from)
                });
            }
        }

        command
    }
}

impl ReportFetcher for JcmdFetcher {
    #[instrument(skip(self))]
    fn fetch_report(&self, pid: &str, install_root: &str) -> Result<String, FetchError> {
        let bin_dir: PathBuf = Path::new(install_root).join("bin");
        let mut command = self.build_command(pid, &bin_dir);
        let program = format!("{:?}", command);

        info!("Running command : {}", program);

        let mut child = command.spawn().map_err(|source| FetchError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Both pipes are drained concurrently so a chatty child cannot block
        // on a full pipe while we wait for it.
        let stdout_reader = drain_in_background(child.stdout.take(), self.max_output_bytes);
        let stderr_reader = drain_in_background(child.stderr.take(), self.max_output_bytes);

        let status = wait_for_exit(&mut child, self.timeout);

        let stdout = join_drain(stdout_reader);
        let stderr = join_drain(stderr_reader);

        let status = match status {
            Ok(Some(status)) => status,
            Ok(None) => {
                return Err(FetchError::TimedOut {
                    program,
                    // A timeout is always set when wait_for_exit gives up.
                    timeout: self.timeout.unwrap_or_default(),
                })
            }
            Err(source) => return Err(FetchError::Io { program, source }),
        };

        let (mut combined, stdout_truncated) = stdout.map_err(|source| FetchError::Io {
            program: program.clone(),
            source,
        })?;
        let (stderr, stderr_truncated) = stderr.map_err(|source| FetchError::Io {
            program: program.clone(),
            source,
        })?;
        combined.extend(stderr);

        if stdout_truncated || stderr_truncated {
            warn!(
                "Output of {} exceeded {} bytes per stream and was truncated",
                program, self.max_output_bytes
            );
        }

        if !status.success() {
            warn!("{} exited with {}", program, status);
        }

        let output = String::from_utf8_lossy(&combined).into_owned();
        debug!("Output of command {} : {}", program, output);
        Ok(output)
    }
}

/// Captured bytes and whether anything beyond the cap was dropped.
type Drained = (Vec<u8>, bool);
type DrainHandle = Option<thread::JoinHandle<io::Result<Drained>>>;

fn drain_in_background<R>(pipe: Option<R>, max_bytes: usize) -> DrainHandle
where
    R: Read + Send + 'static,
{
    pipe.map(|pipe| thread::spawn(move || read_bounded(pipe, max_bytes)))
}

/// Reads `reader` to EOF, keeping at most `max_bytes`.
///
/// Reading continues past the cap so the writer never blocks on a full pipe.
fn read_bounded<R: Read>(mut reader: R, max_bytes: usize) -> io::Result<Drained> {
    let mut out = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let keep = max_bytes.saturating_sub(out.len()).min(n);
        out.extend_from_slice(&buf[..keep]);
        if keep < n {
            truncated = true;
        }
    }

    Ok((out, truncated))
}

fn join_drain(handle: DrainHandle) -> io::Result<Drained> {
    match handle {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked"))),
        None => Ok((Vec::new(), false)),
    }
}

/// Waits for the child, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` when the child was killed. The child is reaped in
/// every case.
fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!("Command exceeded timeout of {:?}, killing it", timeout);
            terminate_process_tree(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }
}

/// Kills the child together with every process it started.
///
/// Descendants inherit the output pipes, so killing only the child would
/// leave the readers blocked until they exit.
fn terminate_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The child's pid is its process group id, see `build_command`.
        let group = Pid::from_raw(child.id() as i32);
        if let Err(e) = killpg(group, Signal::SIGKILL) {
            debug!("Killing process group {} failed: {}", group, e);
        }
    }

    #[cfg(windows)]
    {
        let pid = child.id().to_string();
        if let Err(e) = Command::new("taskkill")
            .args(["/PID", &pid, "/T", "/F"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            debug!("taskkill for pid {} failed: {}", pid, e);
        }
    }

    // Covers a child that has not called setpgid yet or a failed taskkill.
    if let Err(e) = child.kill() {
        debug!("Kill after timeout failed: {}", e);
    }
}
