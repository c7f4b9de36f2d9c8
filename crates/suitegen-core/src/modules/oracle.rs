use super::traits::OracleRunner;
use crate::domain::{OracleFailure, OracleOutput};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

const READER_GRACE: Duration = Duration::from_millis(500);

/// Runs the validator executable as a subprocess, one fixture per call.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    executable: PathBuf,
    accepted_exit_codes: Vec<i32>,
    timeout: Duration,
}

impl ProcessOracle {
    pub fn new(
        executable: impl Into<PathBuf>,
        accepted_exit_codes: impl Into<Vec<i32>>,
        timeout: Duration,
    ) -> Self {
        Self {
            executable: executable.into(),
            accepted_exit_codes: accepted_exit_codes.into(),
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Whether the executable can be launched at all. Any exit status counts:
    /// pngcheck without arguments reads stdin and exits non-zero.
    pub fn probe(&self) -> bool {
        match self.capture(&[]) {
            Capture::Exited { .. } => true,
            Capture::TimedOut { .. } | Capture::LaunchFailed(_) => false,
        }
    }

    /// Extracts `version X.Y.Z` from the usage text printed for an unknown option.
    pub fn version(&self) -> Option<String> {
        let text = match self.capture(&[OsStr::new("--invalid-option")]) {
            Capture::Exited { text, .. } => text,
            Capture::TimedOut { .. } | Capture::LaunchFailed(_) => return None,
        };
        parse_version(&text)
    }

    fn is_accepted(&self, exit_code: Option<i32>) -> bool {
        exit_code.is_some_and(|code| self.accepted_exit_codes.contains(&code))
    }

    fn capture(&self, args: &[&OsStr]) -> Capture {
        let mut command = Command::new(&self.executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => return Capture::LaunchFailed(source.to_string()),
        };

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => Some(status),
            Ok(None) => {
                kill_process_tree(&mut child);
                None
            }
            Err(source) => {
                kill_process_tree(&mut child);
                return Capture::LaunchFailed(source.to_string());
            }
        };

        // Descendants that escaped the kill may still hold the pipes open.
        let deadline = Instant::now() + READER_GRACE;
        let mut text = collect_reader(stdout, deadline);
        text.push_str(&collect_reader(stderr, deadline));

        match status {
            Some(status) => Capture::Exited {
                text,
                exit_code: status.code(),
            },
            None => Capture::TimedOut { text },
        }
    }
}

impl OracleRunner for ProcessOracle {
    fn run(&self, fixture_path: &Path) -> OracleOutput {
        match self.capture(&[fixture_path.as_os_str()]) {
            Capture::Exited { text, exit_code } => {
                let success = self.is_accepted(exit_code);
                debug!(
                    fixture = %fixture_path.display(),
                    ?exit_code,
                    success,
                    "oracle finished"
                );
                OracleOutput {
                    text,
                    exit_code,
                    success,
                    failure: None,
                }
            }
            Capture::TimedOut { mut text } => {
                warn!(
                    fixture = %fixture_path.display(),
                    timeout = ?self.timeout,
                    "oracle timed out"
                );
                push_note(
                    &mut text,
                    &format!("oracle timed out after {:?}", self.timeout),
                );
                OracleOutput {
                    text,
                    exit_code: None,
                    success: false,
                    failure: Some(OracleFailure::TimedOut {
                        after: self.timeout,
                    }),
                }
            }
            Capture::LaunchFailed(reason) => {
                warn!(
                    executable = %self.executable.display(),
                    %reason,
                    "oracle launch failed"
                );
                let mut text = String::new();
                push_note(&mut text, &format!("oracle failed to launch: {reason}"));
                OracleOutput {
                    text,
                    exit_code: None,
                    success: false,
                    failure: Some(OracleFailure::LaunchFailed { reason }),
                }
            }
        }
    }
}

enum Capture {
    Exited {
        text: String,
        exit_code: Option<i32>,
    },
    TimedOut {
        text: String,
    },
    LaunchFailed(String),
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            let _ = sender.send(buffer);
        });
        receiver
    })
}

fn collect_reader(receiver: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    receiver
        .and_then(|receiver| {
            receiver
                .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .ok()
        })
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn kill_process_tree(child: &mut Child) {
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// The oracle leads its own group, so its pid is the group id.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg takes plain integers and touches no memory of ours.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_: &Child) {}

fn push_note(text: &mut String, note: &str) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(note);
    text.push('\n');
}

fn parse_version(text: &str) -> Option<String> {
    let (_, rest) = text.split_once("version ")?;
    let version: String = rest
        .chars()
        .take_while(|character| character.is_ascii_digit() || *character == '.')
        .collect();
    let version = version.trim_end_matches('.');
    (!version.is_empty()).then(|| version.to_string())
}
