//! Command execution inside a mounted root.
//!
//! Stdout and stderr of the child share one pipe so the captured log keeps
//! the order in which the installer wrote its lines.

use log::debug;
use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::string::FromUtf8Error;
use thiserror::Error;

/// Exit status `chroot(8)` uses when it cannot change root itself.
pub const CHROOT_FAILURE_STATUS: i32 = 125;

/// Exit statuses `chroot(8)` uses when the command inside the root cannot be
/// executed (126) or found (127).
pub const COMMAND_NOT_EXECUTABLE_STATUS: i32 = 126;
pub const COMMAND_NOT_FOUND_STATUS: i32 = 127;

const CHROOT_DIAGNOSTIC: &str = "chroot: cannot change root directory to";
const RUN_DIAGNOSTIC: &str = "chroot: failed to run command";

/// Output of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub combined_output: String,
    pub exit_status: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("no command given")]
    EmptyCommand,

    #[error("spawning '{}': {source}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("reading command output: {0}")]
    Capture(#[source] io::Error),

    #[error("changing root to '{}' failed: {}", .root.display(), .output.trim())]
    Chroot { root: PathBuf, output: String },

    #[error("running the command inside '{}' failed (status {status}): {}", .root.display(), .output.trim())]
    Launch {
        root: PathBuf,
        status: i32,
        output: String,
    },

    #[error("command output is not valid UTF-8: {0}")]
    Decode(#[from] FromUtf8Error),
}

/// Runs a command with `root` as its filesystem root.
pub trait Executor {
    fn run(&self, root: &Path, argv: &[String]) -> Result<ExecutionResult, ExecutionError>;
}

impl<X: Executor + ?Sized> Executor for &X {
    fn run(&self, root: &Path, argv: &[String]) -> Result<ExecutionResult, ExecutionError> {
        (**self).run(root, argv)
    }
}

/// [`Executor`] using the host's `chroot(8)`.
#[derive(Debug, Clone)]
pub struct ChrootExecutor {
    chroot_bin: PathBuf,
}

impl Default for ChrootExecutor {
    fn default() -> Self {
        Self {
            chroot_bin: PathBuf::from("chroot"),
        }
    }
}

impl ChrootExecutor {
    pub fn with_binary(chroot_bin: impl Into<PathBuf>) -> Self {
        Self {
            chroot_bin: chroot_bin.into(),
        }
    }
}

impl Executor for ChrootExecutor {
    fn run(&self, root: &Path, argv: &[String]) -> Result<ExecutionResult, ExecutionError> {
        if argv.is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }

        let mut cmd = Command::new(&self.chroot_bin);
        cmd.arg(root).args(argv);
        debug!("running {:?}", cmd);

        let (status, combined) = run_combined(cmd, &self.chroot_bin)?;
        let combined_output = String::from_utf8(combined)?;

        let exit_status = exit_code(status);
        match classify_chroot_failure(exit_status, &combined_output) {
            Some(ChrootFailure::ChangeRoot) => Err(ExecutionError::Chroot {
                root: root.to_path_buf(),
                output: combined_output,
            }),
            Some(ChrootFailure::Launch) => Err(ExecutionError::Launch {
                root: root.to_path_buf(),
                status: exit_status,
                output: combined_output,
            }),
            None => Ok(ExecutionResult {
                combined_output,
                exit_status,
            }),
        }
    }
}

/// Spawn `cmd` with stdout and stderr on one pipe and collect everything.
pub(crate) fn run_combined(mut cmd: Command, program: &Path) -> Result<(ExitStatus, Vec<u8>), ExecutionError> {
    let (mut reader, writer) = io::pipe().map_err(ExecutionError::Capture)?;
    let writer_clone = writer.try_clone().map_err(ExecutionError::Capture)?;
    cmd.stdin(Stdio::null())
        .stdout(writer_clone)
        .stderr(writer);

    let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;
    // The command still holds the write ends; the reader never sees EOF
    // until they are closed.
    drop(cmd);

    let mut combined = Vec::new();
    let read = reader.read_to_end(&mut combined);
    let status = child.wait().map_err(ExecutionError::Capture)?;
    read.map_err(ExecutionError::Capture)?;

    Ok((status, combined))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChrootFailure {
    ChangeRoot,
    Launch,
}

/// chroot(8) failures are told apart from installer exits by status and by
/// chroot's own diagnostic opening the output. The command never ran, so
/// nothing else can precede it.
fn classify_chroot_failure(exit_status: i32, output: &str) -> Option<ChrootFailure> {
    let first_line = output.lines().next().unwrap_or_default();
    match exit_status {
        CHROOT_FAILURE_STATUS if first_line.starts_with(CHROOT_DIAGNOSTIC) => {
            Some(ChrootFailure::ChangeRoot)
        }
        COMMAND_NOT_EXECUTABLE_STATUS | COMMAND_NOT_FOUND_STATUS
            if first_line.starts_with(RUN_DIAGNOSTIC) =>
        {
            Some(ChrootFailure::Launch)
        }
        _ => None,
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}
