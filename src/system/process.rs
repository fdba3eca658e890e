//! Subprocess Utilities

use std::ffi::OsStr;
use std::io::{BufReader, Read};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};

use crate::system::{self, Error};

/// Convenience wrapper around `Command` for building a child process
pub struct ChildBuilder {
    arg0: String,
    command: Command,
}

impl ChildBuilder {
    pub fn new<S>(arg0: S) -> Self
    where
        S: AsRef<OsStr>,
    {
        Self {
            arg0: arg0.as_ref().to_string_lossy().to_string(),
            command: Command::new(arg0),
        }
    }

    /// Set args as in `Command`
    #[inline]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set stdout to pipe
    #[inline]
    pub fn pipe_stdout(mut self) -> Self {
        self.command.stdout(Stdio::piped());
        self
    }

    /// Set stderr to pipe
    #[inline]
    pub fn pipe_stderr(mut self) -> Self {
        self.command.stderr(Stdio::piped());
        self
    }

    /// Set stdout to null
    #[inline]
    pub fn silence_stdout(mut self) -> Self {
        self.command.stdout(Stdio::null());
        self
    }

    /// Set stderr to null
    #[inline]
    pub fn silence_stderr(mut self) -> Self {
        self.command.stderr(Stdio::null());
        self
    }

    pub fn spawn(mut self) -> Result<ChildProcess, Error> {
        // we don't care about escaping it properly, just for debugging
        let args_str = self
            .command
            .get_args()
            .map(|s| s.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let command_str = format!("{} {}", self.arg0, args_str);
        let child = self
            .command
            .spawn()
            .map_err(|e| Error::SpawnChild(command_str.clone(), e))?;
        Ok(ChildProcess { command_str, child })
    }
}

/// Convenience wrapper around `Child` for a spawned process
pub struct ChildProcess {
    command_str: String,
    child: Child,
}

impl ChildProcess {
    pub fn command(&self) -> &str {
        &self.command_str
    }

    /// Take the stdout of the child process and wrap it in a `BufReader`
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.child.stdout.take().map(BufReader::new)
    }

    /// Take the stderr of the child process and wrap it in a `BufReader`
    pub fn take_stderr(&mut self) -> Option<BufReader<ChildStderr>> {
        self.child.stderr.take().map(BufReader::new)
    }

    /// Wait for the child process to exit
    pub fn wait(mut self) -> Result<ExitStatus, Error> {
        let status = self
            .child
            .wait()
            .map_err(|e| Error::WaitForChild(self.command_str.clone(), e))?;
        Ok(status)
    }
}

/// Result of running a command line through the platform shell
pub struct ShellOutput {
    /// The exit code, -1 when the process was killed by a signal
    pub code: i32,
    /// Captured stdout, present when capture was requested
    pub stdout: Option<String>,
}

/// Run a command line through the platform shell (`sh -c` or `cmd /C`),
/// optionally capturing stdout.
///
/// Stderr always passes through to the caller's stderr.
pub fn run_shell(command_line: &str, capture_stdout: bool) -> Result<ShellOutput, Error> {
    system::verboseln!("Shell", "{}", command_line);
    let builder = if cfg!(windows) {
        ChildBuilder::new("cmd").args(["/C", command_line])
    } else {
        ChildBuilder::new("sh").args(["-c", command_line])
    };
    let builder = if capture_stdout {
        builder.pipe_stdout()
    } else {
        builder
    };
    let mut child = builder.spawn()?;
    let stdout = match child.take_stdout() {
        Some(mut reader) => {
            let mut buf = String::new();
            reader
                .read_to_string(&mut buf)
                .map_err(|e| Error::WaitForChild(child.command().to_string(), e))?;
            Some(buf)
        }
        None => None,
    };
    let status = child.wait()?;
    Ok(ShellOutput {
        code: status.code().unwrap_or(-1),
        stdout,
    })
}
