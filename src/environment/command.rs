//! External Command Execution
//!
//! Every collaborator (git, curl, sed, the conda installer, mamba) is driven
//! through [`CommandRunner`]. Steps build a [`CommandLine`] and only ever
//! look at the exit status, plus captured text for probes.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Working directory of the child; the context fills in its own.
    pub current_dir: Option<PathBuf>,
    /// Inherit the terminal instead of capturing output.
    pub interactive: bool,
    /// Search path handed to the child process.
    pub search_path: Option<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            interactive: false,
            search_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// File name of the program, used by fakes and log lines.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit status of a finished command. `None` means killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus(pub Option<i32>);

impl CommandStatus {
    pub const SUCCESS: CommandStatus = CommandStatus(Some(0));

    pub fn code(code: i32) -> Self {
        Self(Some(code))
    }

    pub fn success(&self) -> bool {
        self.0 == Some(0)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "a signal"),
        }
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self(status.code())
    }
}

/// Captured result of a non-interactive command.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Executes external commands on behalf of the steps.
pub trait CommandRunner {
    /// Runs a command to completion and returns its exit status.
    fn run(&mut self, command: &CommandLine) -> io::Result<CommandStatus>;

    /// Runs a command with captured stdout/stderr.
    fn capture(&mut self, command: &CommandLine) -> io::Result<CapturedOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn build(command: &CommandLine) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        if let Some(ref path) = command.search_path {
            cmd.env("PATH", path);
        }
        if let Some(ref dir) = command.current_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine) -> io::Result<CommandStatus> {
        debug!("Running: {}", command);

        let mut cmd = Self::build(command);
        if command.interactive {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null());
        }

        let status = cmd.status()?;
        debug!("`{}` finished with {:?}", command, status.code());
        Ok(status.into())
    }

    fn capture(&mut self, command: &CommandLine) -> io::Result<CapturedOutput> {
        debug!("Capturing: {}", command);

        let output = Self::build(command).stdin(Stdio::null()).output()?;

        Ok(CapturedOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
