//! Provisioning Context
//!
//! Explicit state handed to every step: configuration, host facts, the
//! search path used for child processes, and the I/O collaborators. Steps
//! never read or modify the process environment or working directory.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::{expand_path, ProvisionConfig};
use crate::console::{AssumeYes, Confirm, Prompt, Reporter};
use crate::environment::conda;
use crate::environment::{
    probe, CapturedOutput, CommandLine, CommandRunner, CommandStatus, EnvironmentProbe, Platform,
    SystemRunner, HOST_PLATFORM,
};
use crate::error::{ProvisionError, Result};

pub struct Context {
    pub config: ProvisionConfig,
    pub platform: Platform,
    pub home: PathBuf,
    pub working_dir: PathBuf,
    /// Scratch space for downloads.
    pub temp_dir: PathBuf,
    pub reporter: Reporter,
    search_path: Option<OsString>,
    changed: bool,
    runner: Box<dyn CommandRunner>,
    prompt: Box<dyn Prompt>,
}

impl Context {
    /// Creates a context for the detected host that runs real commands and
    /// asks on the terminal (or assumes yes when configured).
    pub fn new(config: ProvisionConfig, home: PathBuf, working_dir: PathBuf) -> Self {
        let prompt: Box<dyn Prompt> = if config.assume_yes {
            Box::new(AssumeYes::new(io::stdout()))
        } else {
            Box::new(Confirm::terminal())
        };

        Self {
            config,
            platform: HOST_PLATFORM.clone(),
            home,
            working_dir,
            temp_dir: env::temp_dir(),
            reporter: Reporter::for_terminal(),
            search_path: None,
            changed: false,
            runner: Box::new(SystemRunner),
            prompt,
        }
    }

    /// Builds a context from the current process: `HOME`, the current
    /// directory, `PATH` and the system temporary directory. An existing conda installation is put first
    /// on the search path.
    pub fn from_process(config: ProvisionConfig) -> Result<Self> {
        let home = env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .ok_or(ProvisionError::NoHomeDirectory)?;
        let working_dir = env::current_dir()?;

        let mut ctx = Self::new(config, home, working_dir)
            .with_search_path(env::var_os("PATH"));

        let prefix = ctx.conda_prefix();
        if conda::is_installed(&prefix) {
            ctx.prepend_search_path(&prefix.join("bin"));
        }

        Ok(ctx)
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Expands a configured path (`~`, relative paths).
    pub fn resolve(&self, raw: &str) -> PathBuf {
        expand_path(raw, &self.home, &self.working_dir)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.resolve(&self.config.pipeline.target_dir)
    }

    pub fn conda_prefix(&self) -> PathBuf {
        self.resolve(&self.config.conda.prefix)
    }

    pub fn helper_script_path(&self) -> PathBuf {
        self.resolve(&self.config.helper_script)
    }

    /// Environment descriptor inside the pipeline checkout.
    pub fn env_file_path(&self) -> PathBuf {
        self.target_dir().join(&self.config.environment.file)
    }

    pub fn search_path(&self) -> Option<&OsStr> {
        self.search_path.as_deref()
    }

    /// Puts `dir` in front of the search path, once.
    pub fn prepend_search_path(&mut self, dir: &Path) {
        let mut dirs: Vec<PathBuf> = self
            .search_path
            .as_deref()
            .map(|path| env::split_paths(path).collect())
            .unwrap_or_default();

        if dirs.first().map(PathBuf::as_path) == Some(dir) {
            return;
        }
        dirs.retain(|existing| existing != dir);
        dirs.insert(0, dir.to_path_buf());

        match env::join_paths(&dirs) {
            Ok(joined) => {
                debug!("Search path now starts with {}", dir.display());
                self.search_path = Some(joined);
            }
            Err(e) => warn!("Could not add {} to the search path: {}", dir.display(), e),
        }
    }

    /// Records that a step changed the provisioned system in this run.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    fn prepare(&self, mut command: CommandLine) -> CommandLine {
        if command.search_path.is_none() {
            command.search_path = self.search_path.clone();
        }
        if command.current_dir.is_none() {
            command.current_dir = Some(self.working_dir.clone());
        }
        command
    }

    /// Runs a command and returns its exit status.
    pub fn run(&mut self, command: CommandLine) -> Result<CommandStatus> {
        let command = self.prepare(command);
        Ok(self.runner.run(&command)?)
    }

    /// Runs a command and turns a non-zero exit into an error.
    pub fn run_checked(&mut self, command: CommandLine) -> Result<()> {
        let display = command.to_string();
        let status = self.run(command)?;
        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::CommandFailed {
                command: display,
                status: status.to_string(),
            })
        }
    }

    pub fn capture(&mut self, command: CommandLine) -> Result<CapturedOutput> {
        let command = self.prepare(command);
        Ok(self.runner.capture(&command)?)
    }

    /// Probes for an executable on the context's search path.
    pub fn probe(&mut self, name: &str) -> EnvironmentProbe {
        probe(name, self.search_path.as_deref(), self.runner.as_mut())
    }

    /// Asks a yes/no question. A closed input counts as "no".
    pub fn confirm(&mut self, question: &str) -> bool {
        let answer = self.prompt.confirm(question);
        Self::settle_answer(question, answer)
    }

    /// Asks before deleting user data. Unattended runs never say yes here.
    pub fn confirm_destructive(&mut self, question: &str) -> bool {
        let answer = self.prompt.confirm_destructive(question);
        Self::settle_answer(question, answer)
    }

    fn settle_answer(question: &str, answer: Result<bool>) -> bool {
        match answer {
            Ok(answer) => {
                debug!("'{}' -> {}", question, if answer { "yes" } else { "no" });
                answer
            }
            Err(e) => {
                warn!("{}; treating as 'no'", e);
                false
            }
        }
    }
}
