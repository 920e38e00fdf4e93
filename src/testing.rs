//! Test doubles for the command runner and the prompt.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::ProvisionConfig;
use crate::console::{Prompt, Reporter};
use crate::environment::{CapturedOutput, CommandLine, CommandRunner, CommandStatus, Platform};
use crate::error::{ProvisionError, Result};
use crate::provision::Context;

pub type CallLog = Rc<RefCell<Vec<CommandLine>>>;

type Matcher = Box<dyn Fn(&CommandLine) -> bool>;
type Effect = Box<dyn Fn(&CommandLine)>;

enum Reply {
    Output(CapturedOutput),
    SpawnError,
}

struct Rule {
    matches: Matcher,
    reply: Reply,
    effect: Option<Effect>,
}

/// Answers commands from a rule list; the first matching rule wins and
/// unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    log: CallLog,
}

fn output(code: i32, stdout: &str, stderr: &str) -> Reply {
    Reply::Output(CapturedOutput {
        status: CommandStatus::code(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

fn program_is(program: &str) -> impl Fn(&CommandLine) -> bool {
    let program = program.to_string();
    move |cmd: &CommandLine| cmd.program_name() == program
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, matches: impl Fn(&CommandLine) -> bool + 'static, reply: Reply) -> Self {
        self.rules.push(Rule {
            matches: Box::new(matches),
            reply,
            effect: None,
        });
        self
    }

    pub fn with_status(self, program: &str, code: i32) -> Self {
        self.rule(program_is(program), output(code, "", ""))
    }

    /// Exit code for `program` when any argument equals `arg`.
    pub fn with_status_for_arg(self, program: &str, arg: &str, code: i32) -> Self {
        let is_program = program_is(program);
        let arg = arg.to_string();
        self.rule(
            move |cmd| is_program(cmd) && cmd.args.iter().any(|a| *a == arg),
            output(code, "", ""),
        )
    }

    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        self.rule(program_is(program), output(0, stdout, ""))
    }

    /// Captured stdout for `program` when its first argument is `subcommand`.
    pub fn with_stdout_for(self, program: &str, subcommand: &str, stdout: &str) -> Self {
        let is_program = program_is(program);
        let subcommand = subcommand.to_string();
        self.rule(
            move |cmd| is_program(cmd) && cmd.args.first() == Some(&subcommand),
            output(0, stdout, ""),
        )
    }

    pub fn with_stderr(self, program: &str, stderr: &str) -> Self {
        self.rule(program_is(program), output(0, "", stderr))
    }

    pub fn with_spawn_error(self, program: &str) -> Self {
        self.rule(program_is(program), Reply::SpawnError)
    }

    /// Succeeds for `program` and runs `effect` to simulate what the real
    /// tool leaves behind.
    pub fn with_effect(mut self, program: &str, effect: impl Fn(&CommandLine) + 'static) -> Self {
        self = self.rule(program_is(program), output(0, "", ""));
        if let Some(rule) = self.rules.last_mut() {
            rule.effect = Some(Box::new(effect));
        }
        self
    }

    /// Shared handle to the list of executed commands.
    pub fn call_log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.log.borrow().clone()
    }

    fn answer(&mut self, command: &CommandLine) -> io::Result<CapturedOutput> {
        self.log.borrow_mut().push(command.clone());

        let Some(rule) = self.rules.iter().find(|rule| (rule.matches)(command)) else {
            return Ok(CapturedOutput {
                status: CommandStatus::SUCCESS,
                stdout: String::new(),
                stderr: String::new(),
            });
        };

        if let Some(ref effect) = rule.effect {
            effect(command);
        }

        match rule.reply {
            Reply::Output(ref out) => Ok(out.clone()),
            Reply::SpawnError => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", command.program_name()),
            )),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, command: &CommandLine) -> io::Result<CommandStatus> {
        self.answer(command).map(|out| out.status)
    }

    fn capture(&mut self, command: &CommandLine) -> io::Result<CapturedOutput> {
        self.answer(command)
    }
}

/// Replays fixed answers; running out behaves like closed input.
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    questions: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            questions: Rc::default(),
        }
    }

    pub fn question_log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.questions)
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers.pop_front().ok_or(ProvisionError::PromptClosed)
    }
}

/// Writes a trivial executable script and returns its path.
pub fn write_executable(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

/// Context rooted in `root`: `root/home` is the home directory, `root/work`
/// the working directory, `root/tmp` the scratch directory and `root/bin`
/// the only search path entry. The host
/// is macos/aarch64, matching the built-in configuration.
pub fn test_context(root: &Path) -> Context {
    let home = root.join("home");
    let work = root.join("work");
    let bin = root.join("bin");
    let tmp = root.join("tmp");
    for dir in [&home, &work, &bin, &tmp] {
        fs::create_dir_all(dir).unwrap();
    }

    let config = ProvisionConfig::builtin().unwrap();
    Context::new(config, home, work)
        .with_platform(Platform::new("macos", "aarch64"))
        .with_temp_dir(tmp)
        .with_search_path(Some(bin.into_os_string()))
        .with_runner(ScriptedRunner::new())
        .with_prompt(ScriptedPrompt::new(&[]))
        .with_reporter(Reporter::plain())
}
