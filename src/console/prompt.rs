//! Yes/No Confirmation Prompt

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::error::{ProvisionError, Result};

/// Printed after an answer that is neither yes nor no.
pub const CORRECTION: &str = "Please answer 'y' or 'n'.";

/// Asks the user a yes/no question.
pub trait Prompt {
    /// Blocks until the user answers. There is no timeout.
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Like [`confirm`](Prompt::confirm), for questions whose "yes" deletes
    /// user data.
    fn confirm_destructive(&mut self, question: &str) -> Result<bool> {
        self.confirm(question)
    }
}

/// Line-based prompt over any reader/writer pair.
pub struct Confirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Confirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl Confirm<BufReader<Stdin>, Stdout> {
    /// Prompt bound to the process terminal.
    pub fn terminal() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt for Confirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            write!(self.output, "{} [y/n]: ", question)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Err(ProvisionError::PromptClosed);
            }

            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "{}", CORRECTION)?,
            }
        }
    }
}

/// Answers every question with yes (the `assume_yes` setting), except
/// destructive ones, which are answered with no.
pub struct AssumeYes<W> {
    output: W,
}

impl<W: Write> AssumeYes<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Prompt for AssumeYes<W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        writeln!(self.output, "{} [y/n]: y (assumed)", question)?;
        Ok(true)
    }

    fn confirm_destructive(&mut self, question: &str) -> Result<bool> {
        writeln!(self.output, "{} [y/n]: n (assumed, keeping existing data)", question)?;
        Ok(false)
    }
}

/// `y`/`yes` and `n`/`no`, case-insensitive.
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
