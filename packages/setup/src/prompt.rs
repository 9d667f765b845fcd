//! Line prompts over any reader/writer pair so they can be driven in tests.

use colored::Colorize;
use std::io::{self, BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks once; an empty answer yields `default`
    pub fn ask(&mut self, label: &str, default: Option<&str>) -> io::Result<Option<String>> {
        match default {
            Some(d) => write!(self.output, "{} [{}]: ", label.bold(), d.dimmed())?,
            None => write!(self.output, "{}: ", label.bold())?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(default.map(str::to_string));
        }

        let answer = line.trim();
        if answer.is_empty() {
            Ok(default.map(str::to_string))
        } else {
            Ok(Some(answer.to_string()))
        }
    }

    /// Asks until the answer is empty or a valid URL
    pub fn ask_url(&mut self, label: &str, default: Option<&str>) -> io::Result<Option<String>> {
        loop {
            let Some(answer) = self.ask(label, default)? else {
                return Ok(None);
            };
            if url::Url::parse(&answer).is_ok() {
                return Ok(Some(answer));
            }
            writeln!(self.output, "{}", format!("'{}' is not a valid URL", answer).red())?;
            if default == Some(answer.as_str()) {
                return Ok(None);
            }
        }
    }

    pub fn confirm(&mut self, label: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} (y/n)", label), Some("n"))?;
        Ok(answer.is_some_and(|a| a.to_lowercase().starts_with('y')))
    }
}
