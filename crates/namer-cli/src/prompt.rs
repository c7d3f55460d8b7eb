//! Line-oriented interactive prompts.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use namer_core::NamerError;

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one line, without the line terminator.
    fn line(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut buf = String::new();
        let n = self
            .input
            .read_line(&mut buf)
            .context("reading from standard input")?;
        if n == 0 {
            bail!("input closed while waiting for: {}", label.trim_end());
        }
        Ok(buf.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask until `parse` accepts the answer. Rejections are shown and the
    /// question repeated.
    pub fn ask_with<T>(
        &mut self,
        label: &str,
        parse: impl Fn(&str) -> std::result::Result<T, NamerError>,
    ) -> Result<T> {
        loop {
            let answer = self.line(label)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    pub fn ask<T: FromStr<Err = NamerError>>(&mut self, label: &str) -> Result<T> {
        self.ask_with(label, str::parse::<T>)
    }

    /// Ask for a non-empty, trimmed line of free text.
    pub fn ask_text(&mut self, label: &str, field: &'static str) -> Result<String> {
        self.ask_with(label, |s| {
            let s = s.trim();
            if s.is_empty() {
                Err(NamerError::InvalidInput {
                    field,
                    value: String::new(),
                })
            } else {
                Ok(s.to_string())
            }
        })
    }

    /// Read content lines until one that is just `.`, or end of input.
    /// Every kept line ends with `\n`.
    pub fn content(&mut self, label: &str) -> Result<Vec<u8>> {
        writeln!(self.output, "{label}")?;
        self.output.flush()?;

        let mut content = String::new();
        loop {
            let mut buf = String::new();
            if self.input.read_line(&mut buf)? == 0 {
                break;
            }
            let line = buf.trim_end_matches(['\r', '\n']);
            if line.trim() == "." {
                break;
            }
            content.push_str(line);
            content.push('\n');
        }
        Ok(content.into_bytes())
    }
}
