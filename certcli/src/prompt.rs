//! Line based interaction with the operator.
use std::{
	io::{self, BufRead, StdinLock, Stdout, Write},
	path::Path,
};

use crate::{Error, Result};

/// Reads answers from `R` and writes questions to `W`.
pub struct Prompt<R, W> {
	input: R,
	output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
	/// Prompt bound to the process' stdin and stdout.
	pub fn stdio() -> Self {
		Self::new(io::stdin().lock(), io::stdout())
	}
}

impl<R: BufRead, W: Write> Prompt<R, W> {
	/// Initialize `Prompt` over arbitrary streams.
	pub fn new(input: R, output: W) -> Self {
		Self { input, output }
	}

	/// Write `text` without a trailing newline and flush it.
	pub fn say(&mut self, text: &str) -> Result<()> {
		self.output.write_all(text.as_bytes())?;
		self.output.flush()?;
		Ok(())
	}

	/// Read one line, without its line ending. `None` on end of input.
	fn read_line(&mut self) -> Result<Option<String>> {
		let mut line = String::new();
		if self.input.read_line(&mut line)? == 0 {
			return Ok(None);
		}
		let len = line.trim_end_matches(['\r', '\n']).len();
		line.truncate(len);
		Ok(Some(line))
	}

	/// Ask for a value labelled `label`.
	///
	/// End of input is reported as [`Error::Cancelled`].
	pub fn ask(&mut self, label: &str) -> Result<String> {
		self.say(&format!("{label}: "))?;
		self.read_line()?.ok_or(Error::Cancelled)
	}

	/// Ask a yes/no question. Only `y` or `Y` counts as yes; end of input
	/// counts as no.
	pub fn confirm(&mut self, question: &str) -> Result<bool> {
		self.say(&format!("{question} (y/n) "))?;
		Ok(self
			.read_line()?
			.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
	}

	/// Read an answer to a question that has already been written.
	/// `None` on end of input.
	pub fn answer(&mut self) -> Result<Option<String>> {
		self.read_line()
	}
}

/// Decides whether an existing file may be replaced.
pub trait OverwriteGuard {
	/// Returns `true` if `path` may be overwritten.
	fn allow_overwrite(&mut self, path: &Path) -> Result<bool>;
}

impl<R: BufRead, W: Write> OverwriteGuard for Prompt<R, W> {
	fn allow_overwrite(&mut self, path: &Path) -> Result<bool> {
		self.confirm(&format!(
			"Are you sure you want to overwrite '{}'?",
			path.display()
		))
	}
}

/// Guard that allows every overwrite, for `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl OverwriteGuard for AssumeYes {
	fn allow_overwrite(&mut self, _path: &Path) -> Result<bool> {
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn prompt(input: &str) -> Prompt<&[u8], Vec<u8>> {
		Prompt::new(input.as_bytes(), Vec::new())
	}

	#[test]
	fn ask_strips_line_endings() {
		let mut p = prompt("Acme Corp\r\nnext\n");
		assert_eq!(p.ask("Organization").unwrap(), "Acme Corp");
		assert_eq!(p.ask("Other").unwrap(), "next");
		assert_eq!(
			String::from_utf8(p.output).unwrap(),
			"Organization: Other: "
		);
	}

	#[test]
	fn ask_at_eof_cancels() {
		let mut p = prompt("");
		assert!(matches!(p.ask("Country"), Err(Error::Cancelled)));
	}

	#[test]
	fn confirm_accepts_only_y() {
		assert!(prompt("y\n").confirm("ok?").unwrap());
		assert!(prompt("Y\n").confirm("ok?").unwrap());
		assert!(!prompt("yes\n").confirm("ok?").unwrap());
		assert!(!prompt("n\n").confirm("ok?").unwrap());
		assert!(!prompt("").confirm("ok?").unwrap());
	}

	#[test]
	fn overwrite_question_names_the_file() {
		let mut p = prompt("y\n");
		assert!(p.allow_overwrite(Path::new("out.pem")).unwrap());
		assert_eq!(
			String::from_utf8(p.output).unwrap(),
			"Are you sure you want to overwrite 'out.pem'? (y/n) "
		);
	}

	#[test]
	fn assume_yes_always_allows() {
		assert!(AssumeYes.allow_overwrite(Path::new("x")).unwrap());
	}
}
