use crate::error::ExplorerError;
use std::process::ExitStatus;

/// What a finished script wrote to its two streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn from_bytes(stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Text returned to the caller of `run-script`.
    pub fn render(&self) -> String {
        if self.stderr.is_empty() {
            format!("Script output:\n{}", self.stdout)
        } else {
            format!("Script output:\n{}\n\nErrors:\n{}", self.stdout, self.stderr)
        }
    }

    /// Fault for a run that exited unsuccessfully. The message is the
    /// exception text from the last stderr line, without its type prefix; the
    /// trace is all of stderr.
    pub fn into_fault(self, status: ExitStatus) -> ExplorerError {
        let message = self
            .stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| exception_text(line).to_owned())
            .unwrap_or_else(|| match status.code() {
                Some(code) => format!("script exited with status {code}"),
                None => "script was terminated by a signal".to_owned(),
            });

        ExplorerError::Execution {
            message,
            trace: self.stderr,
        }
    }
}

/// `pkg.SomeError: text` becomes `text`. Lines without a type prefix, or
/// exceptions raised without a message, are kept whole.
fn exception_text(line: &str) -> &str {
    match line.split_once(": ") {
        Some((kind, text))
            if !kind.is_empty()
                && !text.is_empty()
                && kind
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '.') =>
        {
            text
        }
        _ => line,
    }
}
