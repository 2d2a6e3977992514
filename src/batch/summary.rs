//! Summary log
//!
//! Markdown summary of a batch run. Every line goes to the console as-is and
//! to the file sink with ANSI styling stripped. The sink is flushed on
//! [`SummaryLog::close`] and again on drop, so early returns still persist it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;

use colored::Colorize;
use regex::Regex;

use crate::error::Result;

fn ansi_pattern() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI regex"))
}

/// Remove ANSI escape sequences
pub fn strip_ansi(line: &str) -> String {
    ansi_pattern().replace_all(line, "").into_owned()
}

/// Append-only dual-sink markdown log
pub struct SummaryLog<W: Write> {
    sink: Option<W>,
    console: bool,
}

impl SummaryLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`, echoing to stdout
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)).with_console(true))
    }
}

impl<W: Write> SummaryLog<W> {
    /// Log to `sink` only
    pub fn new(sink: W) -> Self {
        Self {
            sink: Some(sink),
            console: false,
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Append one line
    pub fn line(&mut self, line: &str) -> Result<()> {
        if self.console {
            println!("{}", line);
        }
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{}", strip_ansi(line))?;
        }
        Ok(())
    }

    /// Append a collapsible `<details>` block
    pub fn block(&mut self, headline: &str, body: &[String]) -> Result<()> {
        self.line("<details>")?;
        self.line(&format!("<summary>{}</summary>", headline))?;
        self.line("")?;
        for line in body {
            self.line(line)?;
        }
        if !body.is_empty() {
            self.line("")?;
        }
        self.line("</details>")
    }

    /// Block for a step that worked
    pub fn success(&mut self, headline: &str, details: &[String]) -> Result<()> {
        let headline = format!("{} {}", "✔".green(), headline);
        self.block(&headline, details)
    }

    /// Block for a step that failed, with the error text fenced
    pub fn failure(&mut self, headline: &str, error: &str) -> Result<()> {
        let headline = format!("{} {}", "✘".red(), headline);
        let body = vec!["```".to_string(), error.to_string(), "```".to_string()];
        self.block(&headline, &body)
    }

    /// Flush and hand back the sink
    pub fn close(mut self) -> Result<W> {
        let mut sink = self.sink.take().expect("sink present until close");
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write> Drop for SummaryLog<W> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[32mok\x1b[0m done"), "ok done");
    }

    #[test]
    fn test_failure_block_fences_error() {
        colored::control::set_override(true);
        let mut log = SummaryLog::new(Vec::new());
        log.failure("Failed for 'x'", "boom").unwrap();
        let text = String::from_utf8(log.close().unwrap()).unwrap();

        assert!(!text.contains('\x1b'));
        assert_eq!(
            text,
            "<details>\n<summary>✘ Failed for 'x'</summary>\n\n```\nboom\n```\n\n</details>\n"
        );
    }

    #[test]
    fn test_drop_flushes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.log");
        {
            let mut log = SummaryLog::new(BufWriter::new(File::create(&path).unwrap()));
            log.success("Generated 'a'", &[]).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<summary>✔ Generated 'a'</summary>"));
    }
}
