//! Line-based interactive prompts for metadata entry.
//!
//! This is a thin adapter: it only fills in a [`MetadataConfig`] (and answers
//! the odd yes/no question). All validation and file handling stays in
//! [`crate::processors::metadata`].

use std::io::{self, BufRead, Write};
use std::path::Path;

use log::warn;

use crate::config::MetadataConfig;
use super::metadata::{extract_date, parse_manual_date, DateExtraction};

/// Asks questions on a writer and reads answers from a reader.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print `question` and return the trimmed answer; empty at end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.writer, "[INPUT] {} ", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Yes/no question; only `y` or `yes` (any case) count as yes.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} (y/n):", question))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Consume the prompter, returning the writer (useful to inspect output).
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Ask for the free-text metadata fields, starting from `defaults`.
///
/// Empty answers are stored as empty strings.
pub fn prompt_metadata_config<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    defaults: MetadataConfig,
) -> io::Result<MetadataConfig> {
    let origin_file_id = prompter.ask("Name of connected Origin (.opj) file (optional):")?;
    let short_file_id = prompter.ask("Short file id:")?;
    let injections = prompter.ask("Injections:")?;
    let rounds = prompter.ask("Rounds:")?;

    Ok(MetadataConfig {
        origin_file_id,
        short_file_id,
        injections,
        rounds,
        ..defaults
    })
}

/// Offer manual date entry when the file name holds an invalid date token.
///
/// Returns the entered date in `YYYY-MM-DD` form, or `None` when the file
/// name is fine, the user declines or the entry is invalid.
pub fn prompt_date_fallback<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    file_name: &str,
) -> io::Result<Option<String>> {
    if !matches!(extract_date(file_name), DateExtraction::Invalid(_)) {
        return Ok(None);
    }

    warn!("Could not extract date from {}", file_name);
    if !prompter.confirm("Do you want to manually enter the date?")? {
        warn!("Continuing without date.");
        return Ok(None);
    }

    let entered = prompter.ask("Enter the date in YYYY-MM-DD format:")?;
    match parse_manual_date(&entered) {
        Some(date) => Ok(Some(date)),
        None => {
            warn!("Invalid date format: {}. Continuing without date.", entered);
            Ok(None)
        }
    }
}

/// Ask whether a missing output directory should be created.
pub fn prompt_create_output_dir<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    output_dir: &Path,
) -> io::Result<bool> {
    if output_dir.is_dir() {
        return Ok(false);
    }
    prompter.confirm(&format!(
        "Could not find output directory: {}. Do you want to create it?",
        output_dir.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_trims_and_handles_eof() {
        let mut p = prompter("  hello \n");
        assert_eq!(p.ask("Q?").unwrap(), "hello");
        assert_eq!(p.ask("Again?").unwrap(), "");

        let output = String::from_utf8(p.into_writer()).unwrap();
        assert!(output.contains("[INPUT] Q?"));
    }

    #[test]
    fn test_confirm() {
        let mut p = prompter("Y\nno\nyes\n");
        assert!(p.confirm("A").unwrap());
        assert!(!p.confirm("B").unwrap());
        assert!(p.confirm("C").unwrap());
        assert!(!p.confirm("D").unwrap());
    }

    #[test]
    fn test_prompt_metadata_config_keeps_empty_answers() {
        let mut p = prompter("origin.opj\n\n5\n");
        let defaults = MetadataConfig {
            create_output_dir: true,
            ..MetadataConfig::default()
        };

        let config = prompt_metadata_config(&mut p, defaults).unwrap();

        assert_eq!(config.origin_file_id, "origin.opj");
        assert_eq!(config.short_file_id, "");
        assert_eq!(config.injections, "5");
        assert_eq!(config.rounds, "");
        assert!(config.create_output_dir);
    }

    #[test]
    fn test_prompt_date_fallback() {
        let mut valid_name = prompter("y\n2022-01-01\n");
        assert_eq!(
            prompt_date_fallback(&mut valid_name, "a_25112022.csv").unwrap(),
            None
        );

        let mut accepted = prompter("y\n2022-11-25\n");
        assert_eq!(
            prompt_date_fallback(&mut accepted, "a_20221125.csv").unwrap(),
            Some("2022-11-25".to_string())
        );

        let mut declined = prompter("n\n");
        assert_eq!(prompt_date_fallback(&mut declined, "a_20221125.csv").unwrap(), None);

        let mut garbage = prompter("y\n25/11/2022\n");
        assert_eq!(prompt_date_fallback(&mut garbage, "a_20221125.csv").unwrap(), None);
    }

    #[test]
    fn test_prompt_create_output_dir() {
        let dir = tempfile::tempdir().unwrap();

        let mut existing = prompter("y\n");
        assert!(!prompt_create_output_dir(&mut existing, dir.path()).unwrap());

        let mut missing = prompter("y\n");
        assert!(prompt_create_output_dir(&mut missing, &dir.path().join("new")).unwrap());
    }
}
