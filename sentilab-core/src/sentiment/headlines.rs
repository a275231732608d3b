//! Headline file parsing.
//!
//! Format: one headline per line, `YYYY-MM-DD <headline text>`. Blank lines
//! are ignored. Any other line that does not match is skipped with a warning;
//! a bad line never aborts the read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

use super::SentimentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub date: NaiveDate,
    pub text: String,
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRejection {
    /// No space separates a date prefix from the text.
    MissingDatePrefix,
    /// The prefix is not a `YYYY-MM-DD` calendar date.
    InvalidDate(String),
}

impl std::fmt::Display for LineRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineRejection::MissingDatePrefix => f.write_str("missing date prefix"),
            LineRejection::InvalidDate(prefix) => write!(f, "invalid date '{prefix}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub content: String,
    pub reason: LineRejection,
}

/// Parsed headlines plus the lines that were skipped.
#[derive(Debug, Clone, Default)]
pub struct HeadlineParse {
    pub headlines: Vec<Headline>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse a single non-blank line.
///
/// A date with no text after it counts as a missing prefix: the line has no
/// space-separated date in front of anything.
pub fn parse_headline_line(line: &str) -> Result<Headline, LineRejection> {
    let (prefix, text) = line
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(LineRejection::MissingDatePrefix)?;

    let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| LineRejection::InvalidDate(prefix.to_string()))?;

    Ok(Headline {
        date,
        text: text.trim().to_string(),
    })
}

pub fn read_headlines<R: BufRead>(reader: R) -> Result<HeadlineParse, SentimentError> {
    let mut parsed = HeadlineParse::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_headline_line(&line) {
            Ok(headline) => parsed.headlines.push(headline),
            Err(reason) => {
                tracing::warn!(line = i + 1, %reason, content = %line, "skipping malformed headline");
                parsed.skipped.push(SkippedLine {
                    line_number: i + 1,
                    content: line,
                    reason,
                });
            }
        }
    }

    Ok(parsed)
}

pub fn read_headline_file(path: &Path) -> Result<HeadlineParse, SentimentError> {
    let file = std::fs::File::open(path).map_err(|source| SentimentError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_headlines(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dated_headline() {
        let h = parse_headline_line("2020-03-15 Apple beats earnings expectations").unwrap();
        assert_eq!(h.date, NaiveDate::from_ymd_opt(2020, 3, 15).unwrap());
        assert_eq!(h.text, "Apple beats earnings expectations");
    }

    #[test]
    fn rejects_bad_date_prefix() {
        assert_eq!(
            parse_headline_line("not-a-date hello"),
            Err(LineRejection::InvalidDate("not-a-date".into()))
        );
        assert!(matches!(
            parse_headline_line("2020-02-30 impossible day"),
            Err(LineRejection::InvalidDate(_))
        ));
    }

    #[test]
    fn rejects_line_without_text() {
        assert_eq!(
            parse_headline_line("2020-03-15"),
            Err(LineRejection::MissingDatePrefix)
        );
        assert_eq!(
            parse_headline_line("2020-03-15   "),
            Err(LineRejection::MissingDatePrefix)
        );
        assert_eq!(
            parse_headline_line("2020-03-15 \t "),
            Err(LineRejection::MissingDatePrefix)
        );
    }

    #[test]
    fn tab_separator_is_accepted() {
        let h = parse_headline_line("2020-03-15\tApple rallies").unwrap();
        assert_eq!(h.text, "Apple rallies");
    }

    #[test]
    fn reader_skips_malformed_and_blank_lines() {
        let input = "2020-03-15 Apple beats earnings expectations\n\
                     \n\
                     not-a-date hello\n\
                     2020-03-16 Apple shares slip\n";
        let parsed = read_headlines(input.as_bytes()).unwrap();
        assert_eq!(parsed.headlines.len(), 2);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line_number, 3);
        assert_eq!(parsed.skipped[0].content, "not-a-date hello");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_headline_file(Path::new("/nonexistent/news_headlines.txt")).unwrap_err();
        assert!(err.to_string().contains("news_headlines.txt"));
    }
}
