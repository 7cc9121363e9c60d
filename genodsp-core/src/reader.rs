//! Reading `chrom start end [... value]` interval records.
//!
//! [`IntervalReader`] is one read session over a stream: it owns its line
//! counter, so every file starts counting from line one. Coordinates come
//! back exactly as written; converting an origin-one start is the caller's
//! job (see [`Interval::shift_origin`]).
use std::io::BufRead;

use log::{debug, info};

use crate::errors::{GenodspError, Result};
use crate::models::Interval;
use crate::utils::{parse_unsigned, parse_value};

/// Longest line (without its newline) any input file may contain.
pub const MAX_LINE_LENGTH: usize = 1000;

///
/// Read one line into `buf`, without the line terminator.
///
/// Returns `false` at end of input.
///
pub fn read_trimmed_line<R: BufRead>(reader: &mut R, buf: &mut String) -> Result<bool> {
    buf.clear();
    if reader.read_line(buf)? == 0 {
        return Ok(false);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(true)
}

/// Diagnostics shared by every interval read in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSettings {
    /// echo `#` comment lines
    pub report_comments: bool,
    /// report progress on line 1 and every N lines
    pub progress_every: Option<usize>,
    /// echo every line as it is read
    pub debug_input: bool,
    /// clamp intervals to the chromosome instead of rejecting overhangs
    pub clip_to_length: bool,
}

pub struct IntervalReader<R> {
    reader: R,
    line: String,
    line_number: usize,
    value_column: Option<usize>,
    settings: InputSettings,
}

impl<R: BufRead> IntervalReader<R> {
    ///
    /// Start a read session.
    ///
    /// # Arguments
    ///
    /// - reader: the stream to read from
    /// - value_column: zero-based column holding the value, or `None` to give
    ///   every interval the value 1
    ///
    pub fn new(reader: R, value_column: Option<usize>) -> Self {
        IntervalReader {
            reader,
            line: String::new(),
            line_number: 0,
            value_column,
            settings: InputSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: InputSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    ///
    /// Read the next interval, skipping blank, comment and `track` lines.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    pub fn next_interval(&mut self) -> Result<Option<Interval>> {
        loop {
            if !read_trimmed_line(&mut self.reader, &mut self.line)? {
                return Ok(None);
            }
            self.line_number += 1;
            let line_number = self.line_number;

            if self.line.len() > MAX_LINE_LENGTH {
                return Err(GenodspError::input_format(
                    line_number,
                    "line is longer than internal buffer",
                ));
            }

            if self.settings.debug_input {
                debug!("input = \"{}\"", self.line);
            }

            if self.line.starts_with("track ") {
                continue;
            }

            let progress_now = match self.settings.progress_every {
                Some(every) if every > 0 => line_number == 1 || line_number % every == 0,
                _ => false,
            };

            let text = self.line.trim_start();
            if text.is_empty() {
                if progress_now {
                    info!("progress: input line {}", line_number);
                }
                continue;
            }
            if text.starts_with('#') {
                if self.settings.report_comments {
                    info!("input line {}: {}", line_number, text);
                } else if progress_now {
                    info!("progress: input line {}", line_number);
                }
                continue;
            }

            if progress_now {
                info!("progress: input line {}", line_number);
            }

            return self.parse_line().map(Some);
        }
    }

    fn parse_line(&self) -> Result<Interval> {
        let line_number = self.line_number;
        if self.line.starts_with(char::is_whitespace) {
            return Err(GenodspError::input_format(
                line_number,
                "line contains no chromosome or begins with whitespace",
            ));
        }

        let mut fields = self.line.split_whitespace();
        let chrom = fields.next().unwrap_or_default();

        let start = match fields.next() {
            Some(field) => parse_unsigned(field)?,
            None => {
                return Err(GenodspError::input_format(
                    line_number,
                    "line contains no interval start\n(expected \"chromosome start end ...\", but there are fewer than 2 fields)",
                ));
            }
        };
        let end = match fields.next() {
            Some(field) => parse_unsigned(field)?,
            None => {
                return Err(GenodspError::input_format(
                    line_number,
                    "line contains no interval end\n(expected \"chromosome start end ...\", but there are fewer than 3 fields)",
                ));
            }
        };

        let value = match self.value_column {
            None => 1.0,
            Some(col) => match fields.nth(col.saturating_sub(3)) {
                Some(field) => parse_value(field)?,
                None => {
                    return Err(GenodspError::input_format(
                        line_number,
                        "line contains no interval value\n(expected \"chromosome start end value\", but there are fewer than 4 fields)",
                    ));
                }
            },
        };

        Ok(Interval::new(chrom, start, end, value))
    }
}

impl<R: BufRead> Iterator for IntervalReader<R> {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_interval().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    fn read_all(text: &str, value_column: Option<usize>) -> Result<Vec<Interval>> {
        IntervalReader::new(Cursor::new(text.to_string()), value_column).collect()
    }

    #[rstest]
    fn test_reads_bedgraph() {
        let text = "track type=bedGraph\n# comment\n\nchr1\t2\t5\t3\nchr1 4 8 2.5\n";
        let intervals = read_all(text, Some(3)).unwrap();
        assert_eq!(
            intervals,
            vec![
                Interval::new("chr1", 2, 5, 3.0),
                Interval::new("chr1", 4, 8, 2.5),
            ]
        );
    }

    #[rstest]
    fn test_no_value_column() {
        let intervals = read_all("chr2 0 10 name 7\n", None).unwrap();
        assert_eq!(intervals, vec![Interval::new("chr2", 0, 10, 1.0)]);
    }

    #[rstest]
    fn test_later_value_column() {
        let intervals = read_all("chr2 0 10 name 7\n", Some(4)).unwrap();
        assert_eq!(intervals[0].value, 7.0);
    }

    #[rstest]
    #[case(" chr1 1 2 3\n", "problem at line 1, line contains no chromosome or begins with whitespace")]
    #[case("chr1\n", "problem at line 1, line contains no interval start\n(expected \"chromosome start end ...\", but there are fewer than 2 fields)")]
    #[case("#x\nchr1 5\n", "problem at line 2, line contains no interval end\n(expected \"chromosome start end ...\", but there are fewer than 3 fields)")]
    #[case("chr1 5 6\n", "problem at line 1, line contains no interval value\n(expected \"chromosome start end value\", but there are fewer than 4 fields)")]
    fn test_malformed_lines(#[case] text: &str, #[case] expected: &str) {
        let err = read_all(text, Some(3)).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn test_long_line() {
        let text = format!("chr1 1 2 {}\n", "9".repeat(MAX_LINE_LENGTH));
        let err = read_all(&text, Some(3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "problem at line 1, line is longer than internal buffer"
        );
    }

    #[rstest]
    fn test_infinite_values() {
        let intervals = read_all("chr1 0 1 inf\nchr1 1 2 -1/inf\n", Some(3)).unwrap();
        assert_eq!(intervals[0].value, f64::MAX);
        assert_eq!(intervals[1].value, -f64::MIN_POSITIVE);
    }

    #[rstest]
    fn test_each_session_counts_its_own_lines() {
        let mut first = IntervalReader::new(Cursor::new("chr1 0 1 1\n"), Some(3));
        first.next_interval().unwrap();
        let mut second = IntervalReader::new(Cursor::new("chr1 0 1 1\n"), Some(3));
        second.next_interval().unwrap();
        assert_eq!(first.line_number(), 1);
        assert_eq!(second.line_number(), 1);
    }
}
