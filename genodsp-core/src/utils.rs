use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{GenodspError, Result};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|source| GenodspError::FileOpen {
        path: path.to_path_buf(),
        mode: "reading",
        source,
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Get a reader for either a gzipped, non-gzipped file, or stdin
///
/// # Arguments
///
/// - file_path: path to the file to read, or '-' for stdin
pub fn get_dynamic_reader_w_stdin(file_path_str: &str) -> Result<BufReader<Box<dyn Read>>> {
    if file_path_str == "-" {
        Ok(BufReader::new(Box::new(std::io::stdin()) as Box<dyn Read>))
    } else {
        get_dynamic_reader(Path::new(file_path_str))
    }
}

/// Open a file for writing, or stdout for '-'.
pub fn get_dynamic_writer(file_path_str: &str) -> Result<BufWriter<Box<dyn Write>>> {
    if file_path_str == "-" {
        return Ok(BufWriter::new(Box::new(std::io::stdout()) as Box<dyn Write>));
    }
    let path = Path::new(file_path_str);
    let file = File::create(path).map_err(|source| GenodspError::FileOpen {
        path: path.to_path_buf(),
        mode: "writing",
        source,
    })?;
    Ok(BufWriter::new(Box::new(file) as Box<dyn Write>))
}

///
/// Parse a floating point value, if the string is one.
///
/// Besides ordinary numbers this understands `inf`, `+inf`, `-inf` (the
/// largest finite magnitudes) and `1/inf`, `+1/inf`, `-1/inf` (the smallest
/// positive normal magnitudes). Returns `None` for anything else, which lets
/// callers treat the string as a variable name instead.
///
pub fn try_parse_value(s: &str) -> Option<f64> {
    match s.trim() {
        "" => None,
        "inf" | "+inf" => Some(f64::MAX),
        "-inf" => Some(-f64::MAX),
        "1/inf" | "+1/inf" => Some(f64::MIN_POSITIVE),
        "-1/inf" => Some(-f64::MIN_POSITIVE),
        other => match other.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => None,
        },
    }
}

pub fn parse_value(s: &str) -> Result<f64> {
    if s.trim().is_empty() {
        return Err(GenodspError::argument("an empty string is not a number"));
    }
    try_parse_value(s).ok_or_else(|| GenodspError::argument(format!("\"{}\" is not a number", s)))
}

pub fn parse_int(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| GenodspError::argument(format!("\"{}\" is not an integer", s)))
}

///
/// Parse an integer that may carry a K, M or G suffix (powers of 1000).
///
/// Decimal values are allowed and rounded, so `1.5K` is 1500.
///
pub fn parse_unitized_int(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    let (digits, mult) = match trimmed.chars().last() {
        Some('K') | Some('k') => (&trimmed[..trimmed.len() - 1], 1_000i64),
        Some('M') | Some('m') => (&trimmed[..trimmed.len() - 1], 1_000_000),
        Some('G') | Some('g') => (&trimmed[..trimmed.len() - 1], 1_000_000_000),
        _ => (trimmed, 1),
    };

    let not_an_integer = || GenodspError::argument(format!("\"{}\" is not an integer", s));
    let out_of_range = || GenodspError::argument(format!("\"{}\" is out of range for an integer", s));

    if let Ok(v) = digits.parse::<i64>() {
        return v.checked_mul(mult).ok_or_else(out_of_range);
    }

    let vf: f64 = digits.parse().map_err(|_| not_an_integer())?;
    if !vf.is_finite() {
        return Err(not_an_integer());
    }
    let scaled = vf * mult as f64;
    if scaled.abs() > i64::MAX as f64 {
        return Err(out_of_range());
    }
    Ok((scaled + 0.5).floor() as i64)
}

/// Parse an unsigned integer, such as a chromosome length.
pub fn parse_unsigned(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(GenodspError::argument(
            "an empty string is not an unsigned integer",
        ));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| GenodspError::argument(format!("\"{}\" is not an unsigned integer", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("100", 100)]
    #[case("2K", 2_000)]
    #[case("1.5k", 1_500)]
    #[case("3M", 3_000_000)]
    #[case("1G", 1_000_000_000)]
    #[case("2.4", 2)]
    #[case("2.5", 3)]
    fn test_parse_unitized_int(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(parse_unitized_int(input).unwrap(), expected);
    }

    #[rstest]
    fn test_parse_unitized_int_rejects_garbage() {
        assert!(parse_unitized_int("abc").is_err());
        assert!(parse_unitized_int("K").is_err());
    }

    #[rstest]
    #[case("3.25", Some(3.25))]
    #[case("-1e3", Some(-1000.0))]
    #[case("inf", Some(f64::MAX))]
    #[case("-inf", Some(-f64::MAX))]
    #[case("1/inf", Some(f64::MIN_POSITIVE))]
    #[case("percentile50", None)]
    #[case("nan", None)]
    #[case("", None)]
    fn test_try_parse_value(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(try_parse_value(input), expected);
    }

    #[rstest]
    fn test_parse_unsigned() {
        assert_eq!(parse_unsigned(" 42").unwrap(), 42);
        assert_eq!(
            parse_unsigned("-3").unwrap_err().to_string(),
            "\"-3\" is not an unsigned integer"
        );
    }

    #[rstest]
    fn test_parse_value_error_message() {
        let err = parse_value("bogus").unwrap_err();
        assert_eq!(err.to_string(), "\"bogus\" is not a number");
    }
}
