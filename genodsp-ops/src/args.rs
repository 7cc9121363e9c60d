//! Helpers shared by the operators' argument parsers.
//!
//! Operator arguments are free-form words, `--flag`, `--flag=value` or a
//! terse `X=value`, so each operator walks its own list and leans on these
//! for the common cases.
use log::{info, warn};

use genodsp_core::errors::{GenodspError, Result};
use genodsp_core::utils::{parse_int, parse_unitized_int, try_parse_value};
use genodsp_core::variables::Variables;

/// The part of `arg` after whichever of `prefixes` it starts with.
pub fn arg_value<'a>(arg: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| arg.strip_prefix(prefix))
}

pub fn arg_is(arg: &str, names: &[&str]) -> bool {
    names.contains(&arg)
}

pub fn cant_understand(op: &str, arg: &str) -> GenodspError {
    GenodspError::argument(format!("[{}] Can't understand \"{}\"", op, arg))
}

pub fn op_error(op: &str, message: impl std::fmt::Display) -> GenodspError {
    GenodspError::argument(format!("[{}] {}", op, message))
}

///
/// Parse a window or neighborhood size, which must be positive.
///
/// Sizes below `min` are raised to `min`, with a warning.
///
pub fn window_size(op: &str, what: &str, arg: &str, text: &str, min: usize) -> Result<usize> {
    let size = parse_unitized_int(text)?;
    if size == 0 {
        return Err(op_error(op, format!("{} can't be zero (\"{}\")", what, arg)));
    }
    if size < 0 {
        return Err(op_error(op, format!("{} can't be negative (\"{}\")", what, arg)));
    }
    Ok(raise_to(op, what, size as usize, min))
}

pub fn raise_to(op: &str, what: &str, size: usize, min: usize) -> usize {
    if size < min {
        warn!("[{}] WARNING: raising {} from {} to {}", op, what, size, min);
        min
    } else {
        size
    }
}

///
/// A number given either literally or as the name of a variable.
///
/// Variable references are looked up when first needed, which lets an
/// operator use a value computed by an earlier operator in the pipeline.
///
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRef {
    Literal(f64),
    Variable(String),
}

impl ValueRef {
    pub fn parse(text: &str) -> Self {
        match try_parse_value(text) {
            Some(v) => ValueRef::Literal(v),
            None => ValueRef::Variable(text.to_string()),
        }
    }

    ///
    /// Get the number, looking up (and remembering) a variable's value.
    ///
    /// # Arguments
    ///
    /// - op: operator name, for messages
    /// - what: what the value is used as, e.g. "threshold"
    /// - vars: the run's named variables
    ///
    pub fn resolve(&mut self, op: &str, what: &str, vars: &Variables) -> Result<f64> {
        match self {
            ValueRef::Literal(v) => Ok(*v),
            ValueRef::Variable(name) => {
                let Some(v) = vars.get(name) else {
                    return Err(GenodspError::domain(format!(
                        "[{}] attempt to use {} as {} failed (no such variable)",
                        op, name, what
                    )));
                };
                info!("[{}] using {} = {:.6} as {}", op, name, v, what);
                *self = ValueRef::Literal(v);
                Ok(v)
            }
        }
    }
}

/// Default value column: the `valColumn` variable (zero-based, negative
/// meaning none), else the fourth column.
pub fn default_value_column(vars: &Variables) -> Option<usize> {
    let col = vars.get_or("valColumn", 3.0);
    if col < 0.0 { None } else { Some(col as usize) }
}

///
/// Parse the text of `--value=<col>`: a one-based column of at least 4, or
/// `none`. Returns the zero-based column.
///
pub fn parse_value_column(op: &str, arg: &str, text: &str) -> Result<Option<usize>> {
    if text == "none" {
        return Ok(None);
    }
    let col = parse_int(text)?;
    match col {
        0 => Err(op_error(op, format!("value column can't be 0 (\"{}\")", arg))),
        c if c < 0 => Err(op_error(op, format!("value column can't be negative (\"{}\")", arg))),
        1..=3 => Err(op_error(op, format!("value column can't be 1, 2 or 3 (\"{}\")", arg))),
        c => Ok(Some(c as usize - 1)),
    }
}

pub fn default_origin_one(vars: &Variables) -> bool {
    vars.get_or("originOne", 0.0) != 0.0
}

/// Parse the text of `--origin=`; true for origin one.
pub fn parse_origin(op: &str, arg: &str, text: &str) -> Result<bool> {
    match text {
        "one" | "1" => Ok(true),
        "zero" | "0" => Ok(false),
        _ => Err(cant_understand(op, arg)),
    }
}

pub fn default_window_size(vars: &Variables, fallback: f64) -> f64 {
    vars.get_or("windowSize", fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_arg_value() {
        assert_eq!(arg_value("W=10", &["--window=", "W=", "--W="]), Some("10"));
        assert_eq!(arg_value("--window=1K", &["--window=", "W="]), Some("1K"));
        assert_eq!(arg_value("--windows=1", &["--window=", "W="]), None);
    }

    #[rstest]
    fn test_window_size() {
        assert_eq!(window_size("sum", "window size", "W=2", "2", 3).unwrap(), 3);
        assert_eq!(window_size("sum", "window size", "W=1K", "1K", 3).unwrap(), 1000);
        let err = window_size("sum", "window size", "W=0", "0", 3).unwrap_err();
        assert_eq!(err.to_string(), "[sum] window size can't be zero (\"W=0\")");
    }

    #[rstest]
    fn test_value_ref_resolution() {
        let mut vars = Variables::new();
        vars.set("percentile50", 2.5);

        let mut threshold = ValueRef::parse("percentile50");
        assert_eq!(threshold.resolve("clump", "threshold", &vars).unwrap(), 2.5);
        assert_eq!(threshold, ValueRef::Literal(2.5));

        let mut missing = ValueRef::parse("percentile90");
        let err = missing.resolve("clump", "threshold", &vars).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[clump] attempt to use percentile90 as threshold failed (no such variable)"
        );

        assert_eq!(ValueRef::parse("-3"), ValueRef::Literal(-3.0));
    }

    #[rstest]
    #[case("5", Some(4))]
    #[case("none", None)]
    fn test_parse_value_column(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_value_column("add", "--value=", text).unwrap(), expected);
    }

    #[rstest]
    fn test_parse_value_column_rejects_coordinates() {
        let err = parse_value_column("add", "--value=2", "2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[add] value column can't be 1, 2 or 3 (\"--value=2\")"
        );
    }

    #[rstest]
    fn test_defaults_from_variables() {
        let mut vars = Variables::new();
        assert_eq!(default_value_column(&vars), Some(3));
        vars.set("valColumn", -1.0);
        vars.set("originOne", 1.0);
        assert_eq!(default_value_column(&vars), None);
        assert!(default_origin_one(&vars));
    }
}
