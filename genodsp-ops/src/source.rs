//! Interval files read by operators (`add`, `mask`, `multiply`, ...).
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;

use genodsp_core::errors::{GenodspError, Result};
use genodsp_core::reader::{InputSettings, IntervalReader};
use genodsp_core::registry::ChromosomeRegistry;
use genodsp_core::utils::get_dynamic_reader_w_stdin;
use genodsp_core::variables::Variables;

use crate::args::{
    arg_is, arg_value, default_origin_one, default_value_column, op_error, parse_origin,
    parse_value_column,
};

pub type FileReader = IntervalReader<BufReader<Box<dyn Read>>>;

///
/// An operator's interval file plus how to read it.
///
/// Parsed from the operator's arguments: the first bare word is the
/// filename; `--value=`/`--novalue` (when the file carries values),
/// `--origin=` and `--destroy` adjust how it is read.
///
#[derive(Debug, Clone)]
pub struct IntervalSource {
    filename: Option<String>,
    pub value_column: Option<usize>,
    pub origin_one: bool,
    pub destroy: bool,
    carries_value: bool,
}

impl IntervalSource {
    /// A source whose intervals carry a value (defaults from the globals).
    pub fn with_values(vars: &Variables) -> Self {
        IntervalSource {
            filename: None,
            value_column: default_value_column(vars),
            origin_one: default_origin_one(vars),
            destroy: false,
            carries_value: true,
        }
    }

    /// A source of bare intervals; every interval has the value 1.
    pub fn without_values(vars: &Variables) -> Self {
        IntervalSource {
            value_column: None,
            carries_value: false,
            ..Self::with_values(vars)
        }
    }

    ///
    /// Consume `arg` if it is one of the source's own arguments.
    ///
    /// Returns `Ok(false)` for anything else, leaving it to the operator.
    ///
    pub fn accept(&mut self, op: &str, arg: &str) -> Result<bool> {
        if self.carries_value {
            if arg_is(arg, &["--novalue", "--novalues"]) {
                self.value_column = None;
                return Ok(true);
            }
            if let Some(text) = arg_value(arg, &["--value="]) {
                self.value_column = parse_value_column(op, arg, text)?;
                return Ok(true);
            }
        }
        if let Some(text) = arg_value(arg, &["--origin="]) {
            self.origin_one = parse_origin(op, arg, text)?;
            return Ok(true);
        }
        if arg == "--destroy" {
            self.destroy = true;
            return Ok(true);
        }
        if arg.starts_with("--") || self.filename.is_some() {
            return Ok(false);
        }
        self.filename = Some(arg.to_string());
        Ok(true)
    }

    /// Fail unless a filename was given.
    pub fn require(&self, op: &str) -> Result<()> {
        match self.filename {
            Some(_) => Ok(()),
            None => Err(op_error(op, "no filename was provided")),
        }
    }

    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("-")
    }

    pub fn open(&self, input: InputSettings) -> Result<FileReader> {
        let reader = get_dynamic_reader_w_stdin(self.filename())?;
        Ok(IntervalReader::new(reader, self.value_column).with_settings(input))
    }

    /// Wrap an error with the operator and file it came from.
    pub fn in_file(&self, op: &str, err: GenodspError) -> GenodspError {
        match err {
            GenodspError::Domain(message) => GenodspError::domain(format!(
                "[{}] in \"{}\", {}",
                op,
                self.filename(),
                message
            )),
            other => other,
        }
    }

    ///
    /// Apply `f` to the array slice under each interval in the file.
    ///
    /// Intervals are placed the way the input reader places them. Zero
    /// valued intervals are skipped when `skip_zero` is set.
    ///
    pub fn for_each<F>(
        &self,
        op: &str,
        registry: &mut ChromosomeRegistry,
        input: InputSettings,
        track: bool,
        skip_zero: bool,
        mut f: F,
    ) -> Result<()>
    where
        F: FnMut(&mut [f64], f64),
    {
        let mut reader = self.open(input)?;
        let mut seen: Vec<String> = Vec::new();
        while let Some(interval) = reader.next_interval()? {
            if skip_zero && interval.value == 0.0 {
                continue;
            }
            let interval = interval.shift_origin(self.origin_one);
            let Some(spec) = registry.get_mut(&interval.chrom) else {
                continue;
            };
            if track && !seen.contains(&interval.chrom) {
                info!("{}({})", op, interval.chrom);
                seen.push(interval.chrom.clone());
            }
            let placed = spec
                .place(interval.start, interval.end, false)
                .map_err(|e| self.in_file(op, e))?;
            if let Some(range) = placed {
                f(&mut spec.values[range], interval.value);
            }
        }
        Ok(())
    }

    /// Delete the file, if `--destroy` was given.
    pub fn finish(&self) -> Result<()> {
        if self.destroy {
            if let Some(filename) = &self.filename {
                if filename != "-" {
                    fs::remove_file(Path::new(filename))?;
                }
            }
        }
        Ok(())
    }
}
