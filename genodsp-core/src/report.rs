use std::io::Write;
use std::str::FromStr;

use log::info;

use crate::errors::{GenodspError, Result};
use crate::models::ChromosomeSpec;
use crate::registry::ChromosomeRegistry;

/// How bases holding zero are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uncovered {
    /// zeros end a run and are not written
    #[default]
    Hide,
    /// zeros are written like any other value
    Show,
    /// zero stretches are written as `NA` records
    Na,
}

impl Uncovered {
    /// Numeric code stored in the `showUncovered` variable.
    pub fn code(self) -> f64 {
        match self {
            Uncovered::Hide => 0.0,
            Uncovered::Show => 1.0,
            Uncovered::Na => -1.0,
        }
    }

    pub fn from_code(code: f64) -> Self {
        if code < 0.0 {
            Uncovered::Na
        } else if code > 0.0 {
            Uncovered::Show
        } else {
            Uncovered::Hide
        }
    }
}

impl FromStr for Uncovered {
    type Err = GenodspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hide" => Ok(Uncovered::Hide),
            "show" => Ok(Uncovered::Show),
            "NA" | "na" | "mark" => Ok(Uncovered::Na),
            _ => Err(GenodspError::argument(format!(
                "\"{}\" is not a valid uncovered mode (expected hide, show or NA)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    /// digits after the decimal point
    pub precision: usize,
    pub no_values: bool,
    /// write a run of equal values as one record
    pub collapse: bool,
    pub uncovered: Uncovered,
    pub origin_one: bool,
    pub track: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            precision: 0,
            no_values: false,
            collapse: true,
            uncovered: Uncovered::Hide,
            origin_one: false,
            track: false,
        }
    }
}

struct RunWriter<'a, W> {
    writer: &'a mut W,
    spec: &'a ChromosomeSpec,
    options: &'a ReportOptions,
    prev_end: u64,
}

impl<W: Write> RunWriter<'_, W> {
    fn origin(&self) -> u64 {
        if self.options.origin_one { 1 } else { 0 }
    }

    fn na(&mut self, end: u64) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\tNA",
            self.spec.name,
            self.prev_end + self.origin(),
            end
        )?;
        Ok(())
    }

    /// Write the run `start..end` (array indexes) holding `val`.
    fn run(&mut self, start: usize, end: usize, val: f64) -> Result<()> {
        let out_start = self.spec.start + start as u64;
        let out_end = self.spec.start + end as u64;
        if self.options.uncovered == Uncovered::Na && out_start != self.prev_end {
            self.na(out_start)?;
        }

        let o = self.origin();
        if self.options.no_values {
            writeln!(self.writer, "{}\t{}\t{}", self.spec.name, out_start + o, out_end)?;
        } else {
            writeln!(
                self.writer,
                "{}\t{}\t{}\t{:.prec$}",
                self.spec.name,
                out_start + o,
                out_end,
                val,
                prec = self.options.precision
            )?;
        }
        self.prev_end = out_end;
        Ok(())
    }
}

///
/// Write one chromosome's array as interval records.
///
pub fn report_chromosome<W: Write>(
    writer: &mut W,
    spec: &ChromosomeSpec,
    options: &ReportOptions,
) -> Result<()> {
    let mut out = RunWriter {
        writer,
        spec,
        options,
        prev_end: spec.start,
    };

    let v = &spec.values;
    let mut active = options.uncovered != Uncovered::Hide;
    let mut start = 0;
    let mut val = 0.0;

    for (ix, &x) in v.iter().enumerate() {
        if x == 0.0 && options.uncovered != Uncovered::Show {
            if active && ix != start {
                out.run(start, ix, val)?;
            }
            active = false;
            start = 0;
            val = 0.0;
            continue;
        }

        if !active {
            active = true;
            start = ix;
            val = x;
            continue;
        }

        if x == val && options.collapse {
            continue;
        }

        if ix != start {
            out.run(start, ix, val)?;
        }
        start = ix;
        val = x;
    }

    if active && start != v.len() {
        out.run(start, v.len(), val)?;
    } else if options.uncovered == Uncovered::Na && spec.end() != out.prev_end {
        out.na(spec.end())?;
    }
    Ok(())
}

///
/// Write every chromosome, in the order they were registered.
///
/// # Arguments
///
/// - registry: the chromosomes to write
/// - writer: destination
/// - options: formatting and gap handling
///
pub fn report_intervals<W: Write>(
    registry: &ChromosomeRegistry,
    writer: &mut W,
    options: &ReportOptions,
) -> Result<()> {
    for spec in registry.iter() {
        if options.track {
            info!("output({})", spec.name);
        }
        report_chromosome(writer, spec, options)?;
    }
    if options.track {
        info!("output(--done--)");
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    use crate::aggregate::{ReadOptions, apply_intervals};
    use crate::reader::IntervalReader;

    fn spec_with(values: Vec<f64>) -> ChromosomeSpec {
        let mut spec = ChromosomeSpec::new("chr1", 0, values.len());
        spec.values = values;
        spec
    }

    fn render(spec: &ChromosomeSpec, options: ReportOptions) -> String {
        let mut out = Vec::new();
        report_chromosome(&mut out, spec, &options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[fixture]
    fn gappy() -> ChromosomeSpec {
        spec_with(vec![0.0, 2.0, 2.0, 0.0, 0.0, 3.0, 1.0, 0.0])
    }

    #[rstest]
    fn test_hide(gappy: ChromosomeSpec) {
        assert_eq!(
            render(&gappy, ReportOptions::default()),
            "chr1\t1\t3\t2\nchr1\t5\t6\t3\nchr1\t6\t7\t1\n"
        );
    }

    #[rstest]
    fn test_show(gappy: ChromosomeSpec) {
        let options = ReportOptions {
            uncovered: Uncovered::Show,
            ..Default::default()
        };
        assert_eq!(
            render(&gappy, options),
            "chr1\t0\t1\t0\nchr1\t1\t3\t2\nchr1\t3\t5\t0\nchr1\t5\t6\t3\nchr1\t6\t7\t1\nchr1\t7\t8\t0\n"
        );
    }

    #[rstest]
    fn test_na(gappy: ChromosomeSpec) {
        let options = ReportOptions {
            uncovered: Uncovered::Na,
            ..Default::default()
        };
        assert_eq!(
            render(&gappy, options),
            "chr1\t0\t1\tNA\nchr1\t1\t3\t2\nchr1\t3\t5\tNA\nchr1\t5\t6\t3\nchr1\t6\t7\t1\nchr1\t7\t8\tNA\n"
        );
    }

    #[rstest]
    fn test_origin_one_precision_and_no_collapse(gappy: ChromosomeSpec) {
        let options = ReportOptions {
            origin_one: true,
            precision: 2,
            collapse: false,
            ..Default::default()
        };
        assert_eq!(
            render(&gappy, options),
            "chr1\t2\t2\t2.00\nchr1\t3\t3\t2.00\nchr1\t6\t6\t3.00\nchr1\t7\t7\t1.00\n"
        );
    }

    #[rstest]
    fn test_no_values(gappy: ChromosomeSpec) {
        let options = ReportOptions {
            no_values: true,
            ..Default::default()
        };
        assert_eq!(render(&gappy, options), "chr1\t1\t3\nchr1\t5\t6\nchr1\t6\t7\n");
    }

    #[rstest]
    fn test_offset_chromosome_na() {
        let mut spec = ChromosomeSpec::new("chr2", 100, 4);
        spec.values = vec![0.0, 5.0, 5.0, 0.0];
        let options = ReportOptions {
            uncovered: Uncovered::Na,
            ..Default::default()
        };
        assert_eq!(
            render(&spec, options),
            "chr2\t100\t101\tNA\nchr2\t101\t103\t5\nchr2\t103\t104\tNA\n"
        );
    }

    #[rstest]
    fn test_write_then_read_back() {
        let mut registry = ChromosomeRegistry::new();
        registry.add("chr1", 0, 8);
        registry.allocate();
        let original = vec![0.0, 2.5, 2.5, 0.0, -1.0, 3.0, 3.0, 0.0];
        registry.get_mut("chr1").unwrap().values = original.clone();

        let options = ReportOptions {
            precision: 1,
            ..Default::default()
        };
        let mut text = Vec::new();
        report_intervals(&registry, &mut text, &options).unwrap();

        registry.get_mut("chr1").unwrap().values.fill(7.0);
        let read = ReadOptions {
            clear: true,
            missing: 0.0,
            ..Default::default()
        };
        let mut reader = IntervalReader::new(Cursor::new(text), Some(3));
        apply_intervals(&mut registry, &mut reader, &read).unwrap();
        assert_eq!(registry.get("chr1").unwrap().values, original);
    }

    #[rstest]
    #[case("hide", Uncovered::Hide)]
    #[case("show", Uncovered::Show)]
    #[case("NA", Uncovered::Na)]
    fn test_uncovered_round_trips_through_code(#[case] text: &str, #[case] mode: Uncovered) {
        let parsed: Uncovered = text.parse().unwrap();
        assert_eq!(parsed, mode);
        assert_eq!(Uncovered::from_code(parsed.code()), mode);
    }
}
