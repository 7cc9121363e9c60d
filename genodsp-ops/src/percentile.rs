//! Percentiles of the signal over the whole genome.
use std::io::{self, Write};

use log::{debug, warn};

use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::registry::ChromosomeRegistry;
use genodsp_core::utils::{get_dynamic_writer, parse_int, parse_unitized_int, parse_value};
use genodsp_core::variables::Variables;

use crate::args::{arg_is, arg_value, cant_understand, default_window_size, op_error};

/// Percentiles are held in thousandths of a percent.
pub const STEP_UNITS: u32 = 1000;

fn to_units(p: f64) -> u32 {
    if p < 0.0 {
        0
    } else if p > 100.0 {
        100 * STEP_UNITS
    } else {
        (STEP_UNITS as f64 * p + 0.5) as u32
    }
}

///
/// Name of the variable holding a percentile, with only as many decimals as
/// it needs (`percentile95`, `percentile99.9`, `percentile99.95`).
///
pub fn percentile_name(units: u32) -> String {
    if units % STEP_UNITS == 0 {
        return format!("percentile{}", units / STEP_UNITS);
    }
    let pct = units as f64 / STEP_UNITS as f64;
    let precision = if units % 100 == 0 {
        1
    } else if units % 10 == 0 {
        2
    } else {
        3
    };
    format!("percentile{:.*}", precision, pct)
}

#[derive(Debug)]
pub struct Percentile {
    name: &'static str,
    lo: u32,
    hi: u32,
    step: u32,
    /// sample every Nth base of each chromosome
    stride: usize,
    min_allowed: f64,
    max_allowed: f64,
    precision: usize,
    map_filename: Option<String>,
    report_for_bash: bool,
    quiet: bool,
    debug: bool,
    show_index: bool,
}

impl Percentile {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let stride = default_window_size(vars, 1.0);
        let mut op = Percentile {
            name,
            lo: 0,
            hi: 0,
            step: STEP_UNITS,
            stride: if stride < 1.0 { 1 } else { stride as usize },
            min_allowed: -f64::MAX,
            max_allowed: f64::MAX,
            precision: vars.get_or("valPrecision", 0.0).max(0.0) as usize,
            map_filename: None,
            report_for_bash: false,
            quiet: false,
            debug: false,
            show_index: false,
        };
        let mut have_range = false;

        for arg in args {
            if let Some(text) = arg_value(arg, &["--step="]) {
                op.step = op.parse_step(arg, text)?;
            } else if let Some(text) = arg_value(arg, &["--window=", "W=", "--W="]) {
                let size = parse_unitized_int(text)?;
                if size < 0 {
                    return Err(op_error(name, format!("window size can't be negative (\"{}\")", arg)));
                }
                op.stride = (size as usize).max(1);
            } else if let Some(text) = arg_value(arg, &["--min="]) {
                op.min_allowed = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--max="]) {
                op.max_allowed = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--precision="]) {
                let precision = parse_int(text)?;
                if precision < 0 {
                    return Err(op_error(name, format!("precision can't be negative (\"{}\")", arg)));
                }
                op.precision = precision as usize;
            } else if arg_value(arg, &["--preserve="]).is_some() {
                // values are collected without disturbing the arrays
            } else if let Some(text) = arg_value(arg, &["--map=", "--mapping="]) {
                if let Some(existing) = &op.map_filename {
                    if existing != text {
                        return Err(op_error(
                            name,
                            format!(
                                "can't specify two files for mapping\n(\"{}\" and \"{}\")",
                                existing, text
                            ),
                        ));
                    }
                }
                op.map_filename = Some(text.to_string());
            } else if arg_is(arg, &["--report:bash", "--bash"]) {
                op.report_for_bash = true;
            } else if arg_is(arg, &["--quiet", "--silent"]) {
                op.quiet = true;
            } else if arg == "--debug" {
                op.debug = true;
            } else if arg == "--debug=index" {
                op.show_index = true;
            } else if arg.starts_with("--") || have_range {
                return Err(cant_understand(name, arg));
            } else if let Some((lo, hi)) = arg.split_once(',') {
                op.set_range(parse_value(lo)?, parse_value(hi)?);
                op.step = if op.lo < op.hi { op.hi - op.lo } else { 1 };
                have_range = true;
            } else {
                let (lo, rest) = match arg.split_once("..") {
                    Some((lo, rest)) => (lo, Some(rest)),
                    None => (arg.as_str(), None),
                };
                let (hi, by) = match rest.map(|r| r.split_once("by").unwrap_or((r, ""))) {
                    Some((hi, by)) => (hi, (!by.is_empty()).then_some(by)),
                    None => (lo, None),
                };
                op.set_range(parse_value(lo)?, parse_value(hi)?);
                if let Some(by) = by {
                    op.step = op.parse_step(arg, by)?;
                }
                have_range = true;
            }
        }

        if !have_range {
            return Err(op_error(name, "no range of percentiles was provided"));
        }
        if op.report_for_bash && op.quiet {
            return Err(op_error(name, "Can't use both --report:bash and --quiet"));
        }
        Ok(op)
    }

    fn parse_step(&self, arg: &str, text: &str) -> Result<u32> {
        let step = parse_value(text)?;
        if step == 0.0 {
            return Err(op_error(self.name, format!("step can't be zero (\"{}\")", arg)));
        }
        if step < 0.0 {
            return Err(op_error(self.name, format!("step can't be negative (\"{}\")", arg)));
        }
        Ok((STEP_UNITS as f64 * step.max(0.001) + 0.5) as u32)
    }

    fn set_range(&mut self, lo: f64, hi: f64) {
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        self.lo = to_units(lo);
        self.hi = to_units(hi);
    }

    /// The qualifying sampled values, sorted.
    fn collect(&self, registry: &ChromosomeRegistry) -> Vec<f64> {
        let mut values: Vec<f64> = registry
            .iter()
            .flat_map(|spec| spec.values.iter().step_by(self.stride))
            .copied()
            .filter(|&v| v >= self.min_allowed && v <= self.max_allowed)
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    ///
    /// Each requested percentile (in thousandths), with the index of its
    /// value and the value itself. Empty when no values qualify.
    ///
    pub fn compute(&self, registry: &ChromosomeRegistry) -> Vec<(u32, usize, f64)> {
        let values = self.collect(registry);
        let n = values.len();
        if n == 0 {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut next = self.lo;
        while next <= self.hi {
            let ix = ((n as u64 * next as u64) / (100 * STEP_UNITS) as u64) as usize;
            let ix = ix.min(n - 1);
            found.push((next, ix, values[ix]));
            next += self.step.max(1);
        }
        found
    }
}

impl Operator for Percentile {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        if self.debug {
            debug!(
                "[{}] percentile({:.3},{:.3},{:.3},{},{})",
                self.name,
                self.lo as f64 / STEP_UNITS as f64,
                self.hi as f64 / STEP_UNITS as f64,
                self.step as f64 / STEP_UNITS as f64,
                self.min_allowed,
                self.max_allowed
            );
        }

        let mut map_writer = match &self.map_filename {
            Some(filename) => Some(get_dynamic_writer(filename)?),
            None => None,
        };

        let found = self.compute(registry);
        if found.is_empty() {
            warn!(
                "[{}] percentile can't be computed;  no input values meet the criteria",
                self.name
            );
        }

        let prec = self.precision;
        let mut stdout = io::stdout().lock();
        let mut stderr = io::stderr().lock();
        for (units, ix, value) in found {
            let var_name = percentile_name(units);
            let pct = units as f64 / STEP_UNITS as f64;
            ctx.vars.set(&var_name, value);

            if self.report_for_bash {
                writeln!(stdout, "{}={:.*} # bash command", var_name, prec, value)?;
            } else if !self.quiet {
                if self.show_index {
                    writeln!(stderr, "percentile {:.3} is [{}] {:.*}", pct, ix, prec, value)?;
                } else {
                    writeln!(stderr, "percentile {:.3} is {:.*}", pct, prec, value)?;
                }
            }
            if let Some(writer) = map_writer.as_mut() {
                writeln!(writer, "{:.*} {:.3}", prec, value, pct)?;
            }
        }

        if let Some(mut writer) = map_writer {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    use crate::map::Mapping;
    use crate::testing::{args, registry_of, run_genome};

    #[rstest]
    #[case(50_000, "percentile50")]
    #[case(99_900, "percentile99.9")]
    #[case(99_950, "percentile99.95")]
    #[case(12_345, "percentile12.345")]
    fn test_percentile_name(#[case] units: u32, #[case] expected: &str) {
        assert_eq!(percentile_name(units), expected);
    }

    #[rstest]
    #[case("50", 50_000, 50_000, 1_000)]
    #[case("90,10", 10_000, 90_000, 80_000)]
    #[case("10..20by2.5", 10_000, 20_000, 2_500)]
    #[case("-5..150", 0, 100_000, 1_000)]
    fn test_ranges(#[case] arg: &str, #[case] lo: u32, #[case] hi: u32, #[case] step: u32) {
        let op = Percentile::parse("percentile", &args(&[arg]), &Variables::new()).unwrap();
        assert_eq!((op.lo, op.hi, op.step), (lo, hi, step));
    }

    #[rstest]
    fn test_requires_range() {
        let err = Percentile::parse("percentile", &args(&["--quiet"]), &Variables::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "[percentile] no range of percentiles was provided");

        let err = Percentile::parse("percentile", &args(&["50", "--bash", "--quiet"]), &Variables::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "[percentile] Can't use both --report:bash and --quiet");
    }

    #[rstest]
    fn test_percentiles_set_variables() {
        let mut registry = registry_of(&[
            ("chr1", vec![5.0, 1.0, 9.0, 3.0, 7.0]),
            ("chr2", vec![2.0, 10.0, 4.0, 8.0, 6.0]),
        ]);
        let mut vars = Variables::new();
        let mut op =
            Percentile::parse("percentile", &args(&["0..100by50", "--quiet"]), &vars).unwrap();
        run_genome(&mut op, &mut registry, &mut vars).unwrap();

        assert_eq!(vars.get("percentile0"), Some(1.0));
        assert_eq!(vars.get("percentile50"), Some(6.0));
        assert_eq!(vars.get("percentile100"), Some(10.0));
        // the data is left alone
        assert_eq!(registry.get("chr1").unwrap().values[0], 5.0);
    }

    #[rstest]
    fn test_percentiles_filter_and_stride() {
        let registry = registry_of(&[("chr1", vec![1.0, 100.0, 2.0, 100.0, 3.0, 100.0, 4.0])]);
        let op = Percentile::parse("percentile", &args(&["25", "W=2", "--max=50"]), &Variables::new())
            .unwrap();
        assert_eq!(op.compute(&registry), vec![(25_000, 1, 2.0)]);
    }

    #[rstest]
    fn test_no_qualifying_values() {
        let mut registry = registry_of(&[("chr1", vec![1.0, 2.0])]);
        let mut vars = Variables::new();
        let mut op =
            Percentile::parse("percentile", &args(&["50", "--min=5", "--quiet"]), &vars).unwrap();
        run_genome(&mut op, &mut registry, &mut vars).unwrap();
        assert!(vars.is_empty());
    }

    #[rstest]
    fn test_percentile_map_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pct.map");
        let map_arg = format!("--map={}", path.display());

        let mut registry = registry_of(&[("chr1", vec![4.0, 3.0, 2.0, 1.0])]);
        let mut vars = Variables::new();
        let mut op = Percentile::parse(
            "percentile",
            &args(&["0,100", "--quiet", &map_arg, "--precision=1"]),
            &vars,
        )
        .unwrap();
        run_genome(&mut op, &mut registry, &mut vars).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1.0 0.000\n4.0 100.000\n");
        assert!(Mapping::from_file(&path).is_ok());
    }
}
