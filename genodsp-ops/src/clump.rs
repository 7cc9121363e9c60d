//! Clumps (and skimps): intervals whose average is at least (at most) a
//! threshold.
//!
//! An interval averages at least T exactly when the running sum of `v - T`
//! does not drop across it. We track the prefix minima of that sum as we go;
//! for each position the earliest minimum no larger than the current sum
//! gives the longest qualifying interval ending there.
use log::{debug, info};

use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::{parse_unitized_int, parse_value};
use genodsp_core::variables::Variables;

use crate::args::{ValueRef, arg_value, cant_understand, op_error};

#[derive(Debug)]
pub struct Clump {
    name: &'static str,
    /// clump (average above) rather than skimp (average below)
    above: bool,
    threshold: ValueRef,
    min_length: usize,
    one: f64,
    zero: f64,
    debug: bool,
    debug_detail: bool,
    progress: Option<usize>,
}

impl Clump {
    pub fn parse(name: &'static str, args: &[String], above: bool) -> Result<Self> {
        let mut threshold: Option<ValueRef> = None;
        let mut min_length = 100;
        let mut one = 1.0;
        let mut zero = 0.0;
        let mut debug = false;
        let mut debug_detail = false;
        let mut progress = None;

        let mut set_threshold = |value: ValueRef, arg: &str| {
            if threshold.is_some() {
                return Err(op_error(
                    name,
                    format!("average threshold specified more than once (at \"{}\")", arg),
                ));
            }
            threshold = Some(value);
            Ok(())
        };

        for arg in args {
            if let Some(text) = arg_value(arg, &["--average=", "T=", "--T="]) {
                set_threshold(ValueRef::parse(text), arg)?;
            } else if let Some(text) = arg_value(arg, &["--length=", "L=", "--L="]) {
                let length = parse_unitized_int(text)?;
                if length <= 0 {
                    return Err(op_error(name, format!("length must be positive (\"{}\")", arg)));
                }
                min_length = length as usize;
            } else if let Some(text) = arg_value(arg, &["--one=", "O=", "--O="]) {
                one = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--zero=", "Z=", "--Z="]) {
                zero = parse_value(text)?;
            } else if arg == "--debug" {
                debug = true;
            } else if arg == "--debug=detail" {
                debug = true;
                debug_detail = true;
            } else if let Some(text) = arg_value(arg, &["--progress="]) {
                let every = parse_unitized_int(text)?;
                progress = if every > 0 { Some(every as usize) } else { None };
            } else if arg.starts_with("--") {
                return Err(cant_understand(name, arg));
            } else {
                set_threshold(ValueRef::Literal(parse_value(arg)?), arg)?;
            }
        }

        Ok(Clump {
            name,
            above,
            threshold: threshold.unwrap_or(ValueRef::Literal(0.0)),
            min_length,
            one,
            zero,
            debug,
            debug_detail,
            progress,
        })
    }

    fn delta(&self, value: f64, target: f64) -> f64 {
        if self.above { value - target } else { target - value }
    }

    fn passes(&self, value: f64, target: f64) -> bool {
        if self.above { value >= target } else { value <= target }
    }
}

impl Operator for Clump {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (chrom, v) = target.into_chromosome(self.name)?;
        let target_avg = self.threshold.resolve(self.name, "threshold", ctx.vars)?;
        let len = v.len();

        // a sum that only ever decreases has no clumps at all
        if v.iter().all(|&x| self.delta(x, target_avg) < 0.0) {
            if self.debug {
                debug!(
                    "[{}] {} all {}",
                    self.name,
                    chrom,
                    if self.above { "decreasing" } else { "increasing" }
                );
            }
            v.fill(self.zero);
            return Ok(());
        }

        let mut min_sums = ctx.scratch.floats();
        let mut min_where = ctx.scratch.ints();
        let mut marks = ctx.scratch.ints();

        let min_length = self.min_length as i64;
        let mut val_sum = 0.0;
        let mut min_sum = 0.0;
        min_sums[0] = 0.0;
        min_where[0] = -1;
        let mut num_min_sums = 1;
        let mut min_scan = 0;
        // the last marked run, inclusive
        let mut prev: Option<(usize, usize)> = None;

        for ix in 0..len {
            if let Some(every) = self.progress {
                if ix % every == 0 {
                    info!(
                        "[{}] progress {} {}/{} ({:.1}%)",
                        self.name,
                        chrom,
                        ix,
                        len,
                        (100.0 * ix as f64) / len as f64
                    );
                }
            }

            // invariant: min_sums[min_scan] <= val_sum < min_sums[min_scan-1]
            let delta = self.delta(v[ix], target_avg);
            marks[ix] = 0;

            val_sum += delta;
            if val_sum < min_sum {
                min_sum = val_sum;
                min_sums[num_min_sums] = val_sum;
                min_where[num_min_sums] = ix as i64;
                num_min_sums += 1;
            }

            if delta < 0.0 {
                while min_sums[min_scan] > val_sum {
                    min_scan += 1;
                }
            } else if delta > 0.0 {
                while min_scan > 0 && min_sums[min_scan - 1] <= val_sum {
                    min_scan -= 1;
                }
            }

            if self.debug_detail {
                debug!(
                    "[{}] [{}] {:.6} {:.6} {}..",
                    self.name, ix, delta, val_sum, min_where[min_scan]
                );
            }

            let min_ix = min_where[min_scan];
            if (ix as i64) - min_ix < min_length {
                continue;
            }

            let start = (min_ix + 1) as usize;
            let end = ix;
            if self.debug {
                debug!("[{}] setting {}..{}", self.name, start, end + 1);
            }

            prev = Some(match prev {
                Some((prev_start, prev_end)) if start <= prev_end + 1 => {
                    marks[prev_end + 1..=end].fill(1);
                    if start < prev_start {
                        marks[start..prev_start].fill(1);
                        (start, end)
                    } else {
                        (prev_start, end)
                    }
                }
                _ => {
                    marks[start..=end].fill(1);
                    (start, end)
                }
            });
        }

        // copy the marks into the vector, trimming the failing ends off of
        // each run
        let mut scan_ix = 0;
        while scan_ix < len {
            if marks[scan_ix] == 0 {
                v[scan_ix] = self.zero;
                scan_ix += 1;
                continue;
            }

            let run_start = scan_ix;
            let mut run_end = scan_ix;
            while run_end < len && marks[run_end] != 0 {
                run_end += 1;
            }
            if self.debug {
                debug!(
                    "[{}] {} start {}",
                    self.name,
                    if self.above { "clump" } else { "skimp" },
                    run_start
                );
            }

            let first = (run_start..run_end).find(|&ix| self.passes(v[ix], target_avg));
            match first {
                None => v[run_start..run_end].fill(self.zero),
                Some(start) => {
                    let end = (start..run_end)
                        .rev()
                        .find(|&ix| self.passes(v[ix], target_avg))
                        .unwrap_or(start);
                    if self.debug {
                        debug!("[{}]   start trimmed to {}", self.name, start);
                        debug!("[{}]   end {}", self.name, run_end);
                        debug!("[{}]   end trimmed to {}", self.name, end + 1);
                    }
                    v[run_start..start].fill(self.zero);
                    v[start..=end].fill(self.one);
                    v[end + 1..run_end].fill(self.zero);
                }
            }
            scan_ix = run_end;
        }

        Ok(())
    }
}

/// Build from arguments already split for this operator.
pub fn parse_clump(name: &'static str, args: &[String], _vars: &Variables) -> Result<Clump> {
    Clump::parse(name, args, true)
}

pub fn parse_skimp(name: &'static str, args: &[String], _vars: &Variables) -> Result<Clump> {
    Clump::parse(name, args, false)
}
