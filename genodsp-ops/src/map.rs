//! Piecewise-linear value mapping read from a file.
use std::fs;
use std::io::BufRead;
use std::path::Path;

use log::debug;

use genodsp_core::errors::{GenodspError, Result};
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::reader::{MAX_LINE_LENGTH, read_trimmed_line};
use genodsp_core::utils::{get_dynamic_reader, parse_value};
use genodsp_core::variables::Variables;

use crate::args::{cant_understand, op_error};

///
/// A piecewise-linear function, as (input, output) knots sorted by input.
///
/// Values at or below the first knot map to its output, likewise at or
/// above the last knot.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    knots: Vec<(f64, f64)>,
}

impl Mapping {
    ///
    /// Read knots, two values per line. Blank and `#` lines are skipped; the
    /// order of lines doesn't matter.
    ///
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut knots = Vec::new();
        let mut line = String::new();
        let mut line_number = 0;

        while read_trimmed_line(reader, &mut line)? {
            line_number += 1;
            if line.len() > MAX_LINE_LENGTH {
                return Err(GenodspError::input_format(
                    line_number,
                    "line is longer than internal buffer",
                ));
            }
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                return Err(GenodspError::input_format(
                    line_number,
                    "line contains no first value",
                ));
            }

            let mut fields = line.split_whitespace();
            let Some(v_in) = fields.next() else {
                return Err(GenodspError::input_format(
                    line_number,
                    "line contains no first value",
                ));
            };
            let Some(v_out) = fields.next() else {
                return Err(GenodspError::input_format(
                    line_number,
                    "line contains no second value",
                ));
            };
            knots.push((parse_value(v_in)?, parse_value(v_out)?));
        }

        if knots.is_empty() {
            return Err(GenodspError::domain("mapping contains no values"));
        }
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Mapping { knots })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut reader = get_dynamic_reader(path)?;
        Self::read(&mut reader)
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    fn input(&self, ix: usize) -> f64 {
        self.knots[ix].0
    }

    /// Output of the last knot sharing knot `ix`'s input.
    fn last_output_from(&self, mut ix: usize) -> f64 {
        while ix + 1 < self.knots.len() && self.knots[ix + 1].0 == self.knots[ix].0 {
            ix += 1;
        }
        self.knots[ix].1
    }

    /// Index of the piece holding `value`, searching knots `lo..=hi`.
    fn find_piece(&self, value: f64, mut lo: usize, mut hi: usize) -> usize {
        let max_ix = self.knots.len() - 1;
        // invariant: input(lo) <= value < input(hi)
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            let mid_in = self.input(mid);
            if value < mid_in {
                hi = mid;
            } else if value > mid_in {
                lo = mid;
            } else {
                lo = mid;
                break;
            }
        }
        while lo < max_ix && self.input(lo) == self.input(lo + 1) {
            lo += 1;
        }
        lo.min(max_ix.saturating_sub(1))
    }

    ///
    /// Map every value in place.
    ///
    /// Signals usually vary smoothly, so the piece used last (or one next to
    /// it) is tried before falling back to a binary search.
    ///
    pub fn apply_to(&self, values: &mut [f64], debug_map: bool) {
        let max_ix = self.knots.len() - 1;
        let min_in = self.knots[0].0;
        let out_for_min = self.last_output_from(0);
        let (max_in, out_for_max) = self.knots[max_ix];
        let mut piece: Option<usize> = None;

        for (ix, x) in values.iter_mut().enumerate() {
            let value = *x;
            if debug_map {
                debug!("[{}] {:.6}", ix, value);
            }
            if value <= min_in {
                *x = out_for_min;
                continue;
            }
            if value >= max_in {
                *x = out_for_max;
                continue;
            }

            let piece_ix = match piece {
                None => self.find_piece(value, 0, max_ix),
                Some(p) if value >= self.input(p) && value <= self.input(p + 1) => p,
                Some(p) if value < self.input(p) => {
                    if p == 0 || value < self.input(p - 1) {
                        self.find_piece(value, 0, p.saturating_sub(1))
                    } else {
                        p - 1
                    }
                }
                Some(p) => {
                    if p + 2 > max_ix || value > self.input(p + 2) {
                        self.find_piece(value, (p + 2).min(max_ix), max_ix)
                    } else {
                        p + 1
                    }
                }
            };
            piece = Some(piece_ix);

            let (lo, out_lo) = self.knots[piece_ix];
            let (hi, out_hi) = self.knots[piece_ix + 1];
            *x = if value == lo {
                self.last_output_from(piece_ix)
            } else if value == hi {
                self.last_output_from(piece_ix + 1)
            } else {
                out_lo + (value - lo) * (out_hi - out_lo) / (hi - lo)
            };
            if debug_map {
                debug!("  piece {} --> {:.6}", piece_ix, *x);
            }
        }
    }
}

#[derive(Debug)]
pub struct MapOp {
    name: &'static str,
    filename: String,
    destroy: bool,
    debug: bool,
    mapping: Option<Mapping>,
}

impl MapOp {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut filename = None;
        let mut destroy = false;
        let mut debug = false;

        for arg in args {
            if arg == "--destroy" {
                destroy = true;
            } else if arg == "--debug" {
                debug = true;
            } else if arg.starts_with("--") || filename.is_some() {
                return Err(cant_understand(name, arg));
            } else {
                filename = Some(arg.clone());
            }
        }

        let Some(filename) = filename else {
            return Err(op_error(name, "no filename was provided"));
        };
        Ok(MapOp {
            name,
            filename,
            destroy,
            debug,
            mapping: None,
        })
    }

    /// Read the mapping on first use; later chromosomes reuse it.
    fn mapping(&mut self) -> Result<&Mapping> {
        if self.mapping.is_none() {
            let path = Path::new(&self.filename);
            let mapping = Mapping::from_file(path).map_err(|e| match e {
                GenodspError::FileOpen { .. } | GenodspError::Io(_) => e,
                other => op_error(
                    self.name,
                    format!("problem with mapping file \"{}\": {}", self.filename, other),
                ),
            })?;
            if self.destroy {
                fs::remove_file(path)?;
            }
            if self.debug {
                debug!("mapping:");
                for (ix, (v_in, v_out)) in mapping.knots.iter().enumerate() {
                    debug!("  [{}] {:.6} -> {:.6}", ix, v_in, v_out);
                }
            }
            self.mapping = Some(mapping);
        }
        self.mapping
            .as_ref()
            .ok_or_else(|| op_error(self.name, "mapping was not loaded"))
    }
}

impl Operator for MapOp {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let debug_map = self.debug;
        self.mapping()?.apply_to(v, debug_map);
        Ok(())
    }
}
