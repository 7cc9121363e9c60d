//! Binary morphology: closing, opening, dilation and erosion.
//!
//! Each operator first thresholds the signal (a base is "in" when its value
//! is above the threshold), then grows or shrinks the runs of in-bases and
//! writes one/zero values back.
use log::debug;

use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::{parse_unitized_int, parse_value};
use genodsp_core::variables::Variables;

use crate::args::{ValueRef, arg_value, cant_understand, op_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Morph {
    /// fill interior gaps no longer than the length
    Close,
    /// clear runs no longer than the length
    Open,
    /// grow runs outward
    Dilate,
    /// shrink runs inward
    Erode,
}

impl Morph {
    fn length_name(self) -> &'static str {
        match self {
            Morph::Close => "closing",
            Morph::Open => "opening",
            Morph::Dilate => "dilation",
            Morph::Erode => "erosion",
        }
    }
}

/// Maximal runs of equal truth values, as `(start, end, inside)`.
fn runs(inside: &[i64]) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= inside.len() {
            return None;
        }
        let flag = inside[start];
        let end = inside[start..]
            .iter()
            .position(|&x| x != flag)
            .map_or(inside.len(), |offset| start + offset);
        let run = (start, end, flag != 0);
        start = end;
        Some(run)
    })
}

fn parse_length(name: &str, arg: &str, text: &str) -> Result<usize> {
    let length = parse_unitized_int(text)?;
    if length < 0 {
        return Err(op_error(name, format!("length can't be negative (\"{}\")", arg)));
    }
    Ok(length as usize)
}

#[derive(Debug)]
pub struct Morphology {
    name: &'static str,
    kind: Morph,
    length: usize,
    /// extent to the left and right, for dilation and erosion
    left: usize,
    right: usize,
    threshold: ValueRef,
    one: f64,
    zero: f64,
    debug: bool,
}

impl Morphology {
    pub fn parse(name: &'static str, args: &[String], kind: Morph) -> Result<Self> {
        let mut length = None;
        let mut left = 0;
        let mut right = 0;
        let mut threshold: Option<ValueRef> = None;
        let mut one = 1.0;
        let mut zero = 0.0;
        let mut debug = false;
        let sided = matches!(kind, Morph::Dilate | Morph::Erode);

        for arg in args {
            if let Some(text) = arg_value(arg, &["--threshold=", "T=", "--T="]) {
                if threshold.is_some() {
                    return Err(op_error(
                        name,
                        format!("threshold specified more than once (at \"{}\")", arg),
                    ));
                }
                threshold = Some(ValueRef::parse(text));
            } else if let Some(text) = arg_value(arg, &["--one=", "O=", "--O="]) {
                one = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--zero=", "Z=", "--Z="]) {
                zero = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--left="]).filter(|_| sided) {
                left = parse_length(name, arg, text)?;
            } else if let Some(text) = arg_value(arg, &["--right="]).filter(|_| sided) {
                right = parse_length(name, arg, text)?;
            } else if arg == "--debug" {
                debug = true;
            } else if arg.starts_with("--") || length.is_some() {
                return Err(cant_understand(name, arg));
            } else {
                length = Some(parse_length(name, arg, arg)?);
            }
        }

        let what = kind.length_name();
        let sides_given = left != 0 || right != 0;
        let length = match length {
            Some(_) if sides_given => {
                return Err(op_error(
                    name,
                    format!("{} length was provided in more than one way", what),
                ));
            }
            Some(length) => {
                left = length / 2;
                right = length - left;
                length
            }
            None if sided && sides_given => 0,
            None => return Err(op_error(name, format!("{} length was not provided", what))),
        };

        Ok(Morphology {
            name,
            kind,
            length,
            left,
            right,
            threshold: threshold.unwrap_or(ValueRef::Literal(0.0)),
            one,
            zero,
            debug,
        })
    }

    fn close(&self, v: &mut [f64], inside: &[i64]) {
        let len = v.len();
        for (start, end, is_in) in runs(inside) {
            // the end gaps stretch off the chromosome, so they're never short
            let fill = is_in || (start > 0 && end < len && end - start <= self.length);
            if self.debug && !is_in {
                debug!(
                    "{} {} bp gap from {}..{}",
                    if fill { "fill" } else { "clear" },
                    end - start,
                    start,
                    end
                );
            }
            v[start..end].fill(if fill { self.one } else { self.zero });
        }
    }

    fn open(&self, v: &mut [f64], inside: &[i64]) {
        for (start, end, is_in) in runs(inside) {
            let keep = is_in && end - start > self.length;
            v[start..end].fill(if keep { self.one } else { self.zero });
        }
    }

    fn dilate(&self, v: &mut [f64], inside: &[i64]) {
        let len = v.len();
        for (start, end, is_in) in runs(inside) {
            if is_in {
                v[start..end].fill(self.one);
                continue;
            }
            // the gap shrinks to lo..hi
            let (lo, hi) = match (start == 0, end == len) {
                (true, true) => (0, len),
                (true, false) => (0, end.saturating_sub(self.left)),
                (false, true) => ((start + self.right).min(len), len),
                (false, false) => {
                    let lo = start + self.right;
                    let hi = end.saturating_sub(self.left);
                    if lo >= hi { (start, start) } else { (lo, hi) }
                }
            };
            if self.debug {
                debug!("{} bp gap from {}..{}, narrowed to {}..{}", end - start, start, end, lo, hi);
            }
            v[start..lo].fill(self.one);
            v[lo..hi].fill(self.zero);
            v[hi..end].fill(self.one);
        }
    }

    fn erode(&self, v: &mut [f64], inside: &[i64]) {
        for (start, end, is_in) in runs(inside) {
            if !is_in {
                v[start..end].fill(self.zero);
                continue;
            }
            let lo = start + self.right;
            let hi = end.saturating_sub(self.left);
            if self.debug {
                debug!("{} bp interval from {}..{}, narrowed to {}..{}", end - start, start, end, lo, hi);
            }
            if lo >= hi {
                v[start..end].fill(self.zero);
            } else {
                v[start..lo].fill(self.zero);
                v[lo..hi].fill(self.one);
                v[hi..end].fill(self.zero);
            }
        }
    }
}

impl Operator for Morphology {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let threshold = self.threshold.resolve(self.name, "threshold", ctx.vars)?;
        let len = v.len();

        let mut inside = ctx.scratch.ints();
        for (flag, &x) in inside[..len].iter_mut().zip(v.iter()) {
            *flag = i64::from(x > threshold);
        }
        let inside = &inside[..len];

        match self.kind {
            Morph::Close => self.close(v, inside),
            Morph::Open => self.open(v, inside),
            Morph::Dilate => self.dilate(v, inside),
            Morph::Erode => self.erode(v, inside),
        }
        Ok(())
    }
}

pub fn parse_close(name: &'static str, args: &[String], _vars: &Variables) -> Result<Morphology> {
    Morphology::parse(name, args, Morph::Close)
}

pub fn parse_open(name: &'static str, args: &[String], _vars: &Variables) -> Result<Morphology> {
    Morphology::parse(name, args, Morph::Open)
}

pub fn parse_dilate(name: &'static str, args: &[String], _vars: &Variables) -> Result<Morphology> {
    Morphology::parse(name, args, Morph::Dilate)
}

pub fn parse_erode(name: &'static str, args: &[String], _vars: &Variables) -> Result<Morphology> {
    Morphology::parse(name, args, Morph::Erode)
}
