//! Windowed, sliding and cumulative sums, and Hann-window smoothing.
use std::f64::consts::PI;

use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{arg_value, cant_understand, default_window_size, op_error, raise_to, window_size};

const WINDOW_ARGS: &[&str] = &["--window=", "W=", "--W="];
const DENOM_ARGS: &[&str] = &["--denom=", "--denominator=", "D=", "--D="];
const ZERO_ARGS: &[&str] = &["--zero=", "Z=", "--Z="];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Denominator {
    Value(f64),
    /// the window size
    Window,
    /// the number of bases actually in the window (the last one may be short)
    Actual,
}

fn parse_denominator(op: &str, arg: &str, text: &str, allow_actual: bool) -> Result<Denominator> {
    match text {
        "actual" if allow_actual => Ok(Denominator::Actual),
        "window" | "W" => Ok(Denominator::Window),
        _ => {
            let v = parse_value(text)?;
            if v == 0.0 {
                return Err(op_error(op, format!("denominator can't be zero (\"{}\")", arg)));
            }
            Ok(Denominator::Value(v))
        }
    }
}

/// Sum over non-overlapping windows, stored at each window's first base.
#[derive(Debug)]
pub struct WindowSum {
    name: &'static str,
    /// `None` when the whole chromosome is one window
    window: Option<usize>,
    denominator: Denominator,
    zero: f64,
}

impl WindowSum {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut window = Some(default_window_size(vars, 100.0).max(0.0) as usize);
        let mut denominator = Denominator::Value(1.0);
        let mut zero = 0.0;

        for arg in args {
            if arg == "--window=chromosome" {
                window = None;
            } else if let Some(text) = arg_value(arg, WINDOW_ARGS) {
                window = Some(window_size(name, "window size", arg, text, 3)?);
            } else if let Some(text) = arg_value(arg, DENOM_ARGS) {
                denominator = parse_denominator(name, arg, text, true)?;
            } else if let Some(text) = arg_value(arg, ZERO_ARGS) {
                zero = parse_value(text)?;
            } else {
                return Err(cant_understand(name, arg));
            }
        }

        let window = window.map(|w| raise_to(name, "window size", w, 3));
        Ok(WindowSum {
            name,
            window,
            denominator,
            zero,
        })
    }
}

impl Operator for WindowSum {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let window = self.window.unwrap_or(v.len()).max(1);

        for chunk in v.chunks_mut(window) {
            let sum: f64 = chunk.iter().sum();
            let denom = match self.denominator {
                Denominator::Value(d) => d,
                Denominator::Window => window as f64,
                Denominator::Actual => chunk.len() as f64,
            };
            chunk[0] = sum / denom;
            chunk[1..].fill(self.zero);
        }
        Ok(())
    }
}

/// Sum over a window centered at each base; values off the ends count as 0.
#[derive(Debug)]
pub struct SlidingSum {
    name: &'static str,
    window: usize,
    denominator: Denominator,
}

impl SlidingSum {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut window = default_window_size(vars, 100.0).max(0.0) as usize;
        let mut denominator = Denominator::Value(1.0);

        for arg in args {
            if let Some(text) = arg_value(arg, WINDOW_ARGS) {
                window = window_size(name, "window size", arg, text, 3)?;
            } else if let Some(text) = arg_value(arg, DENOM_ARGS) {
                denominator = parse_denominator(name, arg, text, false)?;
            } else {
                return Err(cant_understand(name, arg));
            }
        }

        Ok(SlidingSum {
            name,
            window: raise_to(name, "window size", window, 3),
            denominator,
        })
    }
}

impl Operator for SlidingSum {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let len = v.len();
        let w = self.window;
        let h_off = (w - 1) / 2;
        let denom = match self.denominator {
            Denominator::Value(d) => d,
            _ => w as f64,
        };

        let mut s = ctx.scratch.floats();
        let mut sum = 0.0;
        for ix in 0..len + h_off {
            if ix < len {
                sum += v[ix];
            }
            if ix >= w {
                sum -= v[ix - w];
            }
            if ix >= h_off {
                s[ix - h_off] = sum;
            }
        }

        for (x, &total) in v.iter_mut().zip(s.iter()) {
            *x = total / denom;
        }
        Ok(())
    }
}

pub const MAX_SMOOTH_WINDOW: usize = 50 * 1000 + 1;

/// Convolution with a normalized Hann window.
#[derive(Debug)]
pub struct Smooth {
    name: &'static str,
    weights: Vec<f64>,
}

///
/// Hann window weights, normalized to sum to one.
///
pub fn hann_weights(window: usize) -> Vec<f64> {
    let mut w: Vec<f64> = (0..window)
        .map(|ix| {
            let x = (ix + 1) as f64 / (window + 1) as f64;
            (1.0 - (2.0 * PI * x).cos()) / 2.0
        })
        .collect();
    let sum: f64 = w.iter().sum();
    for weight in w.iter_mut() {
        *weight /= sum;
    }
    w
}

impl Smooth {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut window = default_window_size(vars, 101.0).max(0.0) as usize;

        for arg in args {
            if let Some(text) = arg_value(arg, WINDOW_ARGS) {
                window = window_size(name, "window size", arg, text, 3)?;
                if window > MAX_SMOOTH_WINDOW {
                    return Err(op_error(
                        name,
                        format!("window size exceeds {} (\"{}\")", MAX_SMOOTH_WINDOW, arg),
                    ));
                }
            } else {
                return Err(cant_understand(name, arg));
            }
        }

        let mut window = raise_to(name, "window size", window, 3);
        if window % 2 == 0 {
            window = raise_to(name, "window size", window, window + 1);
        }
        if window > MAX_SMOOTH_WINDOW {
            return Err(op_error(name, format!("window size exceeds {}", MAX_SMOOTH_WINDOW)));
        }

        Ok(Smooth {
            name,
            weights: hann_weights(window),
        })
    }
}

impl Operator for Smooth {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let len = v.len() as i64;
        let w = self.weights.len() as i64;
        let h_off = (w - 1) / 2;

        let mut s = ctx.scratch.floats();
        for ix in 0..len {
            // window positions that land inside the array
            let w_start = (h_off - ix).max(0);
            let w_end = (len - 1 + h_off - ix).min(w - 1);
            let mut sum = 0.0;
            for w_ix in w_start..=w_end {
                sum += self.weights[w_ix as usize] * v[(ix - h_off + w_ix) as usize];
            }
            s[ix as usize] = sum;
        }

        let len = v.len();
        v.copy_from_slice(&s[..len]);
        Ok(())
    }
}

/// Running sum along the chromosome.
#[derive(Debug)]
pub struct CumulativeSum {
    name: &'static str,
}

impl CumulativeSum {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        if let Some(arg) = args.first() {
            return Err(cant_understand(name, arg));
        }
        Ok(CumulativeSum { name })
    }
}

impl Operator for CumulativeSum {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let mut total = 0.0;
        for x in v.iter_mut() {
            total += *x;
            *x = total;
        }
        Ok(())
    }
}
