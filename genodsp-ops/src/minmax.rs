//! Minima and maxima: per interval, per neighborhood, per window, and
//! against an interval file.
use std::collections::VecDeque;

use log::debug;

use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{arg_value, cant_understand, default_window_size, raise_to, window_size};
use crate::source::IntervalSource;
use crate::walk::{WalkVisitor, walk_sorted};

/// Which extreme an operator is after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

impl Extreme {
    /// `a` is strictly more extreme than `b`.
    fn beats(self, a: f64, b: f64) -> bool {
        match self {
            Extreme::Min => a < b,
            Extreme::Max => a > b,
        }
    }
}

///
/// For each position, the extreme value over the window reaching `w_lft`
/// to the left and `w_rgt` to the right, truncated at the ends.
///
/// Uses a monotonic queue of candidate positions, so it runs in linear time
/// whatever the window size.
///
pub fn window_extremes(v: &[f64], out: &mut [f64], w_lft: usize, w_rgt: usize, which: Extreme) {
    let len = v.len();
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut next = 0;

    for ix in 0..len {
        let right = (ix + w_rgt).min(len.saturating_sub(1));
        while next <= right {
            while queue.back().is_some_and(|&back| !which.beats(v[back], v[next])) {
                queue.pop_back();
            }
            queue.push_back(next);
            next += 1;
        }
        let left = ix.saturating_sub(w_lft);
        while queue.front().is_some_and(|&front| front < left) {
            queue.pop_front();
        }
        if let Some(&front) = queue.front() {
            out[ix] = v[front];
        }
    }
}

struct IntervalExtreme {
    which: Extreme,
    fill: f64,
    debug: bool,
}

impl WalkVisitor for IntervalExtreme {
    fn gap(&mut self, values: &mut [f64]) {
        values.fill(self.fill);
    }

    fn interval(&mut self, values: &mut [f64], _value: f64) {
        let len = values.len();
        let mut best = 0;
        let mut best_inset = 0;
        for ix in 1..len {
            let inset = ix.min(len - ix);
            if self.which.beats(values[ix], values[best]) {
                best = ix;
                best_inset = inset;
            } else if values[ix] == values[best] && inset > best_inset {
                // ties go to the one nearest the center
                best = ix;
                best_inset = inset;
            }
        }
        if self.debug {
            debug!("extreme over interval of {} is {:.6} at +{}", len, values[best], best);
        }
        for (ix, x) in values.iter_mut().enumerate() {
            if ix != best {
                *x = self.fill;
            }
        }
    }
}

///
/// Keep only the extreme value within each of a file's intervals.
///
/// Everything else, including bases outside the intervals, gets the fill
/// value (`--infinity=` for the minimum, `--zero=` for the maximum).
///
#[derive(Debug)]
pub struct OverInterval {
    name: &'static str,
    source: IntervalSource,
    which: Extreme,
    fill: f64,
    debug: bool,
}

impl OverInterval {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables, which: Extreme) -> Result<Self> {
        let mut source = IntervalSource::without_values(vars);
        let mut fill = match which {
            Extreme::Min => f64::MAX,
            Extreme::Max => 0.0,
        };
        let mut debug = false;
        let fill_args: &[&str] = match which {
            Extreme::Min => &["--infinity="],
            Extreme::Max => &["--zero=", "Z=", "--Z="],
        };

        for arg in args {
            if let Some(text) = arg_value(arg, fill_args) {
                fill = parse_value(text)?;
            } else if arg == "--debug" {
                debug = true;
            } else if !source.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        source.require(name)?;

        Ok(OverInterval {
            name,
            source,
            which,
            fill,
            debug,
        })
    }
}

impl Operator for OverInterval {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let mut visitor = IntervalExtreme {
            which: self.which,
            fill: self.fill,
            debug: self.debug,
        };
        walk_sorted(self.name, &self.source, registry, ctx, self.debug, &mut visitor)?;
        self.source.finish()
    }
}

pub fn parse_minover(name: &'static str, args: &[String], vars: &Variables) -> Result<OverInterval> {
    OverInterval::parse(name, args, vars, Extreme::Min)
}

pub fn parse_maxover(name: &'static str, args: &[String], vars: &Variables) -> Result<OverInterval> {
    OverInterval::parse(name, args, vars, Extreme::Max)
}

///
/// Keep values that are the extreme of the neighborhood centered on them;
/// replace the rest with the fill value.
///
#[derive(Debug)]
pub struct LocalExtreme {
    name: &'static str,
    neighborhood: usize,
    which: Extreme,
    fill: f64,
}

impl LocalExtreme {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables, which: Extreme) -> Result<Self> {
        let mut neighborhood = 3;
        let mut fill = match which {
            Extreme::Min => f64::MAX,
            Extreme::Max => 0.0,
        };
        let fill_args: &[&str] = match which {
            Extreme::Min => &["--infinity="],
            Extreme::Max => &["--zero=", "Z=", "--Z="],
        };

        for arg in args {
            if let Some(text) = arg_value(arg, &["--neighborhood=", "N=", "--N="]) {
                neighborhood = window_size(name, "neighborhood", arg, text, 3)?;
                if neighborhood % 2 == 0 {
                    neighborhood = raise_to(name, "neighborhood", neighborhood, neighborhood + 1);
                }
            } else if let Some(text) = arg_value(arg, fill_args) {
                fill = parse_value(text)?;
            } else {
                return Err(cant_understand(name, arg));
            }
        }

        Ok(LocalExtreme {
            name,
            neighborhood,
            which,
            fill,
        })
    }
}

impl Operator for LocalExtreme {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let h_off = (self.neighborhood - 1) / 2;
        let mut s = ctx.scratch.floats();
        let len = v.len();
        window_extremes(v, &mut s[..len], h_off, h_off, self.which);

        for (x, &extreme) in v.iter_mut().zip(s.iter()) {
            if self.which.beats(extreme, *x) {
                *x = self.fill;
            }
        }
        Ok(())
    }
}

pub fn parse_localmin(name: &'static str, args: &[String], vars: &Variables) -> Result<LocalExtreme> {
    LocalExtreme::parse(name, args, vars, Extreme::Min)
}

pub fn parse_localmax(name: &'static str, args: &[String], vars: &Variables) -> Result<LocalExtreme> {
    LocalExtreme::parse(name, args, vars, Extreme::Max)
}

/// Replace each value with the extreme over the window centered on it.
#[derive(Debug)]
pub struct BestInWindow {
    name: &'static str,
    window: usize,
    which: Extreme,
    debug: bool,
}

impl BestInWindow {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables, which: Extreme) -> Result<Self> {
        let mut window = default_window_size(vars, 100.0).max(0.0) as usize;
        let mut debug = false;

        for arg in args {
            if let Some(text) = arg_value(arg, &["--window=", "W=", "--W="]) {
                window = window_size(name, "window size", arg, text, 3)?;
            } else if arg == "--debug" {
                debug = true;
            } else {
                return Err(cant_understand(name, arg));
            }
        }

        Ok(BestInWindow {
            name,
            window: raise_to(name, "window size", window, 3),
            which,
            debug,
        })
    }
}

impl Operator for BestInWindow {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (chrom, v) = target.into_chromosome(self.name)?;
        let w_lft = (self.window - 1) / 2;
        let w_rgt = (self.window - 1) - w_lft;
        let len = v.len();

        let mut s = ctx.scratch.floats();
        window_extremes(v, &mut s[..len], w_lft, w_rgt, self.which);
        if self.debug {
            debug!("[{}] {} window {}-{}+{}", self.name, chrom, w_lft, 1, w_rgt);
        }
        v.copy_from_slice(&s[..len]);
        Ok(())
    }
}

pub fn parse_bestmin(name: &'static str, args: &[String], vars: &Variables) -> Result<BestInWindow> {
    BestInWindow::parse(name, args, vars, Extreme::Min)
}

pub fn parse_bestmax(name: &'static str, args: &[String], vars: &Variables) -> Result<BestInWindow> {
    BestInWindow::parse(name, args, vars, Extreme::Max)
}

/// Take the min (or max) of each value and the file's interval values.
#[derive(Debug)]
pub struct ExtremeWith {
    name: &'static str,
    source: IntervalSource,
    which: Extreme,
}

impl ExtremeWith {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables, which: Extreme) -> Result<Self> {
        let mut source = IntervalSource::with_values(vars);
        for arg in args {
            if !source.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        source.require(name)?;
        Ok(ExtremeWith {
            name,
            source,
            which,
        })
    }
}

impl Operator for ExtremeWith {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let which = self.which;
        self.source
            .for_each(self.name, registry, ctx.input, ctx.track, false, |values, value| {
                for x in values.iter_mut() {
                    if which.beats(value, *x) {
                        *x = value;
                    }
                }
            })?;
        self.source.finish()
    }
}

pub fn parse_minwith(name: &'static str, args: &[String], vars: &Variables) -> Result<ExtremeWith> {
    ExtremeWith::parse(name, args, vars, Extreme::Min)
}

pub fn parse_maxwith(name: &'static str, args: &[String], vars: &Variables) -> Result<ExtremeWith> {
    ExtremeWith::parse(name, args, vars, Extreme::Max)
}
