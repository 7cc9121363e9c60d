//! Thresholding and boolean combination with interval files.
use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::registry::ChromosomeRegistry;
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{ValueRef, arg_is, arg_value, cant_understand, op_error};
use crate::source::IntervalSource;
use crate::walk::{WalkVisitor, walk_sorted};

/// Replace values above a threshold with one and the rest with zero.
#[derive(Debug)]
pub struct Binarize {
    name: &'static str,
    threshold: ValueRef,
    ties_above: bool,
    one: f64,
    zero: f64,
}

impl Binarize {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut threshold: Option<ValueRef> = None;
        let mut ties_above = false;
        let mut one = 1.0;
        let mut zero = 0.0;

        let mut set_threshold = |value: ValueRef, arg: &str| {
            if threshold.is_some() {
                return Err(op_error(
                    name,
                    format!("threshold specified more than once (at \"{}\")", arg),
                ));
            }
            threshold = Some(value);
            Ok(())
        };

        for arg in args {
            if let Some(text) = arg_value(arg, &["--threshold=", "T=", "--T="]) {
                set_threshold(ValueRef::parse(text), arg)?;
            } else if arg_is(arg, &["--ties:below", "--ties=below"]) {
                ties_above = false;
            } else if arg_is(arg, &["--ties:above", "--ties=above"]) {
                ties_above = true;
            } else if let Some(text) = arg_value(arg, &["--one=", "O=", "--O="]) {
                one = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--zero=", "Z=", "--Z="]) {
                zero = parse_value(text)?;
            } else if arg.starts_with("--") {
                return Err(cant_understand(name, arg));
            } else {
                set_threshold(ValueRef::Literal(parse_value(arg)?), arg)?;
            }
        }

        Ok(Binarize {
            name,
            threshold: threshold.unwrap_or(ValueRef::Literal(0.0)),
            ties_above,
            one,
            zero,
        })
    }
}

impl Operator for Binarize {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let threshold = self.threshold.resolve(self.name, "threshold", ctx.vars)?;
        for x in v.iter_mut() {
            let above = if self.ties_above {
                *x >= threshold
            } else {
                *x > threshold
            };
            *x = if above { self.one } else { self.zero };
        }
        Ok(())
    }
}

/// Convert every nonzero value to one.
fn to_truth(registry: &mut ChromosomeRegistry) {
    for spec in registry.iter_mut() {
        for x in spec.values.iter_mut() {
            if *x != 0.0 {
                *x = 1.0;
            }
        }
    }
}

fn parse_source(name: &'static str, args: &[String], vars: &Variables) -> Result<IntervalSource> {
    let mut source = IntervalSource::with_values(vars);
    for arg in args {
        if !source.accept(name, arg)? {
            return Err(cant_understand(name, arg));
        }
    }
    source.require(name)?;
    Ok(source)
}

/// Logical or of the signal with a file's (nonzero) intervals.
#[derive(Debug)]
pub struct Or {
    name: &'static str,
    source: IntervalSource,
}

impl Or {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        Ok(Or {
            name,
            source: parse_source(name, args, vars)?,
        })
    }
}

impl Operator for Or {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        to_truth(registry);
        self.source
            .for_each(self.name, registry, ctx.input, ctx.track, true, |values, _| {
                values.fill(1.0)
            })?;
        self.source.finish()
    }
}

struct Conjunction;

impl WalkVisitor for Conjunction {
    fn gap(&mut self, values: &mut [f64]) {
        values.fill(0.0);
    }

    // values are already zero or one
    fn interval(&mut self, _values: &mut [f64], _value: f64) {}
}

/// Logical and of the signal with a file's (nonzero) intervals.
#[derive(Debug)]
pub struct And {
    name: &'static str,
    source: IntervalSource,
}

impl And {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        Ok(And {
            name,
            source: parse_source(name, args, vars)?,
        })
    }
}

impl Operator for And {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        to_truth(registry);
        walk_sorted(self.name, &self.source, registry, ctx, false, &mut Conjunction)?;
        self.source.finish()
    }
}
