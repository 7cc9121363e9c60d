//! Arithmetic: adding interval files, constants, inversion and absolute value.
use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{cant_understand, op_error};
use crate::source::IntervalSource;

/// Add (or subtract) the values of a file's intervals.
#[derive(Debug)]
pub struct AddFile {
    name: &'static str,
    source: IntervalSource,
    subtract: bool,
}

impl AddFile {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables, subtract: bool) -> Result<Self> {
        let mut source = IntervalSource::with_values(vars);
        for arg in args {
            if !source.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        source.require(name)?;
        Ok(AddFile {
            name,
            source,
            subtract,
        })
    }
}

impl Operator for AddFile {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let subtract = self.subtract;
        self.source
            .for_each(self.name, registry, ctx.input, ctx.track, true, |values, value| {
                let value = if subtract { -value } else { value };
                for x in values.iter_mut() {
                    *x += value;
                }
            })?;
        self.source.finish()
    }
}

pub fn parse_add(name: &'static str, args: &[String], vars: &Variables) -> Result<AddFile> {
    AddFile::parse(name, args, vars, false)
}

pub fn parse_subtract(name: &'static str, args: &[String], vars: &Variables) -> Result<AddFile> {
    AddFile::parse(name, args, vars, true)
}

#[derive(Debug)]
pub struct AddConst {
    name: &'static str,
    constant: f64,
}

impl AddConst {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut constant = None;
        for arg in args {
            if arg.starts_with("--") || constant.is_some() {
                return Err(cant_understand(name, arg));
            }
            constant = Some(parse_value(arg)?);
        }
        let Some(constant) = constant else {
            return Err(op_error(name, "no constant value was provided"));
        };
        Ok(AddConst { name, constant })
    }
}

impl Operator for AddConst {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        for x in v.iter_mut() {
            *x += self.constant;
        }
        Ok(())
    }
}

///
/// Reflect every value about a middle value, `v = 2*mid - v`.
///
/// Without an explicit middle, the midpoint of the genome-wide minimum and
/// maximum is used, which swaps the two.
///
#[derive(Debug)]
pub struct Invert {
    name: &'static str,
    mid: Option<f64>,
}

impl Invert {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut mid = None;
        for arg in args {
            if arg.starts_with("--") || mid.is_some() {
                return Err(cant_understand(name, arg));
            }
            mid = Some(match arg.as_str() {
                "zero" | "negate" => 0.0,
                "one" => 1.0,
                "1/2" | "binary" => 0.5,
                _ => parse_value(arg)?,
            });
        }
        Ok(Invert { name, mid })
    }
}

impl Operator for Invert {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let mid = match self.mid {
            Some(mid) => mid,
            None => {
                let mut all = registry.iter().flat_map(|spec| spec.values.iter().copied());
                match all.next() {
                    None => 0.0,
                    Some(first) => {
                        let (lo, hi) = all.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
                        (lo + hi) / 2.0
                    }
                }
            }
        };

        for spec in registry.iter_mut() {
            for x in spec.values.iter_mut() {
                *x = 2.0 * mid - *x;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Abs {
    name: &'static str,
}

impl Abs {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        if let Some(arg) = args.first() {
            return Err(cant_understand(name, arg));
        }
        Ok(Abs { name })
    }
}

impl Operator for Abs {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, _ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        for x in v.iter_mut() {
            *x = x.abs();
        }
        Ok(())
    }
}
