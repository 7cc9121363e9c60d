//! Masking by intervals, and clipping or erasing by value.
use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{ValueRef, arg_is, arg_value, cant_understand, op_error};
use crate::source::IntervalSource;
use crate::walk::{WalkVisitor, walk_sorted};

const MASK_ARGS: &[&str] = &["--mask=", "M=", "--M="];

fn parse_mask_value(
    name: &str,
    arg: &str,
    text: &str,
    mask: &mut Option<ValueRef>,
) -> Result<()> {
    if mask.is_some() {
        return Err(op_error(
            name,
            format!("mask value specified more than once (at \"{}\")", arg),
        ));
    }
    *mask = Some(ValueRef::parse(text));
    Ok(())
}

/// Set every base covered by the file's intervals to the mask value.
#[derive(Debug)]
pub struct Mask {
    name: &'static str,
    source: IntervalSource,
    mask: ValueRef,
}

impl Mask {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut source = IntervalSource::without_values(vars);
        let mut mask = None;
        for arg in args {
            if let Some(text) = arg_value(arg, MASK_ARGS) {
                parse_mask_value(name, arg, text, &mut mask)?;
            } else if !source.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        source.require(name)?;
        Ok(Mask {
            name,
            source,
            mask: mask.unwrap_or(ValueRef::Literal(0.0)),
        })
    }
}

impl Operator for Mask {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let mask = self.mask.resolve(self.name, "mask value", ctx.vars)?;
        self.source
            .for_each(self.name, registry, ctx.input, ctx.track, false, |values, _| {
                values.fill(mask)
            })?;
        self.source.finish()
    }
}

struct GapMasker {
    mask: f64,
}

impl WalkVisitor for GapMasker {
    fn gap(&mut self, values: &mut [f64]) {
        values.fill(self.mask);
    }

    fn interval(&mut self, _values: &mut [f64], _value: f64) {}
}

/// Set every base NOT covered by the file's intervals to the mask value.
#[derive(Debug)]
pub struct MaskNot {
    name: &'static str,
    source: IntervalSource,
    mask: ValueRef,
}

impl MaskNot {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let Mask { source, mask, .. } = Mask::parse(name, args, vars)?;
        Ok(MaskNot { name, source, mask })
    }
}

impl Operator for MaskNot {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let mask = self.mask.resolve(self.name, "mask value", ctx.vars)?;
        walk_sorted(
            self.name,
            &self.source,
            registry,
            ctx,
            false,
            &mut GapMasker { mask },
        )?;
        self.source.finish()
    }
}

/// Lower and upper value limits, either of which may name a variable.
#[derive(Debug, Default)]
pub struct Limits {
    min: Option<ValueRef>,
    max: Option<ValueRef>,
}

impl Limits {
    /// Consume `--min=`/`--max=` (and the long spellings).
    fn accept(&mut self, name: &str, arg: &str) -> Result<bool> {
        if let Some(text) = arg_value(arg, &["--minimum=", "--min="]) {
            if self.min.is_some() {
                return Err(op_error(
                    name,
                    format!("minimum limit specified more than once (at \"{}\")", arg),
                ));
            }
            self.min = Some(ValueRef::parse(text));
            return Ok(true);
        }
        if let Some(text) = arg_value(arg, &["--maximum=", "--max="]) {
            if self.max.is_some() {
                return Err(op_error(
                    name,
                    format!("maximum limit specified more than once (at \"{}\")", arg),
                ));
            }
            self.max = Some(ValueRef::parse(text));
            return Ok(true);
        }
        Ok(false)
    }

    fn check(&self, name: &str) -> Result<()> {
        match (&self.min, &self.max) {
            (None, None) => Err(op_error(name, "neither minimum nor maximum limit was provided")),
            (Some(ValueRef::Literal(lo)), Some(ValueRef::Literal(hi))) => conflict(name, *lo, *hi),
            _ => Ok(()),
        }
    }

    fn resolve(&mut self, name: &str, vars: &Variables) -> Result<(Option<f64>, Option<f64>)> {
        let lo = match self.min.as_mut() {
            Some(v) => Some(v.resolve(name, "minimum limit", vars)?),
            None => None,
        };
        let hi = match self.max.as_mut() {
            Some(v) => Some(v.resolve(name, "maximum limit", vars)?),
            None => None,
        };
        if let (Some(lo), Some(hi)) = (lo, hi) {
            conflict(name, lo, hi)?;
        }
        Ok((lo, hi))
    }
}

fn conflict(name: &str, lo: f64, hi: f64) -> Result<()> {
    if lo > hi {
        return Err(op_error(
            name,
            format!("conflicting limits ({:.6}>{:.6})", lo, hi),
        ));
    }
    Ok(())
}

/// Clamp values into `[min, max]`.
#[derive(Debug)]
pub struct Clip {
    name: &'static str,
    limits: Limits,
}

impl Clip {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut limits = Limits::default();
        for arg in args {
            if !limits.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        limits.check(name)?;
        Ok(Clip { name, limits })
    }
}

impl Operator for Clip {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let (lo, hi) = self.limits.resolve(self.name, ctx.vars)?;
        for x in v.iter_mut() {
            if let Some(lo) = lo {
                if *x < lo {
                    *x = lo;
                    continue;
                }
            }
            if let Some(hi) = hi {
                if *x > hi {
                    *x = hi;
                }
            }
        }
        Ok(())
    }
}

///
/// Replace values inside (or, with `--keep:inside`, outside) a range with
/// the zero value.
///
/// With only one limit given, "inside" means at or beyond that limit.
///
#[derive(Debug)]
pub struct Erase {
    name: &'static str,
    limits: Limits,
    keep_inside: bool,
    zero: f64,
}

impl Erase {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        let mut limits = Limits::default();
        let mut keep_inside = false;
        let mut zero = 0.0;
        for arg in args {
            if limits.accept(name, arg)? {
                continue;
            }
            if arg_is(arg, &["--keep:outside", "--keep=outside"]) {
                keep_inside = false;
            } else if arg_is(arg, &["--keep:inside", "--keep=inside"]) {
                keep_inside = true;
            } else if let Some(text) = arg_value(arg, &["--zero=", "Z=", "--Z="]) {
                zero = parse_value(text)?;
            } else {
                return Err(cant_understand(name, arg));
            }
        }
        limits.check(name)?;
        Ok(Erase {
            name,
            limits,
            keep_inside,
            zero,
        })
    }
}

impl Operator for Erase {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::PerChromosome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let (_, v) = target.into_chromosome(self.name)?;
        let (lo, hi) = self.limits.resolve(self.name, ctx.vars)?;
        let lo = lo.unwrap_or(f64::NEG_INFINITY);
        let hi = hi.unwrap_or(f64::INFINITY);

        for x in v.iter_mut() {
            let inside = *x >= lo && *x <= hi;
            if inside != self.keep_inside {
                *x = self.zero;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::testing::{args, registry_of, run_genome, run_on, run_on_with};

    #[fixture]
    fn file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "chr1 1 3\nchr1 4 5\n").unwrap();
        file
    }

    #[rstest]
    fn test_mask(file: NamedTempFile) {
        let name = file.path().to_str().unwrap();
        let mut vars = Variables::new();
        let mut op = Mask::parse("mask", &args(&[name, "M=-1"]), &vars).unwrap();
        let mut registry = registry_of(&[("chr1", vec![5.0; 6])]);
        run_genome(&mut op, &mut registry, &mut vars).unwrap();
        assert_eq!(
            registry.get("chr1").unwrap().values,
            vec![5.0, -1.0, -1.0, 5.0, -1.0, 5.0]
        );
    }

    #[rstest]
    fn test_masknot(file: NamedTempFile) {
        let name = file.path().to_str().unwrap();
        let mut vars = Variables::new();
        let mut op = MaskNot::parse("masknot", &args(&[name]), &vars).unwrap();
        let mut registry = registry_of(&[("chr1", vec![5.0; 6]), ("chr2", vec![5.0; 2])]);
        run_genome(&mut op, &mut registry, &mut vars).unwrap();
        assert_eq!(
            registry.get("chr1").unwrap().values,
            vec![0.0, 5.0, 5.0, 0.0, 5.0, 0.0]
        );
        assert_eq!(registry.get("chr2").unwrap().values, vec![0.0, 0.0]);
    }

    #[rstest]
    fn test_mask_value_twice() {
        let err = Mask::parse("mask", &args(&["a.bed", "M=1", "--mask=2"]), &Variables::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[mask] mask value specified more than once (at \"--mask=2\")"
        );
    }

    #[rstest]
    #[case(&["--min=0"], vec![0.0, 0.5, 3.0])]
    #[case(&["--max=1"], vec![-2.0, 0.5, 1.0])]
    #[case(&["--min=0", "--maximum=1"], vec![0.0, 0.5, 1.0])]
    fn test_clip(#[case] list: &[&str], #[case] expected: Vec<f64>) {
        let mut op = Clip::parse("clip", &args(list), &Variables::new()).unwrap();
        assert_eq!(run_on(&mut op, vec![-2.0, 0.5, 3.0]), expected);
    }

    #[rstest]
    fn test_clip_limits_from_variable() {
        let mut vars = Variables::new();
        vars.set("percentile90", 2.0);
        let mut op = Clip::parse("clip", &args(&["--max=percentile90"]), &vars).unwrap();
        assert_eq!(
            run_on_with(&mut op, vec![1.0, 5.0], &mut vars),
            vec![1.0, 2.0]
        );
    }

    #[rstest]
    #[case(&[], "[clip] neither minimum nor maximum limit was provided")]
    #[case(&["--min=2", "--max=1"], "[clip] conflicting limits (2.000000>1.000000)")]
    fn test_clip_bad_limits(#[case] list: &[&str], #[case] expected: &str) {
        let err = Clip::parse("clip", &args(list), &Variables::new()).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case(&["--min=1", "--max=3"], vec![0.0, 0.0, 0.0, 0.0, 4.0])]
    #[case(&["--min=1", "--max=3", "--keep:inside", "Z=-1"], vec![-1.0, 1.0, 2.0, 3.0, -1.0])]
    #[case(&["--min=2"], vec![0.0, 1.0, 0.0, 0.0, 0.0])]
    #[case(&["--max=2"], vec![0.0, 0.0, 0.0, 3.0, 4.0])]
    fn test_erase(#[case] list: &[&str], #[case] expected: Vec<f64>) {
        let mut op = Erase::parse("erase", &args(list), &Variables::new()).unwrap();
        assert_eq!(run_on(&mut op, vec![0.0, 1.0, 2.0, 3.0, 4.0]), expected);
    }
}
