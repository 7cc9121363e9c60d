//! Multiplying and dividing by a sorted interval file.
//!
//! Bases outside every interval count as multiplied (or divided) by zero.
use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::utils::parse_value;
use genodsp_core::variables::Variables;

use crate::args::{arg_value, cant_understand};
use crate::source::IntervalSource;
use crate::walk::{WalkVisitor, walk_sorted};

struct Multiplier;

impl WalkVisitor for Multiplier {
    fn gap(&mut self, values: &mut [f64]) {
        values.fill(0.0);
    }

    fn interval(&mut self, values: &mut [f64], value: f64) {
        for x in values.iter_mut() {
            *x *= value;
        }
    }
}

struct Divider {
    infinity: f64,
}

impl WalkVisitor for Divider {
    fn gap(&mut self, values: &mut [f64]) {
        for x in values.iter_mut() {
            *x = if *x >= 0.0 { self.infinity } else { -self.infinity };
        }
    }

    fn interval(&mut self, values: &mut [f64], value: f64) {
        for x in values.iter_mut() {
            *x /= value;
        }
    }
}

#[derive(Debug)]
pub struct MultiplyFile {
    name: &'static str,
    source: IntervalSource,
    /// `Some(infinity)` when dividing
    divide: Option<f64>,
    debug: bool,
}

impl MultiplyFile {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables, divide: bool) -> Result<Self> {
        let mut source = IntervalSource::with_values(vars);
        let mut infinity = f64::MAX;
        let mut debug = false;

        for arg in args {
            if source.accept(name, arg)? {
                continue;
            }
            match arg_value(arg, &["--infinity="]) {
                Some(text) if divide => infinity = parse_value(text)?,
                _ if arg == "--debug" => debug = true,
                _ => return Err(cant_understand(name, arg)),
            }
        }
        source.require(name)?;

        Ok(MultiplyFile {
            name,
            source,
            divide: divide.then_some(infinity),
            debug,
        })
    }
}

impl Operator for MultiplyFile {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        match self.divide {
            Some(infinity) => walk_sorted(
                self.name,
                &self.source,
                registry,
                ctx,
                self.debug,
                &mut Divider { infinity },
            )?,
            None => walk_sorted(self.name, &self.source, registry, ctx, self.debug, &mut Multiplier)?,
        }
        self.source.finish()
    }
}

pub fn parse_multiply(name: &'static str, args: &[String], vars: &Variables) -> Result<MultiplyFile> {
    MultiplyFile::parse(name, args, vars, false)
}

pub fn parse_divide(name: &'static str, args: &[String], vars: &Variables) -> Result<MultiplyFile> {
    MultiplyFile::parse(name, args, vars, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::testing::{args, registry_of, run_genome};

    #[fixture]
    fn file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "chr1 1 3 2\nchr1 3 4 0.5\n").unwrap();
        file
    }

    #[rstest]
    fn test_multiply(file: NamedTempFile) {
        let name = file.path().to_str().unwrap();
        let mut vars = Variables::new();
        let mut op = parse_multiply("multiply", &args(&[name]), &vars).unwrap();

        let mut registry = registry_of(&[
            ("chr1", vec![3.0, 3.0, 3.0, 3.0, 3.0]),
            ("chr2", vec![1.0, 1.0]),
        ]);
        run_genome(&mut op, &mut registry, &mut vars).unwrap();
        assert_eq!(
            registry.get("chr1").unwrap().values,
            vec![0.0, 6.0, 6.0, 1.5, 0.0]
        );
        assert_eq!(registry.get("chr2").unwrap().values, vec![0.0, 0.0]);
    }

    #[rstest]
    fn test_divide(file: NamedTempFile) {
        let name = file.path().to_str().unwrap();
        let mut vars = Variables::new();
        let mut op = parse_divide("divide", &args(&[name, "--infinity=99"]), &vars).unwrap();

        let mut registry = registry_of(&[("chr1", vec![-3.0, 4.0, 4.0, 4.0, 0.0])]);
        run_genome(&mut op, &mut registry, &mut vars).unwrap();
        assert_eq!(
            registry.get("chr1").unwrap().values,
            vec![-99.0, 2.0, 2.0, 8.0, 99.0]
        );
    }

    #[rstest]
    fn test_multiply_has_no_infinity() {
        let err = parse_multiply("multiply", &args(&["x.bed", "--infinity=9"]), &Variables::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "[multiply] Can't understand \"--infinity=9\"");
    }
}
