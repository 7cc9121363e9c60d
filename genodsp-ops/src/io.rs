//! Reading and writing the interval set from inside a pipeline.
use std::io::{self, Write};

use genodsp_core::aggregate::{OverlapPolicy, ReadOptions, apply_intervals};
use genodsp_core::errors::Result;
use genodsp_core::operator::{Context, Operator, Scope, Target};
use genodsp_core::report::{ReportOptions, Uncovered, report_intervals};
use genodsp_core::utils::{get_dynamic_writer, parse_int, parse_value};
use genodsp_core::variables::Variables;

use crate::args::{arg_is, arg_value, cant_understand, default_origin_one, op_error, parse_origin};
use crate::source::IntervalSource;

/// Flags that select how uncovered bases are written, and the mode each selects.
pub const UNCOVERED_FLAGS: &[(&str, Uncovered)] = &[
    ("--uncovered:hide", Uncovered::Hide),
    ("--hide:uncovered", Uncovered::Hide),
    ("--uncovered:show", Uncovered::Show),
    ("--show:uncovered", Uncovered::Show),
    ("--uncovered:NA", Uncovered::Na),
    ("--uncovered:mark", Uncovered::Na),
    ("--mark:uncovered", Uncovered::Na),
    ("--markgaps", Uncovered::Na),
];

pub fn uncovered_flag(arg: &str) -> Option<Uncovered> {
    UNCOVERED_FLAGS
        .iter()
        .find(|(flag, _)| *flag == arg)
        .map(|(_, mode)| *mode)
}

///
/// Report settings as recorded in the global variables.
///
/// `valPrecision`, `noOutputValues`, `collapseRuns`, `showUncovered` and
/// `originOne` each fall back to the reporter's default when unset.
///
pub fn report_options_from(vars: &Variables) -> ReportOptions {
    let defaults = ReportOptions::default();
    ReportOptions {
        precision: vars.get_or("valPrecision", defaults.precision as f64).max(0.0) as usize,
        no_values: vars.get_or("noOutputValues", 0.0) != 0.0,
        collapse: vars.get_or("collapseRuns", 1.0) != 0.0,
        uncovered: Uncovered::from_code(vars.get_or("showUncovered", defaults.uncovered.code())),
        origin_one: default_origin_one(vars),
        track: false,
    }
}

/// Replace the current interval set with the contents of a file.
#[derive(Debug)]
pub struct Input {
    name: &'static str,
    source: IntervalSource,
    missing: f64,
    overlap: OverlapPolicy,
}

impl Input {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut source = IntervalSource::with_values(vars);
        let mut missing = 0.0;
        let mut overlap = OverlapPolicy::Sum;

        for arg in args {
            if let Some(text) = arg_value(arg, &["--missing="]) {
                missing = parse_value(text)?;
            } else if let Some(text) = arg_value(arg, &["--overlap="]) {
                overlap = text.parse().map_err(|_| cant_understand(name, arg))?;
            } else if !source.accept(name, arg)? {
                return Err(cant_understand(name, arg));
            }
        }
        source.require(name)?;

        Ok(Input {
            name,
            source,
            missing,
            overlap,
        })
    }
}

impl Operator for Input {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let options = ReadOptions {
            origin_one: self.source.origin_one,
            overlap: self.overlap,
            clear: true,
            missing: self.missing,
            clip_to_length: ctx.input.clip_to_length,
            track: ctx.track,
        };
        let mut reader = self.source.open(ctx.input)?;
        apply_intervals(registry, &mut reader, &options).map_err(|e| self.source.in_file(self.name, e))?;
        self.source.finish()
    }
}

/// Write the current interval set to a file.
#[derive(Debug)]
pub struct Output {
    name: &'static str,
    filename: String,
    options: ReportOptions,
}

impl Output {
    pub fn parse(name: &'static str, args: &[String], vars: &Variables) -> Result<Self> {
        let mut filename: Option<String> = None;
        let mut options = report_options_from(vars);

        for arg in args {
            if let Some(text) = arg_value(arg, &["--precision="]) {
                let precision = parse_int(text)?;
                if precision < 0 {
                    return Err(op_error(name, format!("precision can't be negative (\"{}\")", arg)));
                }
                options.precision = precision as usize;
            } else if arg_is(arg, &["--nooutputvalue", "--nooutputvalues"]) {
                options.no_values = true;
            } else if arg == "--nocollapse" {
                options.collapse = false;
            } else if let Some(mode) = uncovered_flag(arg) {
                options.uncovered = mode;
            } else if let Some(text) = arg_value(arg, &["--origin="]) {
                options.origin_one = parse_origin(name, arg, text)?;
            } else if arg.starts_with("--") || filename.is_some() {
                return Err(cant_understand(name, arg));
            } else {
                filename = Some(arg.clone());
            }
        }

        let Some(filename) = filename else {
            return Err(op_error(name, "no filename was provided"));
        };
        Ok(Output {
            name,
            filename,
            options,
        })
    }
}

impl Operator for Output {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        let registry = target.into_genome(self.name)?;
        let mut writer = get_dynamic_writer(&self.filename)?;
        let options = ReportOptions {
            track: ctx.track,
            ..self.options
        };
        report_intervals(registry, &mut writer, &options)
    }
}

/// Print every named variable to stderr.
#[derive(Debug)]
pub struct ShowVariables {
    name: &'static str,
}

impl ShowVariables {
    pub fn parse(name: &'static str, args: &[String], _vars: &Variables) -> Result<Self> {
        if let Some(arg) = args.first() {
            return Err(cant_understand(name, arg));
        }
        Ok(ShowVariables { name })
    }
}

impl Operator for ShowVariables {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> Scope {
        Scope::WholeGenome
    }

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
        target.into_genome(self.name)?;
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "variables:")?;
        ctx.vars.report(&mut stderr, "  ")
    }
}
