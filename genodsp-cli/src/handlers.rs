use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use clap::error::ErrorKind;
use log::{LevelFilter, debug};

use genodsp_core::aggregate::{ReadOptions, apply_intervals};
use genodsp_core::operator::Operator;
use genodsp_core::pipeline::Pipeline;
use genodsp_core::reader::{InputSettings, IntervalReader};
use genodsp_core::registry::ChromosomeRegistry;
use genodsp_core::report::{Uncovered, report_intervals};
use genodsp_core::utils::{parse_int, parse_unitized_int};
use genodsp_core::variables::Variables;
use genodsp_ops::args::{default_origin_one, default_value_column};
use genodsp_ops::catalog::{self, OPERATORS};
use genodsp_ops::io::report_options_from;

use crate::cli::{create_genodsp_cli, normalize_global, split_pipeline};

/// Everything the command line asks for, ready to run.
struct Invocation {
    registry: ChromosomeRegistry,
    vars: Variables,
    pipeline: Pipeline,
    input: InputSettings,
    no_output: bool,
    track: bool,
}

fn init_logging(matches: &ArgMatches) {
    let debugging = matches.get_many::<String>("debug").is_some();
    let level = match (matches.get_count("verbose"), debugging) {
        (0, false) => LevelFilter::Info,
        (0, true) | (1, _) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // a second call (from tests) is harmless
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn has_debug(matches: &ArgMatches, what: &str) -> bool {
    matches
        .get_many::<String>("debug")
        .is_some_and(|mut values| values.any(|v| v == what))
}

/// Record the global options as named variables, for operators to default from.
fn set_globals(matches: &ArgMatches, vars: &mut Variables) -> Result<()> {
    if matches.get_flag("novalue") {
        vars.set("valColumn", -1.0);
    } else if let Some(text) = matches.get_one::<String>("value") {
        let col = parse_int(text)?;
        match col {
            0 => bail!("value column can't be 0 (\"--value={}\")", text),
            c if c < 0 => bail!("value column can't be negative (\"--value={}\")", text),
            1..=3 => bail!("value column can't be 1, 2 or 3 (\"--value={}\")", text),
            c => vars.set("valColumn", (c - 1) as f64),
        }
    }

    if matches.get_flag("nooutputvalue") {
        vars.set("noOutputValues", 1.0);
    }
    if let Some(precision) = matches.get_one::<usize>("precision") {
        vars.set("valPrecision", *precision as f64);
    }
    if matches.get_flag("nocollapse") {
        vars.set("collapseRuns", 0.0);
    }
    if let Some(mode) = matches.get_one::<String>("uncovered") {
        let mode: Uncovered = mode.parse()?;
        vars.set("showUncovered", mode.code());
    }
    if let Some(origin) = matches.get_one::<String>("origin") {
        let origin_one = matches!(origin.as_str(), "one" | "1");
        vars.set("originOne", if origin_one { 1.0 } else { 0.0 });
    }
    if let Some(text) = matches.get_one::<String>("window") {
        let size = parse_unitized_int(text)?;
        if size == 0 {
            bail!("window size can't be zero (\"--window={}\")", text);
        }
        if size < 0 {
            bail!("window size can't be negative (\"--window={}\")", text);
        }
        vars.set("windowSize", size as f64);
    }
    Ok(())
}

fn build_registry(matches: &ArgMatches) -> Result<ChromosomeRegistry> {
    let mut registry = ChromosomeRegistry::new();
    if let Some(specs) = matches.get_many::<String>("chroms") {
        for spec in specs {
            registry.add_inline_spec(spec)?;
        }
    }
    if let Some(filename) = matches.get_one::<String>("chromosomes") {
        registry
            .read_lengths_file(Path::new(filename))
            .with_context(|| format!("reading chromosome lengths from \"{}\"", filename))?;
    }
    if registry.is_empty() {
        bail!("gotta give me some chromosome names");
    }
    registry.allocate();
    Ok(registry)
}

fn input_settings(matches: &ArgMatches) -> Result<(InputSettings, bool)> {
    let mut input = InputSettings {
        report_comments: matches.get_one::<String>("report").is_some(),
        progress_every: None,
        debug_input: has_debug(matches, "input"),
        clip_to_length: matches.get_flag("cliptochromosome"),
    };
    let mut track = false;
    for progress in matches.get_many::<String>("progress").into_iter().flatten() {
        if progress == "operations" {
            track = true;
        } else if let Some(text) = progress.strip_prefix("input:") {
            let every = parse_unitized_int(text)?;
            input.progress_every = (every > 0).then_some(every as usize);
        } else {
            bail!("Can't understand \"--progress={}\"", progress);
        }
    }
    Ok((input, track))
}

fn write_help(topic: &str) -> Result<()> {
    let mut stderr = io::stderr().lock();
    if topic == "*" {
        for info in OPERATORS {
            info.write_usage(&mut stderr)?;
        }
        return Ok(());
    }
    let info = catalog::find(topic).ok_or_else(|| anyhow!("\"{}\" is not a known operation", topic))?;
    info.write_usage(&mut stderr)?;
    Ok(())
}

///
/// Parse the command line into a runnable invocation.
///
/// Returns `None` when the command line only asked for help.
///
fn parse_invocation(args: &[String]) -> Result<Option<Invocation>> {
    let (globals, op_args) = split_pipeline(args)?;

    let normalized = std::iter::once(crate::consts::BIN_NAME.to_string())
        .chain(globals.iter().map(|arg| normalize_global(arg)));
    let matches = match create_genodsp_cli().try_get_matches_from(normalized) {
        Ok(matches) => matches,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayVersion | ErrorKind::DisplayHelp) => {
            e.print()?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    init_logging(&matches);

    if matches.get_flag("list") {
        catalog::write_summaries(&mut io::stderr().lock())?;
        return Ok(None);
    }
    if let Some(topic) = matches.get_one::<String>("help") {
        write_help(topic)?;
        return Ok(None);
    }

    let mut vars = Variables::new();
    set_globals(&matches, &mut vars)?;
    let registry = build_registry(&matches)?;
    let (input, track) = input_settings(&matches)?;

    let debug_pipe = has_debug(&matches, "pipe");
    let mut ops: Vec<Box<dyn Operator>> = Vec::with_capacity(op_args.len());
    for op in &op_args {
        if debug_pipe {
            debug!("operator \"{}\" args: {}", op.name, op.args.join(" "));
        }
        ops.push(catalog::parse_operator(&op.name, &op.args, &vars)?);
    }

    if has_debug(&matches, "globals") {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "globals:")?;
        vars.report(&mut stderr, "  ")?;
    }

    let pipeline = Pipeline::new(ops)
        .with_tracking(track)
        .with_progress_bar(track);

    Ok(Some(Invocation {
        registry,
        vars,
        pipeline,
        input,
        no_output: matches.get_flag("nooutput"),
        track,
    }))
}

fn read_stdin(invocation: &mut Invocation) -> Result<()> {
    let vars = &invocation.vars;
    let options = ReadOptions {
        origin_one: default_origin_one(vars),
        clip_to_length: invocation.input.clip_to_length,
        track: invocation.track,
        ..Default::default()
    };
    let mut reader = IntervalReader::new(io::stdin().lock(), default_value_column(vars))
        .with_settings(invocation.input);
    apply_intervals(&mut invocation.registry, &mut reader, &options)?;
    Ok(())
}

pub fn run_genodsp(args: &[String]) -> Result<()> {
    if args.is_empty() {
        create_genodsp_cli().write_long_help(&mut io::stderr())?;
        bail!("gotta give me some chromosome names");
    }

    let Some(mut invocation) = parse_invocation(args)? else {
        return Ok(());
    };

    if invocation.pipeline.first_name() != Some("input") {
        read_stdin(&mut invocation)?;
    }

    invocation
        .pipeline
        .run(&mut invocation.registry, &mut invocation.vars, invocation.input)?;

    if !invocation.no_output {
        let mut options = report_options_from(&invocation.vars);
        options.track = invocation.track;
        let mut writer = BufWriter::new(io::stdout().lock());
        report_intervals(&invocation.registry, &mut writer, &options)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn invocation(list: &[&str]) -> Result<Invocation> {
        parse_invocation(&strings(list))?.ok_or_else(|| anyhow!("nothing to run"))
    }

    #[rstest]
    fn test_globals_become_variables() {
        let run = invocation(&[
            "chr1:100", "--novalue", "--precision=3", "--nocollapse", "--markgaps", "--origin=one", "W=2K",
        ])
        .unwrap();
        assert_eq!(run.vars.get("valColumn"), Some(-1.0));
        assert_eq!(run.vars.get("valPrecision"), Some(3.0));
        assert_eq!(run.vars.get("collapseRuns"), Some(0.0));
        assert_eq!(run.vars.get("showUncovered"), Some(-1.0));
        assert_eq!(run.vars.get("originOne"), Some(1.0));
        assert_eq!(run.vars.get("windowSize"), Some(2000.0));
    }

    #[rstest]
    fn test_operators_use_canonical_names() {
        let run = invocation(&["chr1:100", "=skimp", "T=1", "=", "window_sum", "=abs"]).unwrap();
        assert_eq!(run.pipeline.names(), vec!["anticlump", "sum", "abs"]);
    }

    #[rstest]
    #[case(&["=sum"], "gotta give me some chromosome names")]
    #[case(&["chr1:100", "=frobnicate"], "\"frobnicate\" is not a known operation")]
    #[case(&["chr1:100", "chr1:200"], "can't specify chr1 more than once")]
    #[case(&["chr1:100", "--value=2"], "value column can't be 1, 2 or 3 (\"--value=2\")")]
    #[case(&["chr1:100", "W=0"], "window size can't be zero (\"--window=0\")")]
    fn test_invocation_errors(#[case] list: &[&str], #[case] expected: &str) {
        let err = invocation(list).err().unwrap();
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn test_progress_settings() {
        let run = invocation(&["chr1:100", "--progress=input:1K", "--progress=operations", "--clip"]).unwrap();
        assert_eq!(run.input.progress_every, Some(1000));
        assert!(run.input.clip_to_length);
        assert!(run.track);
    }
}
