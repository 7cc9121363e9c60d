use anyhow::{Result, bail};
use clap::{Arg, ArgAction, Command, value_parser};

use crate::consts::*;

pub fn create_genodsp_cli() -> Command {
    Command::new(BIN_NAME)
        .bin_name(BIN_NAME)
        .version(VERSION)
        .about("Apply a pipeline of signal processing operators to per-base genomic values.")
        .override_usage(
            "[cat <file>] | genodsp --chromosomes=<filename> [options] [= <operator> [arguments]]...",
        )
        .after_help(
            "Input is usually piped in on stdin. However, if the first operator is \"input\"\n\
             stdin is ignored. Where input intervals overlap, their values are summed.\n\n\
             For a list of available operators, do \"genodsp ?\".\n\
             For detailed descriptions of the operators, do \"genodsp --help\".",
        )
        .disable_help_flag(true)
        .arg(
            Arg::new("chromosomes")
                .long("chromosomes")
                .value_name("FILE")
                .require_equals(true)
                .help("Read chromosome names and lengths from a file"),
        )
        .arg(
            Arg::new("value")
                .long("value")
                .value_name("COL")
                .require_equals(true)
                .help("Input intervals carry a value in this column (default 4)"),
        )
        .arg(
            Arg::new("novalue")
                .long("novalue")
                .action(ArgAction::SetTrue)
                .help("Input intervals have no value (the value given is 1)"),
        )
        .arg(
            Arg::new("nooutputvalue")
                .long("nooutputvalue")
                .action(ArgAction::SetTrue)
                .help("Don't write values with output intervals"),
        )
        .arg(
            Arg::new("precision")
                .long("precision")
                .require_equals(true)
                .value_parser(value_parser!(usize))
                .help("Number of digits to round output values to (default 0)"),
        )
        .arg(
            Arg::new("nocollapse")
                .long("nocollapse")
                .action(ArgAction::SetTrue)
                .help("Don't collapse runs of identical values into one interval"),
        )
        .arg(
            Arg::new("uncovered")
                .long("uncovered")
                .require_equals(true)
                .value_parser(["hide", "show", "NA"])
                .help("How to write bases with no coverage"),
        )
        .arg(
            Arg::new("cliptochromosome")
                .long("cliptochromosome")
                .action(ArgAction::SetTrue)
                .help("Clip intervals to the chromosome length instead of failing"),
        )
        .arg(
            Arg::new("origin")
                .long("origin")
                .require_equals(true)
                .value_parser(["one", "1", "zero", "0"])
                .help("Intervals are origin-one (closed) or origin-zero (half-open)"),
        )
        .arg(
            Arg::new("nooutput")
                .long("nooutput")
                .action(ArgAction::SetTrue)
                .help("Don't write the resulting intervals to stdout"),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .value_name("LENGTH")
                .require_equals(true)
                .help("Window size, for operators that have one (also W=)"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .require_equals(true)
                .value_parser(["comments"])
                .help("Copy input comment lines to the log"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .require_equals(true)
                .action(ArgAction::Append)
                .help("Report progress: input:<n> (every nth input line) or operations"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .require_equals(true)
                .action(ArgAction::Append)
                .value_parser(["input", "pipe", "globals"]),
        )
        .arg(
            Arg::new("help")
                .long("help")
                .value_name("OPERATOR")
                .require_equals(true)
                .num_args(0..=1)
                .default_missing_value("*")
                .help("Describe one operator, or all of them"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List the operators (also ?)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Log more detail (repeat for more)"),
        )
        .arg(
            Arg::new("chroms")
                .value_name("CHROM:LENGTH")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Chromosomes of interest, as chrom:length or chrom:start:end"),
        )
}

const RENAMED: &[(&str, &str)] = &[
    ("--novalues", "--novalue"),
    ("--value=none", "--novalue"),
    ("--nooutputvalues", "--nooutputvalue"),
    ("--uncovered:hide", "--uncovered=hide"),
    ("--hide:uncovered", "--uncovered=hide"),
    ("--uncovered:show", "--uncovered=show"),
    ("--show:uncovered", "--uncovered=show"),
    ("--uncovered:NA", "--uncovered=NA"),
    ("--uncovered:mark", "--uncovered=NA"),
    ("--mark:uncovered", "--uncovered=NA"),
    ("--markgaps", "--uncovered=NA"),
    ("--cliptochrom", "--cliptochromosome"),
    ("--cliptolength", "--cliptochromosome"),
    ("--clip", "--cliptochromosome"),
    ("--report:comments", "--report=comments"),
    ("--progress:operations", "--progress=operations"),
    ("--debug=operations", "--progress=operations"),
    ("?", "--list"),
];

const REPREFIXED: &[(&str, &str)] = &[
    ("--chroms=", "--chromosomes="),
    ("W=", "--window="),
    ("--W=", "--window="),
    ("--progress:input=", "--progress=input:"),
    ("--progress:input:", "--progress=input:"),
    ("?=", "--help="),
    ("?", "--help="),
];

///
/// Rewrite a global option's terse or legacy spelling to the canonical long
/// option the parser knows. Anything else comes back unchanged.
///
pub fn normalize_global(arg: &str) -> String {
    if let Some((_, to)) = RENAMED.iter().find(|(from, _)| *from == arg) {
        return to.to_string();
    }
    for (from, to) in REPREFIXED {
        if let Some(rest) = arg.strip_prefix(from) {
            return format!("{}{}", to, rest);
        }
    }
    arg.to_string()
}

/// One operator from the command line: its name and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorArgs {
    pub name: String,
    pub args: Vec<String>,
}

///
/// Separate the global options from the operator pipeline.
///
/// An argument beginning with `=` starts an operator; the name is either
/// attached (`=clump`) or the next argument (`= clump`). The operator's
/// arguments run up to the next argument beginning with `=`.
///
pub fn split_pipeline(args: &[String]) -> Result<(Vec<String>, Vec<OperatorArgs>)> {
    let first_op = args
        .iter()
        .position(|arg| arg.starts_with(PIPE_CHAR))
        .unwrap_or(args.len());
    let globals = args[..first_op].to_vec();

    let mut ops = Vec::new();
    let mut ix = first_op;
    while ix < args.len() {
        let attached = args[ix].trim_start_matches(PIPE_CHAR).trim_start();
        let name = if attached.is_empty() {
            ix += 1;
            match args.get(ix) {
                Some(name) => name.clone(),
                None => bail!("{} at end of command line, with no operation", PIPE_CHAR),
            }
        } else {
            attached.to_string()
        };
        ix += 1;

        let end = args[ix..]
            .iter()
            .position(|arg| arg.starts_with(PIPE_CHAR))
            .map_or(args.len(), |offset| ix + offset);
        ops.push(OperatorArgs {
            name,
            args: args[ix..end].to_vec(),
        });
        ix = end;
    }

    Ok((globals, ops))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("W=1K", "--window=1K")]
    #[case("--chroms=hg19.len", "--chromosomes=hg19.len")]
    #[case("--markgaps", "--uncovered=NA")]
    #[case("--clip", "--cliptochromosome")]
    #[case("--progress:input=100", "--progress=input:100")]
    #[case("?", "--list")]
    #[case("?clump", "--help=clump")]
    #[case("?=clump", "--help=clump")]
    #[case("chr1:1000", "chr1:1000")]
    #[case("--precision=2", "--precision=2")]
    fn test_normalize_global(#[case] arg: &str, #[case] expected: &str) {
        assert_eq!(normalize_global(arg), expected);
    }

    #[rstest]
    fn test_split_pipeline() {
        let args = strings(&[
            "chr1:100", "--precision=2", "=sum", "W=10", "=", "clump", "T=3", "=abs",
        ]);
        let (globals, ops) = split_pipeline(&args).unwrap();
        assert_eq!(globals, strings(&["chr1:100", "--precision=2"]));
        assert_eq!(
            ops,
            vec![
                OperatorArgs { name: "sum".to_string(), args: strings(&["W=10"]) },
                OperatorArgs { name: "clump".to_string(), args: strings(&["T=3"]) },
                OperatorArgs { name: "abs".to_string(), args: vec![] },
            ]
        );
    }

    #[rstest]
    fn test_split_trailing_pipe() {
        let err = split_pipeline(&strings(&["chr1:100", "=sum", "="])).unwrap_err();
        assert_eq!(err.to_string(), "= at end of command line, with no operation");
    }

    #[rstest]
    fn test_cli_parses_normalized_globals() {
        let args = ["genodsp", "--chromosomes=hg.len", "--window=5", "-vv", "chr1:10", "chr2:5:9"];
        let matches = create_genodsp_cli().try_get_matches_from(args).unwrap();
        assert_eq!(matches.get_one::<String>("chromosomes").unwrap(), "hg.len");
        assert_eq!(matches.get_count("verbose"), 2);
        let chroms: Vec<&String> = matches.get_many::<String>("chroms").unwrap().collect();
        assert_eq!(chroms, vec!["chr1:10", "chr2:5:9"]);
    }

    #[rstest]
    fn test_cli_bare_help_means_every_operator() {
        let matches = create_genodsp_cli().try_get_matches_from(["genodsp", "--help"]).unwrap();
        assert_eq!(matches.get_one::<String>("help").unwrap(), "*");
    }
}
