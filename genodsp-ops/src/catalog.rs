//! The operator table: names, aliases, help text, and construction.
use std::io::Write;

use genodsp_core::errors::{GenodspError, Result};
use genodsp_core::operator::Operator;
use genodsp_core::variables::Variables;

use crate::arith::{Abs, AddConst, Invert, parse_add, parse_subtract};
use crate::clump::{parse_clump, parse_skimp};
use crate::io::{Input, Output, ShowVariables};
use crate::logical::{And, Binarize, Or};
use crate::map::MapOp;
use crate::mask::{Clip, Erase, Mask, MaskNot};
use crate::minmax::{
    parse_bestmax, parse_bestmin, parse_localmax, parse_localmin, parse_maxover, parse_maxwith,
    parse_minover, parse_minwith,
};
use crate::morphology::{parse_close, parse_dilate, parse_erode, parse_open};
use crate::multiply::{parse_divide, parse_multiply};
use crate::percentile::Percentile;
use crate::sum::{CumulativeSum, SlidingSum, Smooth, WindowSum};

type Builder = fn(&'static str, &[String], &Variables) -> Result<Box<dyn Operator>>;

fn boxed<O: Operator + 'static>(op: Result<O>) -> Result<Box<dyn Operator>> {
    Ok(Box::new(op?))
}

pub struct OperatorInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// one line description, for `?`
    pub summary: &'static str,
    /// argument list, for `--help=<op>`
    pub usage: &'static str,
    build: Builder,
}

impl OperatorInfo {
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    /// Write the `--help=<op>` text.
    pub fn write_usage<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "=== {} ===", self.name)?;
        writeln!(writer, "  {}", self.summary)?;
        writeln!(writer)?;
        writeln!(writer, "  usage: {} {}", self.name, self.usage.lines().next().unwrap_or(""))?;
        for line in self.usage.lines().skip(1) {
            writeln!(writer, "    {}", line)?;
        }
        if !self.aliases.is_empty() {
            writeln!(writer, "  (also known as {})", self.aliases.join(", "))?;
        }
        Ok(())
    }
}

pub static OPERATORS: &[OperatorInfo] = &[
    OperatorInfo {
        name: "sum",
        aliases: &["window_sum"],
        summary: "sum over non-overlapping windows",
        usage: "[--window=<length>|chromosome] [--denom=<value>|actual|window] [--zero=<value>]\n\
                --window=<length>   (W=) window size (default is windowSize, or 100)\n\
                --denom=<value>     (D=) divide each sum by this",
        build: |name, args, vars| boxed(WindowSum::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "slidingsum",
        aliases: &["sliding_sum"],
        summary: "continuous sum over overlapping windows",
        usage: "[--window=<length>] [--denom=<value>|window]\n\
                --window=<length>   (W=) window size (default is windowSize, or 100)",
        build: |name, args, vars| boxed(SlidingSum::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "smooth",
        aliases: &[],
        summary: "apply a smoothing filter (Hann window)",
        usage: "[--window=<length>]\n\
                --window=<length>   (W=) window size, forced odd (default is windowSize, or 101)",
        build: |name, args, vars| boxed(Smooth::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "cumulativesum",
        aliases: &["cumulative", "integrate"],
        summary: "compute the cumulative sum of the current set of interval values",
        usage: "",
        build: |name, args, vars| boxed(CumulativeSum::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "clump",
        aliases: &[],
        summary: "find intervals with an average above some threshold",
        usage: "[<average>] [--length=<length>] [--one=<value>] [--zero=<value>]\n\
                --average=<value>   (T=) threshold, a number or a variable name\n\
                --length=<length>   (L=) minimum interval length (default is 100)\n\
                --one=<value>       (O=) value for bases in intervals (default is 1)\n\
                --zero=<value>      (Z=) value for bases outside intervals (default is 0)",
        build: |name, args, vars| boxed(parse_clump(name, args, vars)),
    },
    OperatorInfo {
        name: "anticlump",
        aliases: &["anti_clump", "skimp"],
        summary: "find intervals with an average below some threshold",
        usage: "[<average>] [--length=<length>] [--one=<value>] [--zero=<value>]\n\
                (arguments are the same as for clump)",
        build: |name, args, vars| boxed(parse_skimp(name, args, vars)),
    },
    OperatorInfo {
        name: "percentile",
        aliases: &[],
        summary: "identify percentiles in the data",
        usage: "<p>|<lo>,<hi>|<lo>..<hi> [by <step>] [options]\n\
                --step=<value>      step between percentiles in a range\n\
                --window=<length>   (W=) sample every Nth base\n\
                --min=<value>       ignore values below this\n\
                --max=<value>       ignore values above this\n\
                --precision=<n>     digits for reported values\n\
                --map=<file>        write value/percentile pairs to a file\n\
                --report:bash       report as bash variable assignments\n\
                --quiet             don't report",
        build: |name, args, vars| boxed(Percentile::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "add",
        aliases: &[],
        summary: "add an incoming set of interval values to the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]",
        build: |name, args, vars| boxed(parse_add(name, args, vars)),
    },
    OperatorInfo {
        name: "subtract",
        aliases: &[],
        summary: "subtract an incoming set of interval values from the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]",
        build: |name, args, vars| boxed(parse_subtract(name, args, vars)),
    },
    OperatorInfo {
        name: "addconst",
        aliases: &["add_const"],
        summary: "add a constant value to the current set of interval values",
        usage: "<value>",
        build: |name, args, vars| boxed(AddConst::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "invert",
        aliases: &[],
        summary: "apply an arithmetic inversion filter, preserving min and max",
        usage: "[zero|one|binary|<value>]\n\
                the values are reflected about the given midpoint (by default, the\n\
                midpoint of the minimum and maximum values)",
        build: |name, args, vars| boxed(Invert::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "multiply",
        aliases: &[],
        summary: "multiply an incoming set of interval values by the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]\n\
                intervals must be sorted; uncovered bases become zero",
        build: |name, args, vars| boxed(parse_multiply(name, args, vars)),
    },
    OperatorInfo {
        name: "divide",
        aliases: &[],
        summary: "divide the current set of intervals by an incoming set",
        usage: "<filename> [--infinity=<value>] [--value=<col>|--novalue] [--origin=one|zero]\n\
                intervals must be sorted; uncovered bases become +/- infinity",
        build: |name, args, vars| boxed(parse_divide(name, args, vars)),
    },
    OperatorInfo {
        name: "abs",
        aliases: &[],
        summary: "compute the absolute value of the current set of interval values",
        usage: "",
        build: |name, args, vars| boxed(Abs::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "mask",
        aliases: &[],
        summary: "apply a list of masking intervals (read from a file)",
        usage: "<filename> [--mask=<value>] [--origin=one|zero] [--destroy]\n\
                --mask=<value>      (M=) value for masked bases (default is 0)",
        build: |name, args, vars| boxed(Mask::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "masknot",
        aliases: &["mask_not"],
        summary: "apply the complement of a list of masking intervals (read from a file)",
        usage: "<filename> [--mask=<value>] [--origin=one|zero] [--destroy]\n\
                intervals must be sorted",
        build: |name, args, vars| boxed(MaskNot::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "clip",
        aliases: &[],
        summary: "clip the current set of interval values to a specified min and/or max",
        usage: "[--min=<value>] [--max=<value>]",
        build: |name, args, vars| boxed(Clip::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "erase",
        aliases: &[],
        summary: "erase values within (or outside of) a specified min and/or max",
        usage: "[--min=<value>] [--max=<value>] [--keep:inside|--keep:outside] [--zero=<value>]",
        build: |name, args, vars| boxed(Erase::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "binarize",
        aliases: &[],
        summary: "apply a threshold filter",
        usage: "[<threshold>] [--ties:above|--ties:below] [--one=<value>] [--zero=<value>]\n\
                --threshold=<value> (T=) a number or a variable name",
        build: |name, args, vars| boxed(Binarize::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "or",
        aliases: &[],
        summary: "logical OR an incoming set of interval values with the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]",
        build: |name, args, vars| boxed(Or::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "and",
        aliases: &[],
        summary: "logical AND an incoming set of interval values with the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]\n\
                intervals must be sorted",
        build: |name, args, vars| boxed(And::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "maxover",
        aliases: &["max_over"],
        summary: "find the maximum value in each of a set of intervals",
        usage: "<filename> [--zero=<value>] [--origin=one|zero] [--destroy]\n\
                intervals must be sorted",
        build: |name, args, vars| boxed(parse_maxover(name, args, vars)),
    },
    OperatorInfo {
        name: "minover",
        aliases: &["min_over"],
        summary: "find the minimum value in each of a set of intervals",
        usage: "<filename> [--infinity=<value>] [--origin=one|zero] [--destroy]\n\
                intervals must be sorted",
        build: |name, args, vars| boxed(parse_minover(name, args, vars)),
    },
    OperatorInfo {
        name: "localmin",
        aliases: &["local_min"],
        summary: "find local minima",
        usage: "[--neighborhood=<length>] [--infinity=<value>]\n\
                --neighborhood=<length> (N=) neighborhood size, forced odd (default is 3)",
        build: |name, args, vars| boxed(parse_localmin(name, args, vars)),
    },
    OperatorInfo {
        name: "localmax",
        aliases: &["local_max"],
        summary: "find local maxima",
        usage: "[--neighborhood=<length>] [--zero=<value>]\n\
                --neighborhood=<length> (N=) neighborhood size, forced odd (default is 3)",
        build: |name, args, vars| boxed(parse_localmax(name, args, vars)),
    },
    OperatorInfo {
        name: "bestmin",
        aliases: &["best_min", "bestlocalmin", "best_local_min"],
        summary: "replace each entry with the minimum value in its local window",
        usage: "[--window=<length>]",
        build: |name, args, vars| boxed(parse_bestmin(name, args, vars)),
    },
    OperatorInfo {
        name: "bestmax",
        aliases: &["best_max", "bestlocalmax", "best_local_max"],
        summary: "replace each entry with the maximum value in its local window",
        usage: "[--window=<length>]",
        build: |name, args, vars| boxed(parse_bestmax(name, args, vars)),
    },
    OperatorInfo {
        name: "minwith",
        aliases: &["min_with"],
        summary: "take the minimum of an incoming set of interval values and the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]",
        build: |name, args, vars| boxed(parse_minwith(name, args, vars)),
    },
    OperatorInfo {
        name: "maxwith",
        aliases: &["max_with"],
        summary: "take the maximum of an incoming set of interval values and the current set",
        usage: "<filename> [--value=<col>|--novalue] [--origin=one|zero] [--destroy]",
        build: |name, args, vars| boxed(parse_maxwith(name, args, vars)),
    },
    OperatorInfo {
        name: "close",
        aliases: &[],
        summary: "apply interval closure (fill small gaps between intervals)",
        usage: "<length> [--threshold=<value>] [--one=<value>] [--zero=<value>]",
        build: |name, args, vars| boxed(parse_close(name, args, vars)),
    },
    OperatorInfo {
        name: "open",
        aliases: &[],
        summary: "apply interval opening (remove small intervals)",
        usage: "<length> [--threshold=<value>] [--one=<value>] [--zero=<value>]",
        build: |name, args, vars| boxed(parse_open(name, args, vars)),
    },
    OperatorInfo {
        name: "dilate",
        aliases: &[],
        summary: "apply interval dilation (widen intervals)",
        usage: "<length>|--left=<length>|--right=<length> [--threshold=<value>]\n\
                a <length> widens by half that on each side",
        build: |name, args, vars| boxed(parse_dilate(name, args, vars)),
    },
    OperatorInfo {
        name: "erode",
        aliases: &[],
        summary: "apply interval erosion (shrink intervals)",
        usage: "<length>|--left=<length>|--right=<length> [--threshold=<value>]\n\
                a <length> narrows by half that on each side",
        build: |name, args, vars| boxed(parse_erode(name, args, vars)),
    },
    OperatorInfo {
        name: "map",
        aliases: &[],
        summary: "map values according to a piecewise-linear function",
        usage: "<filename> [--destroy]\n\
                the file holds one \"<input> <output>\" pair per line",
        build: |name, args, vars| boxed(MapOp::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "input",
        aliases: &[],
        summary: "read intervals from a file (replacing the current set)",
        usage: "<filename> [options]\n\
                --value=<col>       input intervals contain a value in this column\n\
                --novalue           input intervals have no value (value given is 1)\n\
                --missing=<value>   value for bases missing from the input (default is 0)\n\
                --overlap=sum|min|max how to combine overlapping intervals\n\
                --origin=one|zero   input intervals are origin-one or origin-zero\n\
                --destroy           delete the file after reading it",
        build: |name, args, vars| boxed(Input::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "output",
        aliases: &[],
        summary: "write the current set of intervals to a file",
        usage: "<filename> [options]\n\
                --nooutputvalue     don't write values\n\
                --precision=<n>     digits to round values to\n\
                --nocollapse        don't collapse runs of identical values\n\
                --uncovered:hide|show|NA how to write uncovered bases\n\
                --origin=one|zero   output intervals are origin-one or origin-zero",
        build: |name, args, vars| boxed(Output::parse(name, args, vars)),
    },
    OperatorInfo {
        name: "variables",
        aliases: &[],
        summary: "inspect the named variables state",
        usage: "",
        build: |name, args, vars| boxed(ShowVariables::parse(name, args, vars)),
    },
];

/// Look up an operator by name or alias.
pub fn find(name: &str) -> Option<&'static OperatorInfo> {
    OPERATORS.iter().find(|info| info.answers_to(name))
}

///
/// Build an operator from its name (or an alias) and its arguments.
///
/// The operator is constructed under its canonical name, which is what
/// appears in its messages.
///
pub fn parse_operator(name: &str, args: &[String], vars: &Variables) -> Result<Box<dyn Operator>> {
    let info = find(name).ok_or_else(|| {
        GenodspError::argument(format!("\"{}\" is not a known operation", name))
    })?;
    (info.build)(info.name, args, vars)
}

/// Write the `?` listing: each operator with its summary.
pub fn write_summaries<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "Operations (general form is = <operator> [arguments]):")?;
    for info in OPERATORS {
        writeln!(writer, "  {:<14}{}", format!("{}:", info.name), info.summary)?;
    }
    Ok(())
}
