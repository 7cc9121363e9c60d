//! Walking a sorted interval file alongside the chromosome arrays.
//!
//! Several operators treat the file as a partition of each chromosome into
//! covered intervals and uncovered gaps. For that the intervals on a
//! chromosome must be contiguous in the file and sorted, without overlaps.
use fxhash::FxHashSet;
use log::{debug, info};

use genodsp_core::errors::{GenodspError, Result};
use genodsp_core::operator::Context;
use genodsp_core::registry::ChromosomeRegistry;

use crate::source::IntervalSource;

pub trait WalkVisitor {
    /// Called for each stretch of a chromosome not covered by any interval.
    fn gap(&mut self, values: &mut [f64]);

    /// Called for each interval, with the array slice it covers.
    fn interval(&mut self, values: &mut [f64], value: f64);
}

///
/// Walk the file's intervals in order, visiting every base of every
/// chromosome exactly once, as part of either a gap or an interval.
///
/// Chromosomes missing from the file are one long gap. Intervals with value
/// zero count as absent.
///
/// # Arguments
///
/// - op: operator name, for messages
/// - source: the interval file
/// - registry: chromosomes to walk
/// - ctx: run context (input settings and tracking)
/// - debug_walk: log each gap and interval
/// - visitor: what to do with gaps and intervals
///
pub fn walk_sorted<V: WalkVisitor>(
    op: &str,
    source: &IntervalSource,
    registry: &mut ChromosomeRegistry,
    ctx: &Context<'_>,
    debug_walk: bool,
    visitor: &mut V,
) -> Result<()> {
    let mut reader = source.open(ctx.input)?;
    let mut finished: FxHashSet<String> = FxHashSet::default();
    // chromosome being walked, and the end of its last interval
    let mut current: Option<(String, usize)> = None;

    let close_out = |registry: &mut ChromosomeRegistry,
                     visitor: &mut V,
                     chrom: &str,
                     prev_end: usize| {
        if let Some(spec) = registry.get_mut(chrom) {
            if prev_end < spec.length {
                if debug_walk {
                    debug!("[{}] gap {} {}..{}", op, chrom, prev_end, spec.length);
                }
                visitor.gap(&mut spec.values[prev_end..]);
            }
        }
    };

    while let Some(interval) = reader.next_interval()? {
        if interval.value == 0.0 {
            continue;
        }
        let interval = interval.shift_origin(source.origin_one);

        let switching = current
            .as_ref()
            .is_none_or(|(chrom, _)| *chrom != interval.chrom);
        if switching {
            if let Some((chrom, prev_end)) = current.take() {
                close_out(registry, visitor, &chrom, prev_end);
                finished.insert(chrom);
            }
            if registry.get(&interval.chrom).is_none() {
                continue;
            }
            if finished.contains(&interval.chrom) {
                return Err(GenodspError::domain(format!(
                    "[{}] in \"{}\", not all intervals on {} are together ({}..{} begins new group)",
                    op,
                    source.filename(),
                    interval.chrom,
                    interval.start,
                    interval.end
                )));
            }
            if ctx.track {
                info!("{}({})", op, interval.chrom);
            }
            current = Some((interval.chrom.clone(), 0));
        }

        let Some((chrom, prev_end)) = current.as_mut() else {
            continue;
        };
        let Some(spec) = registry.get_mut(chrom) else {
            continue;
        };
        let placed = spec
            .place(interval.start, interval.end, false)
            .map_err(|e| source.in_file(op, e))?;
        let Some(range) = placed else {
            continue;
        };

        if range.start < *prev_end {
            return Err(GenodspError::domain(format!(
                "[{}] in \"{}\", intervals on {} are not sorted ({}..{} after {})",
                op,
                source.filename(),
                chrom,
                interval.start,
                interval.end,
                spec.start + *prev_end as u64
            )));
        }

        if range.start > *prev_end {
            if debug_walk {
                debug!("[{}] gap {} {}..{}", op, chrom, prev_end, range.start);
            }
            visitor.gap(&mut spec.values[*prev_end..range.start]);
        }
        if debug_walk {
            debug!(
                "[{}] interval {} {}..{} value {:.6}",
                op, chrom, range.start, range.end, interval.value
            );
        }
        *prev_end = range.end;
        visitor.interval(&mut spec.values[range], interval.value);
    }

    if let Some((chrom, prev_end)) = current.take() {
        close_out(registry, visitor, &chrom, prev_end);
        finished.insert(chrom);
    }

    for spec in registry.iter_mut() {
        if finished.contains(&spec.name) {
            continue;
        }
        if ctx.track {
            info!("{}({},absent)", op, spec.name);
        }
        if debug_walk {
            debug!("[{}] gap (all of) {}", op, spec.name);
        }
        visitor.gap(&mut spec.values);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use genodsp_core::reader::InputSettings;
    use genodsp_core::scratch::ScratchPool;
    use genodsp_core::variables::Variables;

    /// Writes -1 into gaps and the interval value into intervals.
    struct Painter;

    impl WalkVisitor for Painter {
        fn gap(&mut self, values: &mut [f64]) {
            values.fill(-1.0);
        }

        fn interval(&mut self, values: &mut [f64], value: f64) {
            values.fill(value);
        }
    }

    fn walk(text: &str) -> Result<ChromosomeRegistry> {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();

        let mut registry = ChromosomeRegistry::new();
        registry.add("chr1", 0, 8);
        registry.add("chr2", 0, 3);
        registry.allocate();

        let mut vars = Variables::new();
        let mut source = IntervalSource::with_values(&vars);
        source.accept("test", file.path().to_str().unwrap())?;
        let scratch = ScratchPool::new(8);
        let ctx = Context {
            vars: &mut vars,
            scratch: &scratch,
            input: InputSettings::default(),
            track: false,
        };
        walk_sorted("test", &source, &mut registry, &ctx, false, &mut Painter)?;
        Ok(registry)
    }

    #[rstest]
    fn test_walk_paints_gaps_and_intervals() {
        let registry = walk("chr1 1 3 5\nchr1 3 4 0\nchr1 5 6 7\nchrUn 0 9 1\n").unwrap();
        assert_eq!(
            registry.get("chr1").unwrap().values,
            vec![-1.0, 5.0, 5.0, -1.0, -1.0, 7.0, -1.0, -1.0]
        );
        assert_eq!(registry.get("chr2").unwrap().values, vec![-1.0; 3]);
    }

    #[rstest]
    fn test_walk_rejects_regrouped_chromosome() {
        let err = walk("chr1 1 3 5\nchr2 0 1 1\nchr1 5 6 7\n").unwrap_err();
        assert!(err.to_string().ends_with(
            "not all intervals on chr1 are together (5..6 begins new group)"
        ));
    }

    #[rstest]
    fn test_walk_rejects_unsorted() {
        let err = walk("chr1 4 6 5\nchr1 2 3 1\n").unwrap_err();
        assert!(err
            .to_string()
            .ends_with("intervals on chr1 are not sorted (2..3 after 6)"));
    }
}
