use std::io::BufRead;
use std::str::FromStr;

use log::info;

use crate::errors::{GenodspError, Result};
use crate::reader::IntervalReader;
use crate::registry::ChromosomeRegistry;

/// How values from overlapping intervals combine at one base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    #[default]
    Sum,
    Min,
    Max,
}

impl FromStr for OverlapPolicy {
    type Err = GenodspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(OverlapPolicy::Sum),
            "min" | "minimum" => Ok(OverlapPolicy::Min),
            "max" | "maximum" => Ok(OverlapPolicy::Max),
            _ => Err(GenodspError::argument(format!(
                "\"{}\" is not a valid overlap operation (expected sum, min or max)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadOptions {
    /// interval starts are origin one (closed intervals)
    pub origin_one: bool,
    pub overlap: OverlapPolicy,
    /// fill every array with `missing` before reading
    pub clear: bool,
    pub missing: f64,
    pub clip_to_length: bool,
    /// log the first interval seen on each chromosome
    pub track: bool,
}

///
/// Fold a stream of intervals into the registry's dense arrays.
///
/// Intervals on chromosomes the registry doesn't know are dropped. With
/// `clear`, a base still holding the missing value is overwritten by the
/// first interval to touch it, whatever the overlap policy.
///
/// # Arguments
///
/// - registry: chromosomes to fill; must already be allocated
/// - reader: source of intervals
/// - options: origin, overlap policy, and clearing behavior
///
pub fn apply_intervals<R: BufRead>(
    registry: &mut ChromosomeRegistry,
    reader: &mut IntervalReader<R>,
    options: &ReadOptions,
) -> Result<()> {
    if options.clear {
        registry.fill(options.missing);
    }

    let mut seen: Vec<String> = Vec::new();
    while let Some(interval) = reader.next_interval()? {
        let interval = interval.shift_origin(options.origin_one);
        let Some(spec) = registry.get_mut(&interval.chrom) else {
            continue;
        };

        if options.track && !seen.contains(&interval.chrom) {
            info!("input({})", interval.chrom);
            seen.push(interval.chrom.clone());
        }

        let Some(range) = spec.place(interval.start, interval.end, options.clip_to_length)? else {
            continue;
        };

        let val = interval.value;
        let values = &mut spec.values[range];
        let untouched = |v: f64| options.clear && v == options.missing;
        match options.overlap {
            OverlapPolicy::Sum => {
                for v in values.iter_mut() {
                    if untouched(*v) {
                        *v = val;
                    } else {
                        *v += val;
                    }
                }
            }
            OverlapPolicy::Min => {
                for v in values.iter_mut() {
                    if untouched(*v) || val < *v {
                        *v = val;
                    }
                }
            }
            OverlapPolicy::Max => {
                for v in values.iter_mut() {
                    if untouched(*v) || val > *v {
                        *v = val;
                    }
                }
            }
        }
    }

    if options.track {
        info!("input(--done--)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[fixture]
    fn registry() -> ChromosomeRegistry {
        let mut registry = ChromosomeRegistry::new();
        registry.add("chr1", 0, 10);
        registry.allocate();
        registry
    }

    fn apply(registry: &mut ChromosomeRegistry, text: &str, options: ReadOptions) -> Result<()> {
        let mut reader = IntervalReader::new(Cursor::new(text.to_string()), Some(3));
        apply_intervals(registry, &mut reader, &options)
    }

    fn values(registry: &ChromosomeRegistry) -> Vec<f64> {
        registry.get("chr1").unwrap().values.clone()
    }

    #[rstest]
    fn test_sum_overlaps(mut registry: ChromosomeRegistry) {
        apply(&mut registry, "chr1\t2\t5\t3\nchr1\t4\t8\t2\n", ReadOptions::default()).unwrap();
        assert_eq!(
            values(&registry),
            vec![0.0, 0.0, 3.0, 3.0, 5.0, 2.0, 2.0, 2.0, 0.0, 0.0]
        );
    }

    #[rstest]
    fn test_origin_one_matches_origin_zero(mut registry: ChromosomeRegistry) {
        let mut other = ChromosomeRegistry::new();
        other.add("chr1", 0, 10);
        other.allocate();

        let one = ReadOptions {
            origin_one: true,
            ..Default::default()
        };
        apply(&mut registry, "chr1 1 5 4\n", one).unwrap();
        apply(&mut other, "chr1 0 5 4\n", ReadOptions::default()).unwrap();
        assert_eq!(values(&registry), values(&other));
    }

    #[rstest]
    #[case(OverlapPolicy::Min, vec![9.0, 2.0, 2.0, 7.0, 9.0])]
    #[case(OverlapPolicy::Max, vec![9.0, 7.0, 7.0, 7.0, 9.0])]
    #[case(OverlapPolicy::Sum, vec![9.0, 9.0, 9.0, 7.0, 9.0])]
    fn test_clear_overwrites_missing(#[case] overlap: OverlapPolicy, #[case] expected: Vec<f64>) {
        let mut registry = ChromosomeRegistry::new();
        registry.add("chr1", 0, 5);
        registry.allocate();

        let options = ReadOptions {
            overlap,
            clear: true,
            missing: 9.0,
            ..Default::default()
        };
        apply(&mut registry, "chr1 1 4 7\nchr1 1 3 2\n", options).unwrap();
        assert_eq!(values(&registry), expected);
    }

    #[rstest]
    fn test_unknown_chromosome_is_dropped(mut registry: ChromosomeRegistry) {
        apply(&mut registry, "chrZ 0 100 5\n", ReadOptions::default()).unwrap();
        assert_eq!(values(&registry), vec![0.0; 10]);
    }

    #[rstest]
    fn test_beyond_end(mut registry: ChromosomeRegistry) {
        let err = apply(&mut registry, "chr1 5 11 1\n", ReadOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chr1 5 11 is beyond the end of the chromosome (L=10)"
        );

        let clip = ReadOptions {
            clip_to_length: true,
            ..Default::default()
        };
        apply(&mut registry, "chr1 5 11 1\n", clip).unwrap();
        assert_eq!(values(&registry)[5..], [1.0; 5]);
    }

    #[rstest]
    fn test_offset_chromosome_clips() {
        let mut registry = ChromosomeRegistry::new();
        registry.add_inline_spec("chr1:100:105").unwrap();
        registry.allocate();
        let mut reader = IntervalReader::new(Cursor::new("chr1 90 102 1\nchr1 104 200 2\n"), Some(3));
        apply_intervals(&mut registry, &mut reader, &ReadOptions::default()).unwrap();
        assert_eq!(values(&registry), vec![1.0, 1.0, 0.0, 0.0, 2.0]);
    }

    #[rstest]
    #[case("sum", OverlapPolicy::Sum)]
    #[case("minimum", OverlapPolicy::Min)]
    #[case("max", OverlapPolicy::Max)]
    fn test_overlap_policy_from_str(#[case] text: &str, #[case] expected: OverlapPolicy) {
        assert_eq!(text.parse::<OverlapPolicy>().unwrap(), expected);
    }
}
