use std::ops::Range;

use crate::errors::{GenodspError, Result};

///
/// One chromosome's dense signal: a value per base, from `start` to
/// `start + length`.
///
/// `start` lets a spec skip an uninteresting leading stretch of the
/// chromosome; positions below it are not represented at all.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeSpec {
    pub name: String,
    /// position (origin zero) of the first base held in `values`
    pub start: u64,
    pub length: usize,
    pub values: Vec<f64>,
}

impl ChromosomeSpec {
    ///
    /// Create a spec whose values are not yet allocated.
    ///
    pub fn new(name: impl Into<String>, start: u64, length: usize) -> Self {
        ChromosomeSpec {
            name: name.into(),
            start,
            length,
            values: Vec::new(),
        }
    }

    ///
    /// Allocate the value array, zero filled.
    ///
    pub fn allocate(&mut self) {
        self.values = vec![0.0; self.length];
    }

    /// Position (origin zero, exclusive) just past the last base of the array.
    pub fn end(&self) -> u64 {
        self.start + self.length as u64
    }

    ///
    /// Translate an interval (origin zero, half open) into an index range of
    /// `values`.
    ///
    /// Returns `Ok(None)` when nothing of the interval lands in the array. An
    /// interval running past the end of a chromosome that begins at position
    /// zero is an error unless `clip` is set, in which case it is truncated.
    ///
    /// # Arguments
    ///
    /// - start: first position of the interval
    /// - end: position just past the interval
    /// - clip: clamp the interval to the array before checking it
    ///
    pub fn place(&self, start: u64, end: u64, clip: bool) -> Result<Option<Range<usize>>> {
        let (start, end) = if clip {
            let top = self.end();
            (start.min(top), end.min(top))
        } else {
            (start, end)
        };

        if self.start == 0 && end > self.length as u64 {
            return Err(GenodspError::domain(format!(
                "{} {} {} is beyond the end of the chromosome (L={})",
                self.name, start, end, self.length
            )));
        }

        if end <= self.start {
            return Ok(None);
        }

        let lo = start.saturating_sub(self.start);
        let hi = (end - self.start).min(self.length as u64);
        if lo >= hi {
            return Ok(None);
        }

        Ok(Some(lo as usize..hi as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn whole() -> ChromosomeSpec {
        ChromosomeSpec::new("chr1", 0, 10)
    }

    #[fixture]
    fn offset() -> ChromosomeSpec {
        ChromosomeSpec::new("chr2", 100, 50)
    }

    #[rstest]
    fn test_place_inside(whole: ChromosomeSpec) {
        assert_eq!(whole.place(2, 5, false).unwrap(), Some(2..5));
        assert_eq!(whole.place(0, 10, false).unwrap(), Some(0..10));
    }

    #[rstest]
    fn test_place_beyond_end_is_error(whole: ChromosomeSpec) {
        let err = whole.place(8, 12, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chr1 8 12 is beyond the end of the chromosome (L=10)"
        );
    }

    #[rstest]
    fn test_place_beyond_end_clipped(whole: ChromosomeSpec) {
        assert_eq!(whole.place(8, 12, true).unwrap(), Some(8..10));
        assert_eq!(whole.place(12, 15, true).unwrap(), None);
    }

    #[rstest]
    #[case(10, 90, None)]
    #[case(10, 100, None)]
    #[case(90, 110, Some(0..10))]
    #[case(120, 200, Some(20..50))]
    #[case(160, 200, None)]
    fn test_place_with_offset(
        offset: ChromosomeSpec,
        #[case] start: u64,
        #[case] end: u64,
        #[case] expected: Option<Range<usize>>,
    ) {
        assert_eq!(offset.place(start, end, false).unwrap(), expected);
    }

    #[rstest]
    fn test_place_empty_interval(whole: ChromosomeSpec) {
        assert_eq!(whole.place(4, 4, false).unwrap(), None);
    }
}
