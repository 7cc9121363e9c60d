///
/// One record from an interval stream: zero-based, half-open, with a value.
///
/// Intervals are never stored; they are produced by the reader and consumed
/// right away by whatever is filling or combining the dense arrays.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub value: f64,
}

impl Interval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, value: f64) -> Self {
        Interval {
            chrom: chrom.into(),
            start,
            end,
            value,
        }
    }

    ///
    /// Convert a start coordinate given with origin one (closed) to origin zero.
    ///
    pub fn shift_origin(mut self, origin_one: bool) -> Self {
        if origin_one {
            self.start = self.start.saturating_sub(1);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_shift_origin() {
        let iv = Interval::new("chr1", 1, 5, 2.0).shift_origin(true);
        assert_eq!(iv, Interval::new("chr1", 0, 5, 2.0));

        let iv = Interval::new("chr1", 1, 5, 2.0).shift_origin(false);
        assert_eq!(iv.start, 1);
    }
}
