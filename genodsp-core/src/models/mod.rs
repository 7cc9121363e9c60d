pub mod chrom_spec;
pub mod interval;

// re-export for cleaner imports
pub use self::chrom_spec::ChromosomeSpec;
pub use self::interval::Interval;
