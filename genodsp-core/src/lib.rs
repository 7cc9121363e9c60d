//! # genodsp-core
//!
//! Dense, per-base numeric signals over a genome, and the machinery to fill
//! them from interval files, run a pipeline of operators over them, and write
//! them back out as intervals.
//!
//! - [`registry::ChromosomeRegistry`] owns one array of `f64` per chromosome
//! - [`reader::IntervalReader`] and [`aggregate::apply_intervals`] turn
//!   `chrom start end value` records into array values
//! - [`pipeline::Pipeline`] schedules [`operator::Operator`]s
//! - [`report::report_intervals`] collapses arrays back into records
//!
//! # Example
//!
//! ```no_run
//! use std::io::Cursor;
//! use genodsp_core::aggregate::{apply_intervals, ReadOptions};
//! use genodsp_core::reader::IntervalReader;
//! use genodsp_core::registry::ChromosomeRegistry;
//! use genodsp_core::report::{report_intervals, ReportOptions};
//!
//! let mut registry = ChromosomeRegistry::new();
//! registry.add_inline_spec("chr1:10").unwrap();
//! registry.allocate();
//!
//! let mut reader = IntervalReader::new(Cursor::new("chr1 2 5 3\n"), Some(3));
//! apply_intervals(&mut registry, &mut reader, &ReadOptions::default()).unwrap();
//! report_intervals(&registry, &mut std::io::stdout(), &ReportOptions::default()).unwrap();
//! ```

pub mod aggregate;
pub mod errors;
pub mod models;
pub mod operator;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod report;
pub mod scratch;
pub mod utils;
pub mod variables;

// re-exports
pub use errors::{GenodspError, Result};
pub use operator::{Context, Operator, Scope, Target};
pub use registry::ChromosomeRegistry;
pub use variables::Variables;
