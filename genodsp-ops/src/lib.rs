//! # genodsp-ops
//!
//! Every operator a genodsp pipeline can run, and the [`catalog`] that maps
//! operator names (and their aliases) to constructors.
//!
//! ```no_run
//! use genodsp_core::variables::Variables;
//! use genodsp_ops::catalog::parse_operator;
//!
//! let args = vec!["T=5".to_string(), "L=1K".to_string()];
//! let op = parse_operator("clump", &args, &Variables::new()).unwrap();
//! assert_eq!(op.name(), "clump");
//! ```

pub mod args;
pub mod arith;
pub mod catalog;
pub mod clump;
pub mod io;
pub mod logical;
pub mod map;
pub mod mask;
pub mod minmax;
pub mod morphology;
pub mod multiply;
pub mod percentile;
pub mod source;
pub mod sum;
pub mod walk;

#[cfg(test)]
mod testing;

// re-exports
pub use catalog::{OPERATORS, find, parse_operator};
