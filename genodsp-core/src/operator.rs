//! The interface every pipeline operator implements.
use crate::errors::{GenodspError, Result};
use crate::reader::InputSettings;
use crate::registry::ChromosomeRegistry;
use crate::scratch::ScratchPool;
use crate::variables::Variables;

/// What an operator needs to see at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// transforms each chromosome's array on its own
    PerChromosome,
    /// needs every chromosome at the same time
    WholeGenome,
}

/// The data handed to one `apply` call.
pub enum Target<'a> {
    Chromosome {
        name: &'a str,
        values: &'a mut [f64],
    },
    Genome {
        registry: &'a mut ChromosomeRegistry,
        max_length: usize,
    },
}

impl<'a> Target<'a> {
    ///
    /// Unwrap a single chromosome target.
    ///
    pub fn into_chromosome(self, op: &str) -> Result<(&'a str, &'a mut [f64])> {
        match self {
            Target::Chromosome { name, values } => Ok((name, values)),
            Target::Genome { .. } => Err(GenodspError::domain(format!(
                "[{}] expected a single chromosome but was given the whole genome",
                op
            ))),
        }
    }

    ///
    /// Unwrap a whole-genome target.
    ///
    pub fn into_genome(self, op: &str) -> Result<&'a mut ChromosomeRegistry> {
        match self {
            Target::Genome { registry, .. } => Ok(registry),
            Target::Chromosome { name, .. } => Err(GenodspError::domain(format!(
                "[{}] expected the whole genome but was given {}",
                op, name
            ))),
        }
    }
}

/// Run-wide state passed to every operator.
pub struct Context<'a> {
    pub vars: &'a mut Variables,
    pub scratch: &'a ScratchPool,
    /// settings used by operators that read interval files
    pub input: InputSettings,
    /// operation tracking is on
    pub track: bool,
}

///
/// One step of a pipeline.
///
/// Operators are built from their command line arguments before anything
/// runs, so argument problems surface before any data is read. Each is then
/// applied once (whole genome) or once per chromosome.
///
pub trait Operator {
    fn name(&self) -> &str;

    fn scope(&self) -> Scope;

    fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()>;
}
