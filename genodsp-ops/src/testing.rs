//! Shared fixtures for the operator unit tests.
use genodsp_core::operator::{Context, Operator, Target};
use genodsp_core::reader::InputSettings;
use genodsp_core::registry::ChromosomeRegistry;
use genodsp_core::scratch::ScratchPool;
use genodsp_core::variables::Variables;

/// Apply a per-chromosome operator to one array.
pub fn run_on<O: Operator>(op: &mut O, values: Vec<f64>) -> Vec<f64> {
    let mut vars = Variables::new();
    run_on_with(op, values, &mut vars)
}

pub fn run_on_with<O: Operator>(op: &mut O, mut values: Vec<f64>, vars: &mut Variables) -> Vec<f64> {
    let scratch = ScratchPool::new(values.len());
    let mut ctx = Context {
        vars,
        scratch: &scratch,
        input: InputSettings::default(),
        track: false,
    };
    op.apply(
        Target::Chromosome {
            name: "chr1",
            values: &mut values,
        },
        &mut ctx,
    )
    .unwrap();
    values
}

/// A registry holding the given chromosomes, already filled in.
pub fn registry_of(chroms: &[(&str, Vec<f64>)]) -> ChromosomeRegistry {
    let mut registry = ChromosomeRegistry::new();
    for (name, values) in chroms {
        registry.add(name, 0, values.len());
    }
    registry.allocate();
    for (name, values) in chroms {
        registry.get_mut(name).unwrap().values = values.clone();
    }
    registry
}

/// Apply a whole-genome operator.
pub fn run_genome<O: Operator>(
    op: &mut O,
    registry: &mut ChromosomeRegistry,
    vars: &mut Variables,
) -> genodsp_core::errors::Result<()> {
    let max_length = registry.max_length();
    let scratch = ScratchPool::new(max_length);
    let mut ctx = Context {
        vars,
        scratch: &scratch,
        input: InputSettings::default(),
        track: false,
    };
    op.apply(
        Target::Genome {
            registry,
            max_length,
        },
        &mut ctx,
    )
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
