use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::errors::Result;
use crate::operator::{Context, Operator, Scope, Target};
use crate::reader::InputSettings;
use crate::registry::ChromosomeRegistry;
use crate::scratch::ScratchPool;
use crate::variables::Variables;

///
/// The ordered list of operators given on the command line.
///
/// Consecutive per-chromosome operators are batched: the whole batch runs on
/// one chromosome (longest first) before moving to the next. A whole-genome
/// operator then runs once, on everything.
///
#[derive(Default)]
pub struct Pipeline {
    ops: Vec<Box<dyn Operator>>,
    track: bool,
    progress_bar: bool,
}

impl Pipeline {
    pub fn new(ops: Vec<Box<dyn Operator>>) -> Self {
        Pipeline {
            ops,
            track: false,
            progress_bar: false,
        }
    }

    /// Log each operator application, `op(chrom)` or `op(*)`.
    pub fn with_tracking(mut self, track: bool) -> Self {
        self.track = track;
        self
    }

    /// Show a progress bar over the pipeline's steps.
    pub fn with_progress_bar(mut self, progress_bar: bool) -> Self {
        self.progress_bar = progress_bar;
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Name of the first operator, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.ops.first().map(|op| op.name())
    }

    pub fn names(&self) -> Vec<&str> {
        self.ops.iter().map(|op| op.name()).collect()
    }

    fn make_bar(&self, registry: &ChromosomeRegistry) -> ProgressBar {
        if !self.progress_bar {
            return ProgressBar::hidden();
        }

        let steps: usize = self
            .ops
            .iter()
            .map(|op| match op.scope() {
                Scope::PerChromosome => registry.len(),
                Scope::WholeGenome => 1,
            })
            .sum();
        let bar = ProgressBar::new(steps as u64);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar
    }

    ///
    /// Apply every operator to the registry's arrays.
    ///
    /// # Arguments
    ///
    /// - registry: chromosomes to operate on; must already be allocated
    /// - vars: named variables, read and written by operators
    /// - input: settings for operators that read interval files
    ///
    pub fn run(
        &mut self,
        registry: &mut ChromosomeRegistry,
        vars: &mut Variables,
        input: InputSettings,
    ) -> Result<()> {
        let max_length = registry.max_length();
        let scratch = ScratchPool::new(max_length);
        let mut ctx = Context {
            vars,
            scratch: &scratch,
            input,
            track: self.track,
        };
        let bar = self.make_bar(registry);
        let order = registry.by_length().to_vec();

        let mut first = 0;
        while first < self.ops.len() {
            let stop = self.ops[first..]
                .iter()
                .position(|op| op.scope() == Scope::WholeGenome)
                .map_or(self.ops.len(), |offset| first + offset);

            if stop > first {
                for &chrom_ix in &order {
                    let spec = registry.spec_mut(chrom_ix);
                    for op in self.ops[first..stop].iter_mut() {
                        if self.track {
                            info!("{}({})", op.name(), spec.name);
                        }
                        bar.set_message(format!("{}({})", op.name(), spec.name));
                        let target = Target::Chromosome {
                            name: &spec.name,
                            values: &mut spec.values,
                        };
                        op.apply(target, &mut ctx)?;
                        bar.inc(1);
                    }
                }
            }

            if stop < self.ops.len() {
                let op = &mut self.ops[stop];
                if self.track {
                    info!("{}(*)", op.name());
                }
                bar.set_message(format!("{}(*)", op.name()));
                let target = Target::Genome {
                    registry: &mut *registry,
                    max_length,
                };
                op.apply(target, &mut ctx)?;
                bar.inc(1);
            }
            first = stop + 1;
        }

        bar.finish_and_clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        scope: Scope,
        log: Log,
    }

    impl Operator for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn scope(&self) -> Scope {
            self.scope
        }

        fn apply(&mut self, target: Target<'_>, ctx: &mut Context<'_>) -> Result<()> {
            let entry = match target {
                Target::Chromosome { name, values } => {
                    values[0] += 1.0;
                    format!("{}({})", self.name, name)
                }
                Target::Genome { max_length, .. } => {
                    ctx.vars.set(self.name, max_length as f64);
                    format!("{}(*)", self.name)
                }
            };
            self.log.borrow_mut().push(entry);
            Ok(())
        }
    }

    fn recorder(name: &'static str, scope: Scope, log: &Log) -> Box<dyn Operator> {
        Box::new(Recorder {
            name,
            scope,
            log: Rc::clone(log),
        })
    }

    #[fixture]
    fn registry() -> ChromosomeRegistry {
        let mut registry = ChromosomeRegistry::new();
        registry.add("chrS", 0, 5);
        registry.add("chrL", 0, 20);
        registry.allocate();
        registry
    }

    #[rstest]
    fn test_batches_per_chromosome_runs(mut registry: ChromosomeRegistry) {
        let log: Log = Rc::default();
        let mut pipeline = Pipeline::new(vec![
            recorder("a", Scope::PerChromosome, &log),
            recorder("b", Scope::PerChromosome, &log),
            recorder("g", Scope::WholeGenome, &log),
            recorder("c", Scope::PerChromosome, &log),
        ]);
        let mut vars = Variables::new();
        pipeline
            .run(&mut registry, &mut vars, InputSettings::default())
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "a(chrL)", "b(chrL)", "a(chrS)", "b(chrS)", "g(*)", "c(chrL)", "c(chrS)",
            ]
        );
        assert_eq!(vars.get("g"), Some(20.0));
        assert_eq!(registry.get("chrS").unwrap().values[0], 3.0);
    }

    #[rstest]
    fn test_leading_whole_genome(mut registry: ChromosomeRegistry) {
        let log: Log = Rc::default();
        let mut pipeline = Pipeline::new(vec![
            recorder("g", Scope::WholeGenome, &log),
            recorder("h", Scope::WholeGenome, &log),
        ]);
        assert_eq!(pipeline.first_name(), Some("g"));
        pipeline
            .run(&mut registry, &mut Variables::new(), InputSettings::default())
            .unwrap();
        assert_eq!(*log.borrow(), vec!["g(*)", "h(*)"]);
    }
}
