use std::io::Write;

use fxhash::FxHashMap;

use crate::errors::Result;

///
/// Named scalar values shared between the operators of a pipeline.
///
/// An operator can only read what an earlier operator (or the command line)
/// has set, since operators run strictly in pipeline order.
///
#[derive(Debug, Default, Clone)]
pub struct Variables {
    names: Vec<String>,
    values: FxHashMap<String, f64>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, creating it if needed.
    pub fn set(&mut self, name: &str, value: f64) {
        if self.values.insert(name.to_string(), value).is_none() {
            self.names.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    ///
    /// Write every variable, one per line, in the order they were created.
    ///
    /// Names are right-aligned to the longest name (at most 20 columns).
    ///
    pub fn report<W: Write>(&self, writer: &mut W, indent: &str) -> Result<()> {
        let width = self
            .names
            .iter()
            .map(|name| name.len())
            .max()
            .unwrap_or(1)
            .clamp(1, 20);

        for name in &self.names {
            writeln!(
                writer,
                "{}{:>width$} = {:.6}",
                indent,
                name,
                self.values[name],
                width = width
            )?;
        }
        Ok(())
    }
}
