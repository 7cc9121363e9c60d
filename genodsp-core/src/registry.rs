//! The set of chromosomes a pipeline works on.
//!
//! Chromosomes come from inline specs on the command line (`chr1:1000` or
//! `chr1:500:1000`) and from a lengths file. Only chromosomes named here get a
//! dense array; intervals on anything else are quietly ignored.
use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;

use crate::errors::{GenodspError, Result};
use crate::models::ChromosomeSpec;
use crate::reader::{MAX_LINE_LENGTH, read_trimmed_line};
use crate::utils::{get_dynamic_reader, parse_unsigned};

#[derive(Debug, Default)]
pub struct ChromosomeRegistry {
    specs: Vec<ChromosomeSpec>,
    index: FxHashMap<String, usize>,
    by_length: Vec<usize>,
    max_length: usize,
}

impl ChromosomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Add a chromosome.
    ///
    /// A zero length is accepted but nothing is recorded. Returns `false` if
    /// the name is already registered.
    ///
    pub fn add(&mut self, name: &str, start: u64, length: usize) -> bool {
        if length == 0 {
            return true;
        }
        if self.index.contains_key(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.specs.len());
        self.specs.push(ChromosomeSpec::new(name, start, length));
        true
    }

    ///
    /// Add a chromosome from an inline spec, `chrom:length` or
    /// `chrom:start:end`.
    ///
    /// Start and end are origin zero, half open, regardless of the origin
    /// the intervals use.
    ///
    pub fn add_inline_spec(&mut self, arg: &str) -> Result<()> {
        let mut fields = arg.splitn(3, ':');
        let name = fields.next().unwrap_or_default();
        let (start, length) = match (fields.next(), fields.next()) {
            (Some(len), None) => (0, parse_unsigned(len)?),
            (Some(start), Some(end)) => {
                let start = parse_unsigned(start)?;
                let end = parse_unsigned(end)?;
                (start, end.saturating_sub(start))
            }
            _ => {
                return Err(GenodspError::argument(format!(
                    "\"{}\" contains no chromosome length\n(expected \"chromosome:length\" or \"chromosome:start:end\")",
                    arg
                )));
            }
        };

        if !self.add(name, start, length as usize) {
            return Err(GenodspError::argument(format!(
                "can't specify {} more than once",
                name
            )));
        }
        Ok(())
    }

    ///
    /// Add every chromosome listed in a lengths file.
    ///
    /// # Arguments
    ///
    /// - path: file of `chrom length` lines, possibly gzipped
    ///
    pub fn read_lengths_file(&mut self, path: &Path) -> Result<()> {
        let mut reader = get_dynamic_reader(path)?;
        self.read_lengths(&mut reader)
    }

    pub fn read_lengths<R: BufRead>(&mut self, reader: &mut R) -> Result<()> {
        let lengths_error = |line: usize, message: String| GenodspError::LengthsFormat { line, message };

        let mut line = String::new();
        let mut line_number = 0;
        while read_trimmed_line(reader, &mut line)? {
            line_number += 1;
            if line.len() > MAX_LINE_LENGTH {
                return Err(lengths_error(
                    line_number,
                    "line is longer than internal buffer".to_string(),
                ));
            }

            let text = line.trim_start();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            if text.len() != line.len() {
                return Err(lengths_error(
                    line_number,
                    "line contains no chromosome or begins with whitespace".to_string(),
                ));
            }

            let mut fields = text.split_whitespace();
            let chrom = fields.next().unwrap_or_default();
            let length = match fields.next() {
                Some(field) => parse_unsigned(field)?,
                None => {
                    return Err(lengths_error(
                        line_number,
                        "line contains no chromosome length".to_string(),
                    ));
                }
            };

            if !self.add(chrom, 0, length as usize) {
                return Err(lengths_error(
                    line_number,
                    format!("chromosome \"{}\" appears more than once", chrom),
                ));
            }
        }
        Ok(())
    }

    ///
    /// Allocate the value arrays and fix the processing order.
    ///
    /// Must be called once, after every chromosome has been added.
    ///
    pub fn allocate(&mut self) {
        let mut order: Vec<usize> = (0..self.specs.len()).collect();
        // stable, so equal lengths keep their input order
        order.sort_by(|&a, &b| self.specs[b].length.cmp(&self.specs[a].length));
        self.by_length = order;

        self.max_length = self.specs.iter().map(|s| s.length).max().unwrap_or(0);
        for spec in self.specs.iter_mut() {
            spec.allocate();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Length of the longest chromosome (valid after `allocate`).
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn get(&self, name: &str) -> Option<&ChromosomeSpec> {
        self.index.get(name).map(|&ix| &self.specs[ix])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ChromosomeSpec> {
        self.index.get(name).map(|&ix| &mut self.specs[ix])
    }

    /// Chromosomes in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &ChromosomeSpec> {
        self.specs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChromosomeSpec> {
        self.specs.iter_mut()
    }

    /// Indexes of the chromosomes, longest first.
    pub fn by_length(&self) -> &[usize] {
        &self.by_length
    }

    pub fn spec_mut(&mut self, ix: usize) -> &mut ChromosomeSpec {
        &mut self.specs[ix]
    }

    ///
    /// Set every base of every chromosome to one value.
    ///
    pub fn fill(&mut self, value: f64) {
        for spec in self.specs.iter_mut() {
            spec.values.fill(value);
        }
    }
}
