use crate::plot::Series;
use indexmap::IndexMap;
use itertools::Itertools;

/// Mnemonic occurrence counts of a single run, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally(IndexMap<String, usize>);

impl Tally {
    pub fn add(&mut self, mnemonic: &str) {
        match self.0.get_mut(mnemonic) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(mnemonic.to_string(), 1);
            }
        }
    }

    /// Return occurrence count of a mnemonic, zero for unseen mnemonics.
    pub fn count(&self, mnemonic: &str) -> usize {
        self.0.get(mnemonic).copied().unwrap_or_default()
    }

    /// Return count of all instructions.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Return count of distinct mnemonics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(m, c)| (m.as_str(), *c))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tally {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut tally = Tally::default();
        iter.into_iter().for_each(|m| tally.add(m.as_ref()));
        tally
    }
}

/// Counts of one mnemonic in both runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub mnemonic: String,
    pub baseline: usize,
    pub optimized: usize,
}

impl Row {
    pub fn count(&self, series: Series) -> usize {
        match series {
            Series::Baseline => self.baseline,
            Series::Optimized => self.optimized,
        }
    }

    pub fn total(&self) -> usize {
        self.baseline + self.optimized
    }
}

/// Per mnemonic comparison of two runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    rows: Vec<Row>,
}

impl Comparison {
    /// Join two tallies. Rows are ordered by combined count (most frequent first), mnemonics
    /// with equal counts keep order of first appearance (baseline first).
    pub fn new(baseline: &Tally, optimized: &Tally) -> Self {
        let mut combined: IndexMap<&str, usize> = IndexMap::new();
        for (mnemonic, count) in baseline.iter().chain(optimized.iter()) {
            *combined.entry(mnemonic).or_default() += count;
        }

        let rows = combined
            .into_iter()
            .sorted_by(|(_, c1), (_, c2)| c2.cmp(c1))
            .map(|(mnemonic, _)| Row {
                mnemonic: mnemonic.to_string(),
                baseline: baseline.count(mnemonic),
                optimized: optimized.count(mnemonic),
            })
            .collect();

        Self { rows }
    }

    /// Rows, most frequent mnemonic first.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows in drawing order (bottom to top), so most frequent mnemonic is drawn at the top.
    pub fn plot_order(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().rev()
    }

    /// Return the largest single bar value.
    pub fn max_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.baseline.max(r.optimized))
            .max()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
