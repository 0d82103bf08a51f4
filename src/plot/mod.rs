//! Instruction log comparison: count mnemonics of a baseline and an optimized run
//! and render counts as a horizontal bar chart.

mod chart;
mod tally;
mod trace;

pub use chart::{find_font, load_font, render, ChartStyle, FONT_CANDIDATES};
pub use tally::{Comparison, Row, Tally};
pub use trace::{mnemonic, read_trace, tally_trace};

use crate::config::PlotConfig;
use crate::st_info;
use itertools::Itertools;
use log::warn;
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read instruction log {}: {1}", .0.display())]
    Read(PathBuf, std::io::Error),
    #[error("{}:{line}: no mnemonic in entry `{content}`", .path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("load font {}: {1}", .0.display())]
    Font(PathBuf, String),
    #[error("no font found, set one explicitly, tried: {}", display_paths(.0))]
    FontNotFound(Vec<PathBuf>),
    #[error("chart rendering: {0}")]
    Render(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display()).join(", ")
}

/// Compared run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Series {
    Baseline,
    Optimized,
}

/// Count mnemonics of both instruction logs.
pub fn compare(baseline_path: &Path, optimized_path: &Path) -> Result<Comparison, Error> {
    let baseline = read_trace(baseline_path)?;
    let optimized = read_trace(optimized_path)?;
    for (path, tally) in [(baseline_path, &baseline), (optimized_path, &optimized)] {
        if tally.is_empty() {
            warn!(target: "plot", "instruction log {} is empty", path.display());
        }
    }
    Ok(Comparison::new(&baseline, &optimized))
}

/// Read both instruction logs from config and render a comparison chart.
/// Nothing is written if any of logs can't be read.
pub fn plot(cfg: &PlotConfig) -> Result<Comparison, Error> {
    let comparison = compare(&cfg.baseline, &cfg.optimized)?;
    st_info!(
        target: "plot",
        "{} distinct mnemonics in {} and {}",
        comparison.rows().len(),
        cfg.baseline.display(),
        cfg.optimized.display()
    );

    load_font(&find_font(cfg.font.as_deref())?)?;
    render(&comparison, &cfg.output, &ChartStyle::from(cfg))?;
    st_info!(target: "plot", "chart saved into {}", cfg.output.display());

    Ok(comparison)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_compare_files() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("baseline.txt");
        let optimized = dir.path().join("optimized.txt");
        fs::write(
            &baseline,
            "0x1 mov %rsp, %rbp\n0x2 mov %rdi, %rax\n0x3 add $1, %rax\n",
        )
        .unwrap();
        fs::write(
            &optimized,
            "0x1 mov %rdi, %rax\n0x2 add $1, %rax\n0x3 add $2, %rax\n0x4 ret\n",
        )
        .unwrap();

        let cmp = compare(&baseline, &optimized).unwrap();
        let rows: Vec<_> = cmp
            .rows()
            .iter()
            .map(|r| (r.mnemonic.as_str(), r.baseline, r.optimized))
            .collect();
        assert_eq!(rows, vec![("mov", 2, 1), ("add", 1, 2), ("ret", 0, 1)]);

        // inputs are unchanged, counts too
        assert_eq!(compare(&baseline, &optimized).unwrap(), cmp);
    }

    #[test]
    fn test_compare_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("baseline.txt");
        let optimized = dir.path().join("optimized.txt");
        fs::write(&baseline, "").unwrap();
        fs::write(&optimized, "0x1 ret\n").unwrap();

        let cmp = compare(&baseline, &optimized).unwrap();
        assert_eq!(cmp.rows().len(), 1);
        assert_eq!(cmp.rows()[0].count(Series::Baseline), 0);
        assert_eq!(cmp.rows()[0].count(Series::Optimized), 1);
    }

    #[test]
    fn test_plot_without_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PlotConfig {
            baseline: dir.path().join("missing_baseline.txt"),
            optimized: dir.path().join("missing_optimized.txt"),
            output: dir.path().join("chart.png"),
            ..PlotConfig::default()
        };

        assert!(matches!(plot(&cfg), Err(Error::Read(_, _))));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn test_series_names() {
        assert_eq!(Series::Baseline.as_ref(), "baseline");
        assert_eq!(Series::Optimized.to_string(), "optimized");
    }
}
