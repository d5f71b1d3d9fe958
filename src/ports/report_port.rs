//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::batch::TickerRun;
use crate::domain::error::BacktestError;

/// Port for writing the per-ticker equity chart.
pub trait ReportPort {
    /// Write the chart for one ticker into `output_dir` and return its path.
    fn write_ticker(&self, run: &TickerRun, output_dir: &Path) -> Result<PathBuf, BacktestError>;
}
