//! Table-in, table-out job shared by the submission binaries

use crate::client::ChainClient;
use crate::config::FileConfig;
use crate::report::{summarize, ResultTable, Summary};
use crate::runner::Runner;
use crate::sheet::{collect_rows, ColumnLayout, CsvRowSource};
use eyre::{Context, Result};
use tracing::info;

/// Read rows, submit them, write the result table
#[derive(Debug, Clone)]
pub struct SheetJob {
    pub files: FileConfig,
    /// Leading rows kept as metadata
    pub skip_rows: usize,
    pub layout: ColumnLayout,
}

impl SheetJob {
    pub fn new(files: FileConfig, skip_rows: usize, layout: ColumnLayout) -> Self {
        Self {
            files,
            skip_rows,
            layout,
        }
    }

    pub async fn run<C: ChainClient>(&self, runner: &Runner<C>) -> Result<Summary> {
        let input = self.files.input.display().to_string();
        let mut source = CsvRowSource::open(&self.files.input, self.skip_rows)?;
        let rows =
            collect_rows(&mut source).with_context(|| format!("Nothing to do in {}", input))?;
        info!(input = %input, rows = rows.len(), "Loaded rows");

        let outcomes = runner.run(self.layout.parse_all(&rows)).await?;

        let width = rows.iter().map(|row| row.cells.len()).max().unwrap_or_default();
        let mut table = ResultTable::for_outcomes(source.metadata().to_vec(), width);
        for (row, outcome) in rows.iter().zip(&outcomes) {
            table.push_outcome(row, outcome);
        }
        table.write_csv(&self.files.output)?;
        info!(output = %self.files.output.display(), "Results written");

        Ok(summarize(&outcomes))
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // a second install (tests) is harmless
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
