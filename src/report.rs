//! Result table written once at the end of a run

use crate::sheet::SheetRow;
use crate::types::{OutcomeKind, TransactionOutcome};
use csv::WriterBuilder;
use eyre::{Context, Result};
use std::fmt;
use std::path::Path;

/// Columns appended to every data row
pub const RESULT_HEADERS: [&str; 5] = ["status", "hash", "block", "gas_used", "detail"];

/// Output table: the input's metadata rows, then one row per data row
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    metadata: Vec<Vec<String>>,
    rows: Vec<Vec<String>>,
    /// First column of the appended outcome cells
    outcome_column: usize,
}

impl ResultTable {
    pub fn new(metadata: Vec<Vec<String>>) -> Self {
        Self {
            metadata,
            rows: Vec::new(),
            outcome_column: 0,
        }
    }

    /// Table for per-row outcomes: result headers follow the first metadata row
    ///
    /// Outcome cells start after `data_width` columns, or after the header
    /// when it is wider than the data.
    pub fn for_outcomes(mut metadata: Vec<Vec<String>>, data_width: usize) -> Self {
        let mut outcome_column = data_width;
        if let Some(header) = metadata.first_mut() {
            outcome_column = outcome_column.max(header.len());
            header.resize(outcome_column, String::new());
            header.extend(RESULT_HEADERS.iter().map(|h| h.to_string()));
        }
        Self {
            outcome_column,
            ..Self::new(metadata)
        }
    }

    /// Append a row as-is
    pub fn push(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Append a data row followed by its outcome columns
    pub fn push_outcome(&mut self, row: &SheetRow, outcome: &TransactionOutcome) {
        let mut cells = row.cells.clone();
        cells.resize(self.outcome_column.max(cells.len()), String::new());
        cells.extend(outcome.to_cells());
        self.rows.push(cells);
    }

    /// Overwrite one cell of a data row, padding the row as needed
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.into();
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write metadata and data rows as headerless CSV
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;

        for row in self.metadata.iter().chain(&self.rows) {
            writer
                .write_record(row)
                .context("Failed to write CSV record")?;
        }
        writer.flush().context("Failed to flush output file")?;

        Ok(())
    }
}

/// Outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub confirmed: usize,
    pub reverted: usize,
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.confirmed + self.reverted + self.submitted + self.skipped + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} confirmed, {} reverted, {} submitted, {} skipped, {} failed",
            self.total(),
            self.confirmed,
            self.reverted,
            self.submitted,
            self.skipped,
            self.failed
        )
    }
}

/// Count outcomes per status
pub fn summarize(outcomes: &[TransactionOutcome]) -> Summary {
    outcomes
        .iter()
        .fold(Summary::default(), |mut summary, outcome| {
            match outcome.kind() {
                OutcomeKind::Confirmed if outcome.is_success() => summary.confirmed += 1,
                OutcomeKind::Confirmed => summary.reverted += 1,
                OutcomeKind::Submitted => summary.submitted += 1,
                OutcomeKind::Skipped => summary.skipped += 1,
                OutcomeKind::Failed => summary.failed += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confirmation, SkipReason};
    use alloy::primitives::TxHash;

    fn confirmed(success: bool) -> TransactionOutcome {
        Confirmation {
            hash: TxHash::repeat_byte(0xab),
            block_number: 42,
            gas_used: 21_000,
            success,
        }
        .into()
    }

    #[test]
    fn test_summarize() {
        let outcomes = vec![
            confirmed(true),
            confirmed(false),
            TransactionOutcome::skipped(SkipReason::NothingToRedeem),
            TransactionOutcome::failed("boom"),
            TransactionOutcome::Submitted {
                hash: TxHash::ZERO,
            },
            confirmed(true),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(
            summary,
            Summary {
                confirmed: 2,
                reverted: 1,
                submitted: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn test_set_cell_pads_row() {
        let mut table = ResultTable::new(Vec::new());
        table.push(vec!["key".into()]);
        table.set_cell(0, 3, "1.5");
        table.set_cell(7, 0, "ignored");

        assert_eq!(table.rows()[0], vec!["key", "", "", "1.5"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_write_csv_keeps_metadata_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut table = ResultTable::for_outcomes(vec![vec!["key".into(), "to".into()]], 3);
        table.push_outcome(
            &SheetRow::new(2, vec!["k1".into(), "a".into()]),
            &confirmed(true),
        );
        table.push_outcome(
            &SheetRow::new(3, vec!["k2".into(), "b".into()]),
            &TransactionOutcome::failed("nonce too low"),
        );
        table.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "key,to,,status,hash,block,gas_used,detail");
        assert!(lines[1].starts_with("k1,a,,confirmed,0xabab"));
        assert!(lines[2].starts_with("k2,b,,failed,"));
        assert!(lines[2].ends_with("nonce too low"));
    }

    #[test]
    fn test_header_wider_than_data_is_kept() {
        let header = ["privkey", "note", "contract", "data", "owner"];
        let metadata = vec![header.iter().map(|h| h.to_string()).collect()];
        let mut table = ResultTable::for_outcomes(metadata, 4);
        table.push_outcome(
            &SheetRow::new(2, vec!["k1".into(), "".into(), "0x42".into(), "0x01".into()]),
            &TransactionOutcome::failed("boom"),
        );

        assert_eq!(
            table.metadata[0],
            vec![
                "privkey", "note", "contract", "data", "owner", "status", "hash", "block",
                "gas_used", "detail"
            ]
        );
        // status lines up under its header
        assert_eq!(table.rows()[0][4], "");
        assert_eq!(table.rows()[0][5], "failed");
        assert_eq!(table.rows()[0].len(), table.metadata[0].len());
    }
}
