//! Tabular row source
//!
//! Input files are headerless, flexible-width CSV: a few leading metadata
//! rows (titles, per-column settings) followed by one data row per wallet.
//! [`ColumnLayout`] maps the cells of a data row onto an [`InputRow`].

use crate::constants::parse_ether;
use crate::types::{Action, InputRow, RejectedRow, SecretKey, SkipReason};
use alloy::primitives::{Address, Bytes};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use eyre::{ensure, Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Zero-based index of a spreadsheet column letter (`b'A'` is 0)
pub const fn column(letter: u8) -> usize {
    (letter.to_ascii_uppercase() - b'A') as usize
}

/// Spreadsheet name of a zero-based column index (0 is `A`, 26 is `AA`)
pub fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// One data row of the input table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based line in the source file
    pub line: usize,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn new(line: usize, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    /// Trimmed cell value; empty cells read as `None`
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Sequential source of data rows
pub trait RowSource {
    /// Next data row, or `None` once the source is exhausted
    fn next_row(&mut self) -> Result<Option<SheetRow>>;
}

/// Read every remaining row; an empty source is a configuration error
pub fn collect_rows<S: RowSource>(source: &mut S) -> Result<Vec<SheetRow>> {
    let mut rows = Vec::new();
    while let Some(row) = source.next_row()? {
        rows.push(row);
    }
    ensure!(!rows.is_empty(), "No data rows found");
    Ok(rows)
}

/// Headerless CSV reader
pub struct CsvRowSource<R: Read> {
    records: StringRecordsIntoIter<R>,
    skip_rows: usize,
    metadata: Vec<Vec<String>>,
}

impl CsvRowSource<File> {
    /// Open a CSV file whose first `skip_rows` rows are metadata
    pub fn open(path: impl AsRef<Path>, skip_rows: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        Ok(Self::from_reader(file, skip_rows))
    }
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(reader: R, skip_rows: usize) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            skip_rows,
            metadata: Vec::with_capacity(skip_rows),
        }
    }

    /// Leading rows read so far that are not data rows
    pub fn metadata(&self) -> &[Vec<String>] {
        &self.metadata
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        for record in self.records.by_ref() {
            let record = record.context("Failed to read CSV record")?;
            let line = record
                .position()
                .map(|position| position.line() as usize)
                .unwrap_or_default();
            let cells: Vec<String> = record.iter().map(str::to_string).collect();

            if self.metadata.len() < self.skip_rows {
                self.metadata.push(cells);
                continue;
            }
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            return Ok(Some(SheetRow::new(line, cells)));
        }

        Ok(None)
    }
}

/// A signing key and the data row it came from
#[derive(Debug, Clone)]
pub struct KeyedRow {
    /// Position among the data rows
    pub index: usize,
    pub line: usize,
    pub key: SecretKey,
}

/// Signing keys of every data row that has one in `column`
pub fn signing_keys(rows: &[SheetRow], column: usize) -> Vec<KeyedRow> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            row.cell(column).map(|key| KeyedRow {
                index,
                line: row.line,
                key: SecretKey::new(key),
            })
        })
        .collect()
}

/// Which columns hold the fields of each row kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    ContractCall {
        key: usize,
        to: usize,
        data: usize,
    },
    NativeTransfer {
        key: usize,
        amount: usize,
        to: usize,
    },
    TokenTransfer {
        key: usize,
        token: usize,
        to: usize,
        amount: usize,
    },
    /// Redeem from one market shared by every row
    Redeem { key: usize, market: Address },
}

impl ColumnLayout {
    pub const fn contract_call(key: usize, to: usize, data: usize) -> Self {
        Self::ContractCall { key, to, data }
    }

    pub const fn native_transfer(key: usize, amount: usize, to: usize) -> Self {
        Self::NativeTransfer { key, amount, to }
    }

    pub const fn token_transfer(key: usize, token: usize, to: usize, amount: usize) -> Self {
        Self::TokenTransfer {
            key,
            token,
            to,
            amount,
        }
    }

    pub const fn redeem(key: usize, market: Address) -> Self {
        Self::Redeem { key, market }
    }

    fn key_column(&self) -> usize {
        match *self {
            Self::ContractCall { key, .. }
            | Self::NativeTransfer { key, .. }
            | Self::TokenTransfer { key, .. }
            | Self::Redeem { key, .. } => key,
        }
    }

    /// Map a data row to a submittable row, or the reason it cannot be
    pub fn parse(&self, row: &SheetRow) -> std::result::Result<InputRow, RejectedRow> {
        let key = row.cell(self.key_column()).map(SecretKey::new);
        let rejected = |reason| RejectedRow {
            line: row.line,
            signing_key: key.clone(),
            reason,
        };

        let Some(signing_key) = key.clone() else {
            return Err(rejected(SkipReason::MissingField("private key")));
        };
        let action = self.action(row).map_err(rejected)?;

        Ok(InputRow::new(row.line, signing_key, action))
    }

    fn action(&self, row: &SheetRow) -> std::result::Result<Action, SkipReason> {
        let action = match *self {
            Self::ContractCall { to, data, .. } => Action::ContractCall {
                to: address_cell(row, to, "contract")?,
                data: bytes_cell(row, data, "calldata")?,
            },
            Self::NativeTransfer { amount, to, .. } => {
                let value = required(row, amount, "amount")?;
                Action::NativeTransfer {
                    to: address_cell(row, to, "recipient")?,
                    amount: parse_ether(value).map_err(|_| invalid("amount", value))?,
                }
            }
            Self::TokenTransfer {
                token, to, amount, ..
            } => Action::TokenTransfer {
                token: address_cell(row, token, "token")?,
                to: address_cell(row, to, "recipient")?,
                amount: required(row, amount, "amount")?.to_string(),
            },
            Self::Redeem { market, .. } => Action::Redeem { market },
        };
        Ok(action)
    }

    /// Map every data row, keeping row order
    pub fn parse_all(&self, rows: &[SheetRow]) -> Vec<std::result::Result<InputRow, RejectedRow>> {
        rows.iter().map(|row| self.parse(row)).collect()
    }
}

fn invalid(field: &'static str, value: &str) -> SkipReason {
    SkipReason::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn required<'a>(
    row: &'a SheetRow,
    column: usize,
    field: &'static str,
) -> std::result::Result<&'a str, SkipReason> {
    row.cell(column).ok_or(SkipReason::MissingField(field))
}

pub(crate) fn address_cell(
    row: &SheetRow,
    column: usize,
    field: &'static str,
) -> std::result::Result<Address, SkipReason> {
    let value = required(row, column, field)?;
    value.parse().map_err(|_| invalid(field, value))
}

pub(crate) fn bytes_cell(
    row: &SheetRow,
    column: usize,
    field: &'static str,
) -> std::result::Result<Bytes, SkipReason> {
    let value = required(row, column, field)?;
    value.parse().map_err(|_| invalid(field, value))
}
