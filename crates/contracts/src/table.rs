//! Table - decoded recipient upload
//!
//! The spreadsheet driver is an external collaborator: it only has to turn an
//! upload into named columns and rows of cells.

use crate::{ContractError, UploadedFile};

/// Rows of named columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Header names, in file order
    pub columns: Vec<String>,

    /// Data rows (header excluded); rows may be shorter than `columns`
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column, matched case-insensitively on trimmed names
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name.trim()))
    }
}

/// Tabular driver: decodes an uploaded file into a `Table`
pub trait TableDecoder: Send + Sync {
    /// Driver name (used for logging)
    fn name(&self) -> &str;

    /// # Errors
    /// Returns `ContractError::SourceFormat` when the file cannot be read as a table
    fn decode(&self, file: &UploadedFile) -> Result<Table, ContractError>;
}
