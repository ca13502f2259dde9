//! RecipientSource - turns a decoded table into recipients

use contracts::{ContractError, Recipient, Table};

/// Column holding the destination address
pub const EMAIL_COLUMN: &str = "Email";
/// Column holding the salutation
pub const TITLE_COLUMN: &str = "Title";
/// Column holding the display name
pub const NAME_COLUMN: &str = "Name";

/// Required columns, in the order their absence is reported
pub const REQUIRED_COLUMNS: [&str; 3] = [EMAIL_COLUMN, TITLE_COLUMN, NAME_COLUMN];

/// Positions of the required columns inside a row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    email: usize,
    title: usize,
    name: usize,
}

/// Validated recipient table
///
/// Construction checks the table shape once; iteration is lazy and consumes
/// the table, so a source can only be walked once.
#[derive(Debug)]
pub struct RecipientSource {
    rows: Vec<Vec<String>>,
    columns: ColumnMap,
}

impl RecipientSource {
    /// Validate `table` and build a source over its rows
    ///
    /// # Errors
    /// - `Validation` when the table has no data rows
    /// - `SourceFormat` naming the first missing required column
    pub fn new(table: Table) -> Result<Self, ContractError> {
        if table.row_count() == 0 {
            return Err(ContractError::validation(
                "At least one recipient is required.",
            ));
        }

        let columns = ColumnMap {
            email: require_column(&table, EMAIL_COLUMN)?,
            title: require_column(&table, TITLE_COLUMN)?,
            name: require_column(&table, NAME_COLUMN)?,
        };

        Ok(Self {
            rows: table.rows,
            columns,
        })
    }

    /// Number of rows the source will yield
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn require_column(table: &Table, name: &str) -> Result<usize, ContractError> {
    table.column_index(name).ok_or_else(|| {
        ContractError::source_format(format!(
            "Column {name} is required in the recipients file uploaded."
        ))
    })
}

impl IntoIterator for RecipientSource {
    type Item = Recipient;
    type IntoIter = Recipients;

    fn into_iter(self) -> Self::IntoIter {
        Recipients {
            rows: self.rows.into_iter(),
            columns: self.columns,
        }
    }
}

/// Single-pass iterator over the recipients of a table, in row order
#[derive(Debug)]
pub struct Recipients {
    rows: std::vec::IntoIter<Vec<String>>,
    columns: ColumnMap,
}

impl Iterator for Recipients {
    type Item = Recipient;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(Recipient::new(
            cell(&row, self.columns.title),
            cell(&row, self.columns.name),
            cell(&row, self.columns.email),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Recipients {}

/// Trimmed cell content; short rows read as empty
fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default()
}
