//! Tabular decoders for recipient uploads

use std::fmt::Display;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use contracts::{ContractError, Table, TableDecoder, UploadedFile};
use tracing::debug;

/// CSV driver
///
/// The first record is the header. Rows may be shorter or longer than the
/// header; empty lines are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDecoder {
    delimiter: Option<u8>,
}

impl CsvDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a delimiter other than `,`
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }
}

impl TableDecoder for CsvDecoder {
    fn name(&self) -> &str {
        "csv"
    }

    fn decode(&self, file: &UploadedFile) -> Result<Table, ContractError> {
        let mut builder = csv::ReaderBuilder::new();
        builder.has_headers(true).flexible(true);
        if let Some(delimiter) = self.delimiter {
            builder.delimiter(delimiter);
        }
        let mut reader = builder.from_reader(file.content.as_ref());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| unreadable(file, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| unreadable(file, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            file = %file.file_name,
            columns = columns.len(),
            rows = rows.len(),
            "Decoded recipient table"
        );

        Ok(Table::new(columns, rows))
    }
}

/// Excel / OpenDocument driver
///
/// Only the first worksheet is read, starting at its first used cell. That
/// row is the header; trailing blank rows are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetDecoder;

impl TableDecoder for SpreadsheetDecoder {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn decode(&self, file: &UploadedFile) -> Result<Table, ContractError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.content.to_vec()))
            .map_err(|e| unreadable(file, e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| unreadable(file, "workbook has no worksheet"))?
            .map_err(|e| unreadable(file, e))?;

        let mut lines = range.rows();
        let columns: Vec<String> = lines
            .next()
            .map(|header| header.iter().map(|c| c.to_string().trim().to_string()).collect())
            .unwrap_or_default();

        let mut rows: Vec<Vec<String>> = lines
            .map(|line| line.iter().map(cell_text).collect())
            .collect();
        while rows
            .last()
            .is_some_and(|row| row.iter().all(String::is_empty))
        {
            rows.pop();
        }

        debug!(
            file = %file.file_name,
            sheet_rows = range.height(),
            columns = columns.len(),
            rows = rows.len(),
            "Decoded recipient workbook"
        );

        Ok(Table::new(columns, rows))
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn unreadable(file: &UploadedFile, err: impl Display) -> ContractError {
    ContractError::source_format(format!(
        "Recipient file {} could not be read: {err}",
        file.file_name
    ))
}

/// Pick a decoder by the upload's extension
///
/// # Errors
/// Returns `SourceFormat` for extensions no driver handles
pub fn decoder_for(file: &UploadedFile) -> Result<Box<dyn TableDecoder>, ContractError> {
    match file.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => Ok(Box::new(CsvDecoder::new())),
        Some("tsv") => Ok(Box::new(CsvDecoder::with_delimiter(b'\t'))),
        Some("xls" | "xlsx" | "xlsm" | "ods") => Ok(Box::new(SpreadsheetDecoder)),
        Some(ext) => Err(ContractError::source_format(format!(
            "Unsupported recipient file format: .{ext}"
        ))),
        None => Err(ContractError::source_format(format!(
            "Unsupported recipient file format: {}",
            file.file_name
        ))),
    }
}

/// Decode an upload with the driver matching its extension
pub fn decode_table(file: &UploadedFile) -> Result<Table, ContractError> {
    decoder_for(file)?.decode(file)
}
