//! # Ingestion
//!
//! Batch input handling.
//!
//! Responsibilities:
//! - Decode recipient uploads into a `Table` (CSV/TSV and Excel/ODS drivers)
//! - Validate the table shape and yield `Recipient`s lazily
//! - Stage attachment uploads on disk under collision-safe names
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{decode_table, AttachmentStager, RecipientSource};
//!
//! let table = decode_table(&upload)?;
//! for recipient in RecipientSource::new(table)? {
//!     // ...
//! }
//!
//! let stager = AttachmentStager::for_attachments(&blueprint.staging);
//! let refs = stager.stage(&attachments).await?;
//! ```

mod decoder;
mod source;
mod stager;

// Re-exports
pub use decoder::{decode_table, decoder_for, CsvDecoder, SpreadsheetDecoder};
pub use source::{
    RecipientSource, Recipients, EMAIL_COLUMN, NAME_COLUMN, REQUIRED_COLUMNS, TITLE_COLUMN,
};
pub use stager::{
    candidate_names, sanitize_file_name, AttachmentStager, StagingMetrics, StagingSnapshot,
};
