//! # Contracts
//!
//! Frozen interface contracts shared by every newsletter crate: the batch data
//! model, the error taxonomy, and the traits behind which external
//! collaborators (table drivers, mail transport, record sink) live.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Batch Model
//! - One `Batch` per submission, identified by a `CorrelationToken`
//! - Every `DeliveryRecord` of a batch carries the same token

mod batch;
mod blueprint;
mod delivery;
mod error;
mod ledger;
mod recipient;
mod table;
mod transport;

pub use batch::*;
pub use blueprint::*;
pub use delivery::*;
pub use error::*;
pub use ledger::{DeliveryLedger, LocalDeliveryLedger};
pub use recipient::*;
pub use table::*;
pub use transport::{LocalMailTransport, MailTransport, OutboundMessage};
