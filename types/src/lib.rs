//! Fundamental types for chainwatch.
//!
//! This crate defines the values that flow through the monitoring pipeline:
//! blocks and their commit signatures as received from the stream, validators
//! as returned by the query endpoint, and the classified events handed to
//! notifiers.

pub mod block;
pub mod error;
pub mod event;
pub mod time;
pub mod validator;

pub use block::{Block, BlockIdFlag, CommitSignature};
pub use error::TypesError;
pub use event::{Event, EventCategory, EventKey, MetaValue, Metadata, Severity};
pub use time::Timestamp;
pub use validator::{BondStatus, Validator};
