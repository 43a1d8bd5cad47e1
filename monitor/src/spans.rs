//! Pre-built [`tracing::Span`] constructors for monitor operations.
//!
//! Consistent span names and fields make it easy to correlate the log lines
//! of one block's analysis, from the validator query to dispatch.

use tracing::{info_span, Span};

/// Span covering the full analysis of a single block.
pub fn analyze_block_span(height: u64) -> Span {
    info_span!("analyze_block", height = height)
}
