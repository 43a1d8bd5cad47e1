//! Wire format of the `NewBlock` subscription.

use chainwatch_types::Block;
use serde::Deserialize;
use tracing::{debug, trace};

/// Event query for new blocks.
pub const NEW_BLOCK_QUERY: &str = "tm.event='NewBlock'";

/// JSON-RPC `subscribe` request. `id` is the current epoch milliseconds.
pub fn subscribe_request(id: i64) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "subscribe",
        "params": { "query": NEW_BLOCK_QUERY },
    })
}

/// Extract the block from a subscription frame.
///
/// Frames without a `result.data.value.block` object (subscription
/// acknowledgements, errors, other event types) yield `None`, as do block
/// objects that fail to decode.
pub fn parse_frame(text: &str) -> Option<Block> {
    let payload: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!("ignoring non-JSON frame: {e}");
            return None;
        }
    };
    let Some(raw) = payload.pointer("/result/data/value/block") else {
        trace!("ignoring frame without block");
        return None;
    };
    match Block::deserialize(raw) {
        Ok(block) => Some(block),
        Err(e) => {
            debug!("ignoring undecodable block: {e}");
            None
        }
    }
}
