//! Endpoint management shared by the stream and query connections.
//!
//! Each connection component owns its own [`EndpointPool`]: an ordered list of
//! node addresses with a round-robin cursor and a consecutive-failure counter.
//! Once every endpoint has failed within one round the pool enters a hold
//! backoff, alerts once, and then starts a fresh round.

pub mod error;
pub mod pool;

pub use error::NetworkError;
pub use pool::{
    with_connect_timeout, EndpointPool, FailureOutcome, CONNECT_TIMEOUT, HOLD_DURATION,
};
