//! Validator queries over Tendermint RPC.
//!
//! [`ValidatorGateway`] owns its own endpoint pool, independent of the stream
//! connection, and exposes a single query: the full staking validator set.
//! On connect it probes the node version and picks the request
//! [`RpcDialect`] the node understands.

pub mod client;
pub mod dialect;
pub mod error;
pub mod gateway;
pub mod proto;

pub use client::{NodeStatus, TendermintRpc};
pub use dialect::{query_url, RpcDialect};
pub use error::RpcError;
pub use gateway::{validator_from_proto, ValidatorGateway, ValidatorSource, VALIDATORS_PATH};
