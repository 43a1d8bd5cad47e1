//! Hand-written protobuf messages for the staking `Validators` query.
//!
//! Only the fields chainwatch reads are declared; prost skips the rest.

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `cosmos.base.query.v1beta1.PageRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct PageRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
    #[prost(uint64, tag = "3")]
    pub limit: u64,
    #[prost(bool, tag = "4")]
    pub count_total: bool,
    #[prost(bool, tag = "5")]
    pub reverse: bool,
}

/// `cosmos.base.query.v1beta1.PageResponse`
#[derive(Clone, PartialEq, prost::Message)]
pub struct PageResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub next_key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub total: u64,
}

/// `cosmos.staking.v1beta1.Description`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Description {
    #[prost(string, tag = "1")]
    pub moniker: String,
    #[prost(string, tag = "2")]
    pub identity: String,
    #[prost(string, tag = "3")]
    pub website: String,
    #[prost(string, tag = "4")]
    pub security_contact: String,
    #[prost(string, tag = "5")]
    pub details: String,
}

/// `cosmos.staking.v1beta1.Validator`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Validator {
    #[prost(string, tag = "1")]
    pub operator_address: String,
    #[prost(message, optional, tag = "2")]
    pub consensus_pubkey: Option<Any>,
    #[prost(bool, tag = "3")]
    pub jailed: bool,
    /// `BondStatus`: 0 unspecified, 1 unbonded, 2 unbonding, 3 bonded.
    #[prost(int32, tag = "4")]
    pub status: i32,
    #[prost(string, tag = "5")]
    pub tokens: String,
    #[prost(string, tag = "6")]
    pub delegator_shares: String,
    #[prost(message, optional, tag = "7")]
    pub description: Option<Description>,
}

/// `cosmos.staking.v1beta1.QueryValidatorsRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryValidatorsRequest {
    /// Empty string means every status.
    #[prost(string, tag = "1")]
    pub status: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

/// `cosmos.staking.v1beta1.QueryValidatorsResponse`
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryValidatorsResponse {
    #[prost(message, repeated, tag = "1")]
    pub validators: Vec<Validator>,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageResponse>,
}

pub const BOND_STATUS_UNBONDED: i32 = 1;
pub const BOND_STATUS_UNBONDING: i32 = 2;
pub const BOND_STATUS_BONDED: i32 = 3;
