//! The validator gateway: a self-healing query connection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, Weak};

use async_trait::async_trait;
use chainwatch_crypto::consensus_address;
use chainwatch_network::{with_connect_timeout, EndpointPool};
use chainwatch_notify::Notifier;
use chainwatch_types::{BondStatus, Validator};
use prost::Message;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::proto::{self, PageRequest, QueryValidatorsRequest, QueryValidatorsResponse};
use crate::{query_url, RpcDialect, RpcError, TendermintRpc};

/// ABCI path of the staking `Validators` query.
pub const VALIDATORS_PATH: &str = "/cosmos.staking.v1beta1.Query/Validators";

/// Validators requested per page.
const PAGE_LIMIT: u64 = 200;

/// Upper bound on pages followed in one listing.
const MAX_PAGES: usize = 100;

/// Anything that can produce the current validator set.
#[async_trait]
pub trait ValidatorSource: Send + Sync {
    /// The full validator set, every bond status included.
    ///
    /// Fails with [`RpcError::NotConnected`] before the first connection.
    async fn list_validators(&self) -> Result<Vec<Validator>, RpcError>;
}

/// Convert a staking validator into the monitor's view of it.
pub fn validator_from_proto(validator: &proto::Validator, watchlist: &HashSet<String>) -> Validator {
    let status = match validator.status {
        proto::BOND_STATUS_BONDED => BondStatus::Bonded,
        proto::BOND_STATUS_UNBONDING => BondStatus::Unbonding,
        _ => BondStatus::Unbonded,
    };
    let hex_address = validator
        .consensus_pubkey
        .as_ref()
        .map(|key| consensus_address(&key.value))
        .unwrap_or_default();
    Validator {
        operator_address: validator.operator_address.clone(),
        hex_address,
        moniker: validator
            .description
            .as_ref()
            .map(|d| d.moniker.clone())
            .unwrap_or_default(),
        status,
        jailed: validator.jailed,
        tokens: validator.tokens.clone(),
        watched: watchlist.contains(&validator.operator_address),
    }
}

/// Query connection with its own endpoint pool.
///
/// The pool is independent from the stream's: same addresses, separate
/// cursor and failure counter. Connecting loops forever through
/// rotate/hold until one endpoint answers the version probe.
pub struct ValidatorGateway {
    this: Weak<Self>,
    pool: Mutex<EndpointPool>,
    client: RwLock<Option<Arc<TendermintRpc>>>,
    watchlist: HashSet<String>,
    notifier: Arc<dyn Notifier>,
    connecting: AtomicBool,
    connect_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ValidatorGateway {
    pub fn new(
        pool: EndpointPool,
        watchlist: impl IntoIterator<Item = String>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let watchlist = watchlist.into_iter().collect();
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            pool: Mutex::new(pool),
            client: RwLock::new(None),
            watchlist,
            notifier,
            connecting: AtomicBool::new(false),
            connect_task: std::sync::Mutex::new(None),
        })
    }

    /// Connect, retrying through the pool until an endpoint answers.
    pub async fn connect(&self) {
        loop {
            let endpoint = self.pool.lock().await.current().to_string();
            match self.try_connect(&endpoint).await {
                Ok(client) => {
                    info!(
                        endpoint = %endpoint,
                        dialect = client.dialect().as_str(),
                        "query client connected"
                    );
                    self.pool.lock().await.record_success();
                    *self.client.write().await = Some(Arc::new(client));
                    return;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, "query connection failed: {e}");
                    let mut pool = self.pool.lock().await;
                    pool.register_failure(self.notifier.as_ref()).await;
                    pool.rotate();
                }
            }
        }
    }

    /// Start [`connect`](Self::connect) in the background unless a connect
    /// loop is already running.
    pub fn spawn_connect(&self) {
        if self.connecting.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(this) = self.this.upgrade() else {
            self.connecting.store(false, Ordering::Release);
            return;
        };
        let handle = tokio::spawn(async move {
            this.connect().await;
            this.connecting.store(false, Ordering::Release);
        });
        let mut slot = self
            .connect_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(handle);
    }

    /// Abort a background connect loop, if any.
    pub fn stop(&self) {
        let handle = self
            .connect_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.connecting.store(false, Ordering::Release);
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Dialect of the connected client.
    pub async fn dialect(&self) -> Option<RpcDialect> {
        self.client.read().await.as_ref().map(|c| c.dialect())
    }

    /// Probe `/status` with a legacy request, then settle on the dialect the
    /// reported version calls for.
    async fn try_connect(&self, endpoint: &str) -> Result<TendermintRpc, RpcError> {
        let url = query_url(endpoint);
        let client = with_connect_timeout(endpoint, async {
            let probe = TendermintRpc::new(url.clone(), RpcDialect::Legacy)?;
            let status = probe.status().await?;
            let dialect = RpcDialect::for_version(&status.version);
            debug!(
                version = %status.version,
                network = %status.network,
                dialect = dialect.as_str(),
                "node version probed"
            );
            match dialect {
                RpcDialect::Legacy => Ok::<_, RpcError>(probe),
                RpcDialect::Modern => TendermintRpc::new(url.clone(), dialect),
            }
        })
        .await?;
        Ok(client)
    }

    async fn fetch_all(&self, client: &TendermintRpc) -> Result<Vec<Validator>, RpcError> {
        let mut validators = Vec::new();
        let mut key = Vec::new();
        for _ in 0..MAX_PAGES {
            let request = QueryValidatorsRequest {
                status: String::new(),
                pagination: Some(PageRequest {
                    key: std::mem::take(&mut key),
                    limit: PAGE_LIMIT,
                    ..Default::default()
                }),
            };
            let bytes = client
                .abci_query(VALIDATORS_PATH, &request.encode_to_vec())
                .await?;
            let response = QueryValidatorsResponse::decode(bytes.as_slice())?;
            validators.extend(
                response
                    .validators
                    .iter()
                    .map(|v| validator_from_proto(v, &self.watchlist)),
            );
            match response.pagination {
                Some(page) if !page.next_key.is_empty() => key = page.next_key,
                _ => {
                    debug!(count = validators.len(), "validator set fetched");
                    return Ok(validators);
                }
            }
        }
        Err(RpcError::InvalidResponse(format!(
            "validator set spans more than {MAX_PAGES} pages"
        )))
    }
}

#[async_trait]
impl ValidatorSource for ValidatorGateway {
    async fn list_validators(&self) -> Result<Vec<Validator>, RpcError> {
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(RpcError::NotConnected)?;
        match self.fetch_all(&client).await {
            Ok(validators) => Ok(validators),
            Err(e) if e.is_transport() => {
                warn!(endpoint = %client.base_url(), "validator query failed, reconnecting: {e}");
                {
                    let mut slot = self.client.write().await;
                    if slot.as_ref().is_some_and(|c| Arc::ptr_eq(c, &client)) {
                        *slot = None;
                    }
                }
                self.spawn_connect();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for ValidatorGateway {
    fn drop(&mut self) {
        if let Some(handle) = self
            .connect_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
