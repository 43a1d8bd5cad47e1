//! WebSocket session loop with endpoint rotation.
//!
//! One session per connected endpoint:
//! connect (bounded) → start watchdog → wait → subscribe → read frames.
//! When a session ends for any reason other than shutdown, the watchdog is
//! stopped, the pool rotates and records the failure (holding after a fully
//! failed round), and a new session starts after [`RECONNECT_DELAY`].

use std::sync::Arc;
use std::time::Duration;

use chainwatch_network::{with_connect_timeout, EndpointPool};
use chainwatch_notify::Notifier;
use chainwatch_types::{Block, Timestamp};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::frame::{parse_frame, subscribe_request};
use crate::watchdog::{StallPolicy, WatchdogGuard};
use crate::StreamError;

/// Delay before reconnecting after a session ends.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Delay between the handshake and the subscription request.
pub const SUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// How a session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The remote closed the connection or the stream ended.
    Closed,
    /// The block consumer went away; ingestion has nothing left to feed.
    ConsumerGone,
}

/// Maintains a `NewBlock` subscription across a pool of endpoints.
pub struct StreamIngestor {
    pool: EndpointPool,
    notifier: Arc<dyn Notifier>,
    blocks: mpsc::Sender<Block>,
    last_block: watch::Sender<Option<Timestamp>>,
    stall_policy: StallPolicy,
}

impl StreamIngestor {
    pub fn new(pool: EndpointPool, notifier: Arc<dyn Notifier>, blocks: mpsc::Sender<Block>) -> Self {
        let (last_block, _) = watch::channel(None);
        Self {
            pool,
            notifier,
            blocks,
            last_block,
            stall_policy: StallPolicy::default(),
        }
    }

    /// Override when the liveness watchdog checks and what counts as a stall.
    pub fn with_stall_policy(mut self, policy: StallPolicy) -> Self {
        self.stall_policy = policy;
        self
    }

    /// Run until shutdown or until the block consumer is dropped.
    ///
    /// Shutdown cancels whichever wait is in progress (connect, hold,
    /// reconnect delay) and stops the watchdog.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let endpoint = self.pool.current().to_string();
            let span = info_span!("stream_session", endpoint = %endpoint);
            let outcome = tokio::select! {
                _ = shutdown.recv() => {
                    info!("stream ingestor shutting down");
                    return;
                }
                outcome = self.session(&endpoint).instrument(span) => outcome,
            };

            match outcome {
                Ok(SessionEnd::ConsumerGone) => {
                    warn!("block consumer dropped, stopping stream ingestor");
                    return;
                }
                Ok(SessionEnd::Closed) => info!(endpoint = %endpoint, "connection closed"),
                Err(e) => error!(endpoint = %endpoint, "connection error: {e}"),
            }

            self.pool.rotate();
            let notifier = Arc::clone(&self.notifier);
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("stream ingestor shutting down during backoff");
                    return;
                }
                _ = async {
                    self.pool.register_failure(notifier.as_ref()).await;
                    tokio::time::sleep(RECONNECT_DELAY).await;
                } => {}
            }
        }
    }

    async fn session(&mut self, endpoint: &str) -> Result<SessionEnd, StreamError> {
        info!("connecting");
        let (ws, _) = with_connect_timeout(endpoint, connect_async(endpoint)).await?;
        info!("websocket client connected");

        let _watchdog = WatchdogGuard::spawn(
            self.last_block.subscribe(),
            Arc::clone(&self.notifier),
            self.stall_policy,
        );
        let (mut write, mut read) = ws.split();

        tokio::time::sleep(SUBSCRIBE_DELAY).await;
        let request = subscribe_request(Timestamp::now().as_millis());
        write
            .send(Message::Text(serde_json::to_string(&request)?))
            .await?;
        debug!("subscribed to new blocks");

        let mut received_block = false;
        while let Some(message) = read.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    debug!(?frame, "close frame received");
                    return Ok(SessionEnd::Closed);
                }
                _ => continue,
            };
            let Some(block) = parse_frame(&text) else {
                continue;
            };
            info!(height = block.height, "new block");
            self.last_block.send_replace(Some(block.time));
            if !received_block {
                received_block = true;
                self.pool.record_success();
            }
            if self.blocks.send(block).await.is_err() {
                return Ok(SessionEnd::ConsumerGone);
            }
        }
        Ok(SessionEnd::Closed)
    }
}
