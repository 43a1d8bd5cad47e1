//! The orchestrator.

use std::sync::Arc;

use chainwatch_detector::AnomalyDetector;
use chainwatch_network::{EndpointPool, HOLD_DURATION};
use chainwatch_notify::{LogNotifier, Notifier, NotifierSet, SlackConfig, SlackNotifier};
use chainwatch_rpc::ValidatorGateway;
use chainwatch_stream::StreamIngestor;
use chainwatch_types::Block;
use chainwatch_utils::format_duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{info, warn, Instrument};

use crate::spans::analyze_block_span;
use crate::{MonitorConfig, MonitorError, ShutdownController};

/// Blocks buffered between the stream and the detector.
pub const BLOCK_QUEUE_CAPACITY: usize = 64;

/// A fully wired monitor, ready to [`run`](Self::run).
pub struct Monitor {
    notifier: Arc<dyn Notifier>,
    stream_pool: EndpointPool,
    gateway: Arc<ValidatorGateway>,
    detector: AnomalyDetector,
}

impl Monitor {
    /// Build a monitor that notifies through Slack, or through the log when
    /// no webhook is configured.
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let notifier = build_notifier(&config.slack)?;
        Self::with_notifier(config, notifier)
    }

    /// Build a monitor around an explicit notifier.
    pub fn with_notifier(
        config: &MonitorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let endpoints = config.endpoint_list();
        let stream_pool = EndpointPool::new("stream", endpoints.clone())?;
        let rpc_pool = EndpointPool::new("rpc", endpoints)?;
        let gateway = ValidatorGateway::new(rpc_pool, config.watchlist(), Arc::clone(&notifier));
        let detector = AnomalyDetector::new(
            config.detector_config()?,
            gateway.clone(),
            Arc::clone(&notifier),
        );
        Ok(Self {
            notifier,
            stream_pool,
            gateway,
            detector,
        })
    }

    pub fn gateway(&self) -> &Arc<ValidatorGateway> {
        &self.gateway
    }

    /// Run until `shutdown` fires.
    ///
    /// Starts the gateway's connect loop (only when a validator-dependent
    /// category is enabled), the detector task and the stream ingestor.
    pub async fn run(self, shutdown: &ShutdownController) -> Result<(), MonitorError> {
        let started = Instant::now();
        info!(
            endpoints = self.stream_pool.len(),
            hold = %format_duration(HOLD_DURATION),
            "starting monitor"
        );

        if self.detector.config().needs_validators() {
            self.gateway.spawn_connect();
        }

        let (block_tx, block_rx) = mpsc::channel(BLOCK_QUEUE_CAPACITY);
        let detector_task = tokio::spawn(run_detector(self.detector, block_rx, shutdown.subscribe()));
        let ingestor = StreamIngestor::new(self.stream_pool, Arc::clone(&self.notifier), block_tx);
        let ingest_task = tokio::spawn(ingestor.run(shutdown.subscribe()));

        let (ingest, detect) = tokio::join!(ingest_task, detector_task);
        self.gateway.stop();
        ingest.map_err(|e| MonitorError::Task(format!("stream ingestor: {e}")))?;
        detect.map_err(|e| MonitorError::Task(format!("detector: {e}")))?;
        info!(uptime = %format_duration(started.elapsed()), "monitor stopped");
        Ok(())
    }
}

/// Analyze blocks one at a time until the channel closes or shutdown fires.
pub async fn run_detector(
    mut detector: AnomalyDetector,
    mut blocks: mpsc::Receiver<Block>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("detector shutting down");
                return;
            }
            block = blocks.recv() => {
                let Some(block) = block else {
                    info!("block stream closed, detector stopping");
                    return;
                };
                detector
                    .analyze_block(&block)
                    .instrument(analyze_block_span(block.height))
                    .await;
            }
        }
    }
}

fn build_notifier(slack: &SlackConfig) -> Result<Arc<dyn Notifier>, MonitorError> {
    let mut notifiers = NotifierSet::new();
    if slack.is_empty() {
        warn!("no Slack webhook configured, events are written to the log only");
        notifiers.push(Arc::new(LogNotifier));
    } else {
        notifiers.push(Arc::new(SlackNotifier::new(slack)?));
    }
    Ok(Arc::new(notifiers))
}
