//! End-to-end pipeline tests with nullable collaborators.

use std::sync::Arc;
use std::time::Duration;

use chainwatch_detector::{AnomalyDetector, DetectorConfig};
use chainwatch_monitor::{run_detector, Monitor, MonitorConfig, ShutdownController};
use chainwatch_nullables::{NullNotifier, NullValidatorSource};
use chainwatch_types::{
    Block, BlockIdFlag, BondStatus, CommitSignature, EventCategory, Severity, Timestamp, Validator,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const T0: i64 = 1_714_557_600_000;

fn hex(n: u8) -> String {
    format!("{n:02X}").repeat(20)
}

fn snapshot(watched_status: BondStatus) -> Vec<Validator> {
    (1..=5u8)
        .map(|n| {
            let status = if n == 5 { watched_status } else { BondStatus::Bonded };
            let mut v = NullValidatorSource::validator(
                &format!("cosmosvaloper{n}"),
                &hex(n),
                &format!("validator-{n}"),
                status,
            );
            v.watched = n == 5;
            v
        })
        .collect()
}

fn block(height: u64, offset_ms: i64, missed: &[u8]) -> Block {
    let signatures = (1..=5u8)
        .map(|n| CommitSignature {
            validator_address: hex(n),
            flag: if missed.contains(&n) {
                BlockIdFlag::Absent
            } else {
                BlockIdFlag::Commit
            },
        })
        .collect();
    Block::new(height, Timestamp::from_millis(T0 + offset_ms), signatures)
}

#[tokio::test]
async fn watched_unbond_and_missed_signature_share_a_batch() {
    let source = Arc::new(NullValidatorSource::scripted([
        snapshot(BondStatus::Bonded),
        snapshot(BondStatus::Bonded),
        snapshot(BondStatus::Unbonding),
    ]));
    let notifier = Arc::new(NullNotifier::new());
    let config = DetectorConfig::new(EventCategory::ALL).with_watchlist(["cosmosvaloper5".to_string()]);
    let detector = AnomalyDetector::new(config, source.clone(), notifier.clone());

    let (tx, rx) = mpsc::channel(8);
    let (_stop_tx, stop_rx) = broadcast::channel(1);
    let task = tokio::spawn(run_detector(detector, rx, stop_rx));

    tx.send(block(1, 0, &[])).await.unwrap();
    tx.send(block(2, 6_000, &[])).await.unwrap();
    tx.send(block(3, 12_000, &[5])).await.unwrap();
    drop(tx);
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();

    assert_eq!(source.calls(), 3);
    let batches = notifier.batches();
    assert_eq!(batches.len(), 1, "only block 3 produces events");
    let batch = &batches[0];

    let unbond = batch
        .iter()
        .position(|e| e.category == EventCategory::ValidatorSet && e.severity == Severity::Warn)
        .expect("validator set warning");
    let missed = batch
        .iter()
        .position(|e| e.category == EventCategory::Signatures && e.severity == Severity::Warn)
        .expect("signature warning");
    assert!(unbond < missed);

    let texts: Vec<_> = batch.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "Validator unbonded: validator-5",
            "Watched validator \"validator-5\" is unbonded",
            "Found 1 missing signatures in block 3",
            "Found 1 missing signatures from watched validators in block 3",
        ]
    );
}

#[tokio::test]
async fn shutdown_stops_an_idle_detector() {
    let detector = AnomalyDetector::new(
        DetectorConfig::default(),
        Arc::new(NullValidatorSource::not_ready()),
        Arc::new(NullNotifier::new()),
    );
    let (_tx, rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = broadcast::channel(1);
    let task = tokio::spawn(run_detector(detector, rx, stop_rx));
    stop_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[test]
fn invalid_config_is_rejected() {
    let config = MonitorConfig {
        endpoints: vec!["ws://localhost:26657/websocket".into()],
        events: vec!["nope".into()],
        ..Default::default()
    };
    assert!(Monitor::with_notifier(&config, Arc::new(NullNotifier::new())).is_err());
}

fn frame(height: u64, time: &str) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "query": "tm.event='NewBlock'",
            "data": {
                "type": "tendermint/event/NewBlock",
                "value": {
                    "block": {
                        "header": { "height": height.to_string(), "time": time },
                        "last_commit": { "signatures": [] }
                    }
                }
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn monitor_streams_blocks_into_the_detector() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let _subscribe = ws.next().await;
        for (height, time) in [
            (1, "2024-05-01T10:00:00Z"),
            (2, "2024-05-01T10:00:01Z"),
            (3, "2024-05-01T10:00:10Z"),
        ] {
            ws.send(Message::Text(frame(height, time))).await.unwrap();
        }
        let _ = ws.next().await;
    });

    let config = MonitorConfig {
        endpoints: vec![format!("ws://{addr}/websocket")],
        events: vec!["block_speed".into()],
        ..Default::default()
    };
    let notifier = Arc::new(NullNotifier::new());
    let monitor = Monitor::with_notifier(&config, notifier.clone()).unwrap();
    let shutdown = ShutdownController::new();
    let stopper = shutdown.clone();
    let run = tokio::spawn(async move { monitor.run(&shutdown).await });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while notifier.events().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "no cadence event");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Warn);
    assert_eq!(events[0].text, "Block speed is 9.00s, average is 1.00s");

    stopper.shutdown();
    timeout(Duration::from_secs(5), run)
        .await
        .expect("monitor stops on shutdown")
        .unwrap()
        .unwrap();
}
