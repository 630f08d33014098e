//! Lifecycle tests for the bridge
//!
//! These tests drive the processing task with scripted sources and recording
//! links, verifying state publication, failure handling, and shutdown order.

use super::*;
use crate::config::{ReceiverConfig, SerialConfig};
use crate::test_utils::{
    EventLog, LINK_CLOSED, LinkProbe, PacketBuilder, RecordingLink, SOURCE_CLOSED, ScriptedSource,
    SourceFeed,
};
use futures::StreamExt;
use std::time::Duration;

const RECEIVE_TIMEOUT: Duration = Duration::from_millis(20);
const WAIT_LIMIT: Duration = Duration::from_secs(2);

struct Harness {
    bridge: Bridge,
    feed: SourceFeed,
    probe: LinkProbe,
    events: EventLog,
}

async fn running_bridge(layout: PacketLayout) -> Harness {
    let events = EventLog::new();
    let (source, feed) = ScriptedSource::new(RECEIVE_TIMEOUT, &events);
    let (link, probe) = RecordingLink::new(&events);

    let mut bridge = Bridge::new();
    bridge.start_with(source, link, layout).await.expect("start_with should succeed");

    Harness { bridge, feed, probe, events }
}

/// Wait until the published state satisfies `done`.
async fn wait_for(handle: &StateHandle, done: impl Fn(&BridgeState) -> bool) -> BridgeState {
    let mut handle = handle.clone();
    tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let state = handle.snapshot();
            if done(&state) {
                return state;
            }
            if handle.changed().await.is_none() {
                panic!("bridge dropped while waiting");
            }
        }
    })
    .await
    .expect("timed out waiting for bridge state")
}

fn driving(rpm: f32) -> Vec<u8> {
    PacketBuilder::new().rpm(rpm).accel(0.0, 0.0, -9.81).velocity(0.0, 0.0, 20.0).build()
}

#[tokio::test]
async fn forwards_packets_and_publishes_state() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    assert_eq!(harness.bridge.phase(), BridgePhase::Running);
    assert_eq!(handle.link_status(), crate::LinkStatus::WaitingForData);

    for rpm in [3000.0, 3100.0, 3200.0] {
        assert!(harness.feed.send(driving(rpm)));
    }

    let state = wait_for(&handle, |s| s.packet_count == 3).await;

    assert!(state.is_running);
    assert!(state.is_connected);
    assert!(state.is_active);
    assert!(state.last_write_succeeded);
    assert_eq!(state.last_telemetry.engine_rpm, 3200.0);
    assert_eq!(state.last_gforces.longitudinal, 1.0);
    assert_eq!(handle.link_status(), crate::LinkStatus::Connected);
    assert_eq!(harness.probe.frames(), vec!["1.000,0.000,1.000\n"; 3]);
}

#[tokio::test]
async fn short_datagrams_change_nothing() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    harness.feed.send(vec![0u8; 100]);
    harness.feed.send(driving(4000.0));

    let state = wait_for(&handle, |s| s.packet_count == 1).await;

    assert_eq!(state.last_telemetry.engine_rpm, 4000.0);
    assert_eq!(harness.probe.attempts(), 1);
}

#[tokio::test]
async fn write_failures_are_recorded_and_writes_continue() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    harness.probe.set_failing(true);
    harness.feed.send(driving(2000.0));
    let state = wait_for(&handle, |s| s.packet_count == 1).await;
    assert!(!state.last_write_succeeded);
    assert!(state.is_connected);

    harness.probe.set_failing(false);
    harness.feed.send(driving(2100.0));
    let state = wait_for(&handle, |s| s.packet_count == 2).await;
    assert!(state.last_write_succeeded);
    assert_eq!(harness.probe.attempts(), 2);
}

#[tokio::test]
async fn silence_keeps_connected_flag() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    harness.feed.send(driving(2500.0));
    wait_for(&handle, |s| s.is_connected).await;

    // Several receive timeouts pass without data
    tokio::time::sleep(RECEIVE_TIMEOUT * 5).await;

    let state = handle.snapshot();
    assert!(state.is_running);
    assert!(state.is_connected);
    assert_eq!(state.packet_count, 1);
}

#[tokio::test]
async fn receive_errors_back_off_without_touching_state() {
    let mut harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    harness.feed.send(driving(3000.0));
    let before = wait_for(&handle, |s| s.packet_count == 1).await;

    harness.feed.fail(std::io::ErrorKind::ConnectionReset);
    harness.feed.send(driving(3100.0));

    // Still inside the first backoff pause
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(handle.snapshot(), before);

    let state = wait_for(&handle, |s| s.packet_count == 2).await;
    assert_eq!(state.last_telemetry.engine_rpm, 3100.0);
    assert!(state.is_connected);
    assert_eq!(harness.probe.frames().len(), 2);

    // Second consecutive error pauses 200 ms; stop must not wait it out
    for _ in 0..3 {
        harness.feed.fail(std::io::ErrorKind::ConnectionReset);
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = std::time::Instant::now();
    harness.bridge.stop().await.expect("stop during backoff");
    assert!(started.elapsed() < Duration::from_millis(100), "stop waited for backoff");
    assert_eq!(harness.events.events(), vec![LINK_CLOSED, SOURCE_CLOSED]);
}

#[tokio::test]
async fn extended_layout_forwards_inputs() {
    let harness = running_bridge(PacketLayout::extended()).await;
    let handle = harness.bridge.state();

    let packet =
        PacketBuilder::new().rpm(800.0).inputs(255, 0, -5).suspension(0.2, 0.4, 0.6, 0.8).build();
    harness.feed.send(packet);

    let state = wait_for(&handle, |s| s.packet_count == 1).await;

    assert!(!state.is_active);
    assert_eq!(state.last_telemetry.inputs.map(|i| i.steering), Some(-5));
    assert_eq!(
        harness.probe.frames(),
        vec!["0.000,0.000,1.000,100.0,0.0,-5,0.20,0.40,0.60,0.80\n"]
    );
}

#[tokio::test]
async fn stop_closes_link_then_source_and_resets_state() {
    let mut harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();

    harness.feed.send(driving(3000.0));
    wait_for(&handle, |s| s.packet_count == 1).await;

    harness.bridge.stop().await.expect("stop should succeed");

    assert_eq!(harness.events.events(), vec![LINK_CLOSED, SOURCE_CLOSED]);
    assert_eq!(handle.snapshot(), BridgeState::default());
    assert_eq!(handle.phase(), BridgePhase::Stopped);
    assert_eq!(handle.link_status(), crate::LinkStatus::Stopped);
    assert!(!harness.bridge.is_running());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let mut bridge = Bridge::new();
    bridge.stop().await.expect("stopping a new bridge is a no-op");

    let mut harness = running_bridge(PacketLayout::minimal()).await;
    harness.bridge.stop().await.expect("first stop");
    harness.bridge.stop().await.expect("second stop");

    assert_eq!(harness.events.count(LINK_CLOSED), 1);
    assert_eq!(harness.events.count(SOURCE_CLOSED), 1);
}

#[tokio::test]
async fn start_while_running_is_rejected() {
    let mut harness = running_bridge(PacketLayout::minimal()).await;

    let events = EventLog::new();
    let (source, _feed) = ScriptedSource::new(RECEIVE_TIMEOUT, &events);
    let (link, _probe) = RecordingLink::new(&events);
    let result = harness.bridge.start_with(source, link, PacketLayout::minimal()).await;

    assert!(matches!(result, Err(BridgeError::AlreadyRunning { .. })));
    assert_eq!(harness.bridge.phase(), BridgePhase::Running);

    harness.bridge.stop().await.unwrap();
}

#[tokio::test]
async fn restart_after_stop_counts_from_zero() {
    let mut harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();
    harness.feed.send(driving(3000.0));
    harness.feed.send(driving(3000.0));
    wait_for(&handle, |s| s.packet_count == 2).await;
    harness.bridge.stop().await.unwrap();

    let events = EventLog::new();
    let (source, feed) = ScriptedSource::new(RECEIVE_TIMEOUT, &events);
    let (link, probe) = RecordingLink::new(&events);
    harness.bridge.start_with(source, link, PacketLayout::minimal()).await.unwrap();

    let state = handle.snapshot();
    assert!(state.is_running);
    assert_eq!(state.packet_count, 0);
    assert!(!state.is_connected);

    feed.send(driving(3000.0));
    wait_for(&handle, |s| s.packet_count == 1).await;
    assert_eq!(probe.frames().len(), 1);

    harness.bridge.stop().await.unwrap();
}

#[tokio::test]
async fn invalid_config_leaves_bridge_stopped() {
    let mut bridge = Bridge::new();
    let mut config = BridgeConfig::default();
    config.serial.baud_rate = 0;

    let result = bridge.start(&config).await;

    assert!(matches!(result, Err(BridgeError::Config { .. })));
    assert_eq!(bridge.phase(), BridgePhase::Stopped);
    assert!(!bridge.snapshot().is_running);
}

#[tokio::test]
async fn serial_failure_releases_udp_port() {
    // Reserve a free port, then release it for the bridge
    let port = {
        let probe = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let config = BridgeConfig {
        network: ReceiverConfig { port, ..ReceiverConfig::default() },
        serial: SerialConfig {
            device: "/dev/motionlink-missing-controller".into(),
            settle_delay_ms: 0,
            ..SerialConfig::default()
        },
        ..BridgeConfig::default()
    };

    let mut bridge = Bridge::new();
    let result = bridge.start(&config).await;

    assert!(matches!(result, Err(BridgeError::SerialOpen { .. })));
    assert_eq!(bridge.phase(), BridgePhase::Stopped);

    // The receiver opened during the failed start must be closed
    let rebound = crate::endpoints::UdpReceiver::bind(&config.network).await;
    assert!(rebound.is_ok(), "UDP port still held after failed start");
}

#[tokio::test]
async fn dropping_a_running_bridge_cancels_the_task() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let events = harness.events.clone();

    drop(harness);

    tokio::time::timeout(WAIT_LIMIT, async {
        while events.count(SOURCE_CLOSED) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("processing task did not shut down after drop");

    assert_eq!(events.events(), vec![LINK_CLOSED, SOURCE_CLOSED]);
}

#[tokio::test]
async fn updates_stream_yields_snapshots() {
    let harness = running_bridge(PacketLayout::minimal()).await;
    let mut updates = harness.bridge.state().updates();

    let first = updates.next().await.expect("current snapshot");
    assert!(first.is_running);

    harness.feed.send(driving(3000.0));
    let next = tokio::time::timeout(WAIT_LIMIT, updates.next())
        .await
        .expect("update within limit")
        .expect("stream open");
    assert_eq!(next.packet_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_reads_never_mix_packets() {
    let mut harness = running_bridge(PacketLayout::minimal()).await;
    let handle = harness.bridge.state();
    const PACKETS: u32 = 300;

    let reader = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let mut checked = 0u32;
            loop {
                let state = handle.snapshot();
                if state.packet_count > 0 {
                    // Every field of packet i encodes i
                    let index = state.last_telemetry.velocity_x;
                    assert_eq!(state.last_telemetry.engine_rpm, 2000.0 + index);
                    assert_eq!(state.last_telemetry.accel_lateral, index);
                    assert_eq!(f64::from(index) + 1.0, state.packet_count as f64);
                    checked += 1;
                }
                if state.packet_count == u64::from(PACKETS) {
                    return checked;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for i in 0..PACKETS {
        let index = i as f32;
        let packet = PacketBuilder::new()
            .rpm(2000.0 + index)
            .accel(index, 0.0, 0.0)
            .velocity(index, 0.0, 0.0)
            .build();
        harness.feed.send(packet);
    }

    let checked = tokio::time::timeout(Duration::from_secs(10), reader)
        .await
        .expect("reader finished")
        .expect("reader assertions held");
    assert!(checked > 0);

    harness.bridge.stop().await.unwrap();
}
