//! Processing task: receive, decode, derive, encode, write

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::endpoint::{ActuatorLink, TelemetrySource};
use crate::pipeline::Pipeline;
use crate::types::BridgeState;

/// Pause after the first receive error; doubles with each consecutive error.
const BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Longest pause after consecutive receive errors.
const MAX_BACKOFF: Duration = Duration::from_millis(1600);

fn backoff_after(consecutive_errors: u32) -> Duration {
    let doublings = consecutive_errors.saturating_sub(1).min(4);
    (BASE_BACKOFF * (1 << doublings)).min(MAX_BACKOFF)
}

/// Run the bridge loop until cancelled.
///
/// The task is the only writer of `state` and the sole owner of both
/// endpoints. On exit it closes the link, then the source.
pub(crate) async fn run<S, L>(
    mut source: S,
    mut link: L,
    mut pipeline: Pipeline,
    state: Arc<watch::Sender<BridgeState>>,
    cancel: CancellationToken,
) where
    S: TelemetrySource,
    L: ActuatorLink,
{
    info!("Processing task started ({:?} frames)", pipeline.layout().variant);
    let mut packet_count = 0u64;
    let mut dropped_count = 0u64;
    let mut error_count = 0u32;

    loop {
        if cancel.is_cancelled() {
            info!("Processing task cancelled");
            break;
        }

        // Allow cancellation while waiting for a datagram
        let received = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Processing task cancelled during receive");
                break;
            }
            result = source.receive() => result,
        };

        let datagram = match received {
            Ok(datagram) => {
                error_count = 0;
                datagram
            }
            Err(e) if e.is_timeout() => {
                debug!("No telemetry this tick: {}", e);
                continue;
            }
            Err(e) => {
                // UDP sockets do not disconnect; keep trying after a short pause
                error_count = error_count.saturating_add(1);
                warn!("Receive error ({} in a row): {}", error_count, e);

                let backoff = backoff_after(error_count);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => continue,
                }
            }
        };

        let len = datagram.len();
        let Some(processed) = pipeline.process(datagram) else {
            dropped_count += 1;
            debug!("Dropped {}-byte datagram ({} dropped so far)", len, dropped_count);
            continue;
        };

        let written = link.write(processed.frame).await;
        packet_count += 1;

        if packet_count == 1 {
            info!("Receiving {}-byte telemetry packets", len);
        }
        trace!(
            "Packet {}: active={}, write_ok={}, frame={:?}",
            packet_count,
            processed.motion.is_active,
            written,
            String::from_utf8_lossy(processed.frame).trim_end()
        );

        let record = processed.record;
        let motion = processed.motion;
        state.send_modify(|snapshot| {
            snapshot.is_running = true;
            snapshot.is_connected = true;
            snapshot.packet_count = packet_count;
            snapshot.last_telemetry = record;
            snapshot.last_gforces = motion.gforces;
            snapshot.last_write_succeeded = written;
            snapshot.is_active = motion.is_active;
        });
    }

    link.close();
    source.close();

    info!(
        "Processing task ended ({} packets forwarded, {} dropped)",
        packet_count, dropped_count
    );
}
