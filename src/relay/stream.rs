//! Producer/consumer relay between the execution service and one client.

use super::{ExecutionService, InvocationPayload, RelayError, Utf8ChunkDecoder};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Terminal frame after a clean downstream completion.
pub const DONE_FRAME: &str = "data: DONE\n\n";

/// Body of a `/stream` response.
pub type RelayStream = ReceiverStream<Result<Bytes, Infallible>>;

/// Terminal frame carrying a failure. Always a single line.
pub fn error_frame(err: &RelayError) -> String {
    let message = err.to_string().replace(['\r', '\n'], " ");
    format!("data: ERROR: {}\n\n", message)
}

enum Interrupted {
    ClientGone,
    Failed(RelayError),
}

impl From<RelayError> for Interrupted {
    fn from(err: RelayError) -> Self {
        Interrupted::Failed(err)
    }
}

/// Starts relaying `payload` and returns the client side of the relay.
///
/// A spawned producer owns the downstream connection and hands chunks over a
/// channel holding at most one chunk. Dropping the returned stream makes the
/// producer stop and release the connection.
pub fn relay(service: Arc<dyn ExecutionService>, payload: InvocationPayload) -> RelayStream {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let outcome = tokio::select! {
            outcome = pump(service.as_ref(), &payload, &tx) => outcome,
            _ = tx.closed() => Err(Interrupted::ClientGone),
        };

        let frame = match outcome {
            Ok(()) => Bytes::from_static(DONE_FRAME.as_bytes()),
            Err(Interrupted::Failed(err)) => {
                warn!("Relay to {} failed: {}", payload.endpoint(), err);
                Bytes::from(error_frame(&err))
            }
            Err(Interrupted::ClientGone) => {
                debug!(
                    "Client disconnected, abandoning relay to {}",
                    payload.endpoint()
                );
                return;
            }
        };
        let _ = tx.send(Ok(frame)).await;
    });

    ReceiverStream::new(rx)
}

async fn pump(
    service: &dyn ExecutionService,
    payload: &InvocationPayload,
    tx: &mpsc::Sender<Result<Bytes, Infallible>>,
) -> Result<(), Interrupted> {
    let mut chunks = service.invoke(payload).await?;
    let mut decoder = Utf8ChunkDecoder::default();

    while let Some(chunk) = chunks.next().await {
        let text = decoder.push(&chunk?)?;
        if text.trim().is_empty() {
            continue;
        }
        tx.send(Ok(Bytes::from(text)))
            .await
            .map_err(|_| Interrupted::ClientGone)?;
    }

    decoder.finish()?;
    Ok(())
}
