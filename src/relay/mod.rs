//! Forwarding of tool invocations to the execution service.

mod decode;
mod downstream;
mod payload;
mod stream;

pub use decode::Utf8ChunkDecoder;
pub use downstream::{ChunkStream, ExecutionService, HttpExecutionService};
pub use payload::{
    resolve_invocation, InvocationPayload, ResolveError, MAX_TARGET_LENGTH, RUN_SYSTEM_PATH,
    RUN_WASM_PATH,
};
pub use stream::{error_frame, relay, RelayStream, DONE_FRAME};

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the execution service.
///
/// These happen after the response stream is open and are reported in-band.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not connect to execution service: {0}")]
    Connect(String),

    #[error("execution service timed out: {0}")]
    Timeout(String),

    #[error("execution service returned {0}")]
    Status(StatusCode),

    #[error("failed reading execution service response: {0}")]
    Body(String),

    #[error("failed decoding execution service response: {0}")]
    Decode(String),

    #[error("request to execution service failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        let description = describe(&err);
        if err.is_timeout() {
            RelayError::Timeout(description)
        } else if err.is_connect() {
            RelayError::Connect(description)
        } else if err.is_body() || err.is_decode() {
            RelayError::Body(description)
        } else {
            RelayError::Request(description)
        }
    }
}

/// Joins an error with its sources; reqwest keeps the useful part
/// ("Connection refused", "unexpected EOF") in the chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
