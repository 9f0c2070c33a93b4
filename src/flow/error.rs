use thiserror::Error;

use super::model::FlowDirection;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {direction} of {address} failed: {source}")]
    Transport {
        direction: &'static str,
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{direction} endpoint for {address} answered with status {status}")]
    Status {
        direction: &'static str,
        address: String,
        status: u16,
    },

    #[error("could not decode {direction} payload for {address}: {source}")]
    Decode {
        direction: &'static str,
        address: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("lookup for {address} timed out after {seconds}s")]
    TimedOut { address: String, seconds: u64 },

    #[error("lookup worker for {address} stopped without a result")]
    WorkerLost { address: String },
}

impl FetchError {
    pub(super) fn transport(direction: FlowDirection, address: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            direction: direction.label(),
            address: address.to_owned(),
            source,
        }
    }

    pub(super) fn decode(direction: FlowDirection, address: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            direction: direction.label(),
            address: address.to_owned(),
            source,
        }
    }
}
