use std::time::Duration;

use tracing::debug;

use super::error::FetchError;
use super::model::{FlowDirection, FlowResponse};

const INFLOWS_FIXTURE: &str = include_str!("fixtures/inflows.json");
const OUTFLOWS_FIXTURE: &str = include_str!("fixtures/outflows.json");

pub trait FlowSource: Send + Sync {
    fn fetch(&self, direction: FlowDirection, address: &str) -> Result<FlowResponse, FetchError>;

    fn inflows(&self, address: &str) -> Result<FlowResponse, FetchError> {
        self.fetch(FlowDirection::Inflow, address)
    }

    fn outflows(&self, address: &str) -> Result<FlowResponse, FetchError> {
        self.fetch(FlowDirection::Outflow, address)
    }
}

/// Serves the bundled demo payloads for every address.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixtureSource;

impl FlowSource for FixtureSource {
    fn fetch(&self, direction: FlowDirection, address: &str) -> Result<FlowResponse, FetchError> {
        let raw = match direction {
            FlowDirection::Inflow => INFLOWS_FIXTURE,
            FlowDirection::Outflow => OUTFLOWS_FIXTURE,
        };
        debug!(address, direction = direction.label(), "serving fixture payload");
        serde_json::from_str(raw).map_err(|error| FetchError::decode(direction, address, error))
    }
}

pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, direction: FlowDirection, address: &str) -> String {
        format!("{}/{}/{address}", self.base_url, direction.label())
    }
}

impl FlowSource for HttpSource {
    fn fetch(&self, direction: FlowDirection, address: &str) -> Result<FlowResponse, FetchError> {
        let url = self.endpoint(direction, address);
        debug!(%url, "requesting flows");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|error| FetchError::transport(direction, address, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                direction: direction.label(),
                address: address.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|error| FetchError::transport(direction, address, error))?;
        serde_json::from_str(&body).map_err(|error| FetchError::decode(direction, address, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_carry_one_side_of_the_flow_each() {
        let source = FixtureSource;
        let inflows = source.inflows("bc1qsearched").expect("inflow fixture parses");
        let outflows = source.outflows("bc1qsearched").expect("outflow fixture parses");

        assert_eq!(inflows.message, "success");
        assert_eq!(inflows.data.len(), 2);
        assert!(
            inflows
                .data
                .iter()
                .all(|record| record.counterparty(FlowDirection::Inflow).is_some())
        );
        assert_eq!(outflows.data.len(), 2);
        assert!(
            outflows
                .data
                .iter()
                .all(|record| record.counterparty(FlowDirection::Outflow).is_some())
        );
    }

    #[test]
    fn http_endpoints_follow_the_route_layout() {
        let source = HttpSource::new("http://localhost:3000/api/", Duration::from_secs(1))
            .expect("client builds");

        assert_eq!(
            source.endpoint(FlowDirection::Inflow, "bc1qabc"),
            "http://localhost:3000/api/inflows/bc1qabc"
        );
        assert_eq!(
            source.endpoint(FlowDirection::Outflow, "bc1qabc"),
            "http://localhost:3000/api/outflows/bc1qabc"
        );
    }
}
