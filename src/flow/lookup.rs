use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::error::FetchError;
use super::model::WalletFlows;
use super::source::FlowSource;

pub type LookupResult = Result<WalletFlows, FetchError>;

pub enum LookupPoll {
    Pending,
    Done(LookupResult),
}

/// A wallet lookup running on a worker thread. Dropping it abandons the
/// result; the worker's send simply fails.
pub struct PendingLookup {
    pub address: String,
    started: Instant,
    timeout: Duration,
    rx: Receiver<LookupResult>,
}

pub fn spawn_lookup(source: Arc<dyn FlowSource>, address: String, timeout: Duration) -> PendingLookup {
    let (tx, rx) = mpsc::channel();
    let worker_address = address.clone();

    info!(address = %address, "starting wallet lookup");
    thread::spawn(move || {
        let result = fetch_wallet_flows(source.as_ref(), &worker_address);
        let _ = tx.send(result);
    });

    PendingLookup {
        address,
        started: Instant::now(),
        timeout,
        rx,
    }
}

fn fetch_wallet_flows(source: &dyn FlowSource, address: &str) -> LookupResult {
    let inflows = source.inflows(address)?;
    let outflows = source.outflows(address)?;
    Ok(WalletFlows {
        address: address.to_owned(),
        inflows: inflows.data,
        outflows: outflows.data,
    })
}

impl PendingLookup {
    pub fn poll(&self) -> LookupPoll {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&self, now: Instant) -> LookupPoll {
        match self.rx.try_recv() {
            Ok(result) => LookupPoll::Done(result),
            Err(TryRecvError::Empty) => {
                if now.saturating_duration_since(self.started) >= self.timeout {
                    warn!(address = %self.address, "abandoning wallet lookup after timeout");
                    LookupPoll::Done(Err(FetchError::TimedOut {
                        address: self.address.clone(),
                        seconds: self.timeout.as_secs(),
                    }))
                } else {
                    LookupPoll::Pending
                }
            }
            Err(TryRecvError::Disconnected) => LookupPoll::Done(Err(FetchError::WorkerLost {
                address: self.address.clone(),
            })),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::model::{FlowDirection, FlowResponse};
    use crate::flow::source::FixtureSource;

    struct SlowSource;

    impl FlowSource for SlowSource {
        fn fetch(&self, _direction: FlowDirection, _address: &str) -> Result<FlowResponse, FetchError> {
            thread::sleep(Duration::from_secs(2));
            Ok(FlowResponse::default())
        }
    }

    struct FailingOutflows;

    impl FlowSource for FailingOutflows {
        fn fetch(&self, direction: FlowDirection, address: &str) -> Result<FlowResponse, FetchError> {
            match direction {
                FlowDirection::Inflow => FixtureSource.fetch(direction, address),
                FlowDirection::Outflow => Err(FetchError::Status {
                    direction: direction.label(),
                    address: address.to_owned(),
                    status: 502,
                }),
            }
        }
    }

    fn wait_for(lookup: &PendingLookup) -> LookupResult {
        loop {
            match lookup.poll() {
                LookupPoll::Done(result) => return result,
                LookupPoll::Pending => thread::sleep(Duration::from_millis(5)),
            }
        }
    }

    #[test]
    fn completed_lookup_carries_both_directions() {
        let lookup = spawn_lookup(Arc::new(FixtureSource), "bc1qs".to_owned(), Duration::from_secs(30));
        let flows = wait_for(&lookup).expect("fixture lookup succeeds");

        assert_eq!(flows.address, "bc1qs");
        assert_eq!(flows.inflows.len(), 2);
        assert_eq!(flows.outflows.len(), 2);
    }

    #[test]
    fn failure_in_either_direction_abandons_the_lookup() {
        let lookup = spawn_lookup(Arc::new(FailingOutflows), "bc1qs".to_owned(), Duration::from_secs(30));

        assert!(matches!(wait_for(&lookup), Err(FetchError::Status { status: 502, .. })));
    }

    #[test]
    fn lookup_past_its_deadline_times_out() {
        let lookup = spawn_lookup(Arc::new(SlowSource), "bc1qslow".to_owned(), Duration::from_secs(1));
        let later = Instant::now() + Duration::from_secs(5);

        assert!(matches!(
            lookup.poll_at(later),
            LookupPoll::Done(Err(FetchError::TimedOut { seconds: 1, .. }))
        ));
    }
}
