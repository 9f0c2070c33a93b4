mod error;
mod lookup;
pub mod model;
mod source;

pub use error::FetchError;
pub use lookup::{LookupPoll, PendingLookup, spawn_lookup};
pub use model::{ConnectionRecord, FlowDirection, WalletFlows};
pub use source::{FixtureSource, FlowSource, HttpSource};
