mod details;
mod normalize;
mod store;

pub use details::NodeDetails;
pub use normalize::apply_wallet_flows;
pub use store::{Edge, GraphState, GraphStore, Node, Revisions};
