use crate::flow::{ConnectionRecord, FlowDirection};

use super::store::GraphState;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
    pub address: String,
    pub entity_name: Option<String>,
    pub inflows: Vec<ConnectionRecord>,
    pub outflows: Vec<ConnectionRecord>,
    pub total_in: f64,
    pub total_out: f64,
}

impl NodeDetails {
    /// Records of the last lookup whose counterparty is `address`.
    pub fn derive(state: &GraphState, address: &str) -> Self {
        let matching = |records: &[ConnectionRecord], direction: FlowDirection| {
            records
                .iter()
                .filter(|record| record.counterparty(direction) == Some(address))
                .cloned()
                .collect::<Vec<_>>()
        };

        let inflows = matching(state.inflows(), FlowDirection::Inflow);
        let outflows = matching(state.outflows(), FlowDirection::Outflow);
        let total_in = inflows.iter().map(|record| record.amount).sum();
        let total_out = outflows.iter().map(|record| record.amount).sum();

        Self {
            address: address.to_owned(),
            entity_name: state.node(address).map(|node| node.entity_name.clone()),
            inflows,
            outflows,
            total_in,
            total_out,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inflows.is_empty() && self.outflows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FixtureSource, FlowSource, WalletFlows};
    use crate::graph::normalize::apply_wallet_flows;
    use crate::graph::store::GraphStore;

    fn fixture_store() -> GraphStore {
        let source = FixtureSource;
        let mut store = GraphStore::new();
        apply_wallet_flows(
            &mut store,
            WalletFlows {
                address: "bc1qsearched".to_owned(),
                inflows: source.inflows("bc1qsearched").expect("fixture").data,
                outflows: source.outflows("bc1qsearched").expect("fixture").data,
            },
        );
        store
    }

    #[test]
    fn counterparty_details_sum_record_amounts() {
        let store = fixture_store();
        let details = NodeDetails::derive(store.state(), "bc1qng0keqn7cq6p8qdt4rjnzdxrygnzq7nd0pju8q");

        assert_eq!(details.entity_name.as_deref(), Some("Changenow"));
        assert_eq!(details.inflows.len(), 1);
        assert!(details.outflows.is_empty());
        assert!((details.total_in - 2.4163156).abs() < 1e-12);
        assert_eq!(details.total_out, 0.0);
    }

    #[test]
    fn absent_selection_derives_an_empty_view() {
        let mut store = fixture_store();
        store.set_selected_node(Some("bc1qmissing".to_owned()));

        let details = NodeDetails::derive(store.state(), "bc1qmissing");

        assert_eq!(store.state().selected_node(), Some("bc1qmissing"));
        assert!(details.is_empty());
        assert_eq!(details.entity_name, None);
        assert_eq!(details.total_in, 0.0);
        assert_eq!(details.total_out, 0.0);
    }
}
