use tracing::debug;

use crate::flow::{ConnectionRecord, FlowDirection, WalletFlows};

use super::store::{Edge, GraphStore, Node, SliceChanges};

/// Nodes and edges contributed by one direction of a lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowBatch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl FlowBatch {
    /// Nodes go in before edges so every edge finds both endpoints.
    pub fn apply_to(self, store: &mut GraphStore) -> SliceChanges {
        let mut changes = SliceChanges::default();
        for node in self.nodes {
            changes |= store.add_node(node);
        }
        for edge in self.edges {
            changes |= store.add_link(edge);
        }
        changes
    }
}

/// Expands one direction of a lookup. The searched address is the first
/// node of the batch.
pub fn expand_direction(
    source_address: &str,
    direction: FlowDirection,
    records: &[ConnectionRecord],
) -> FlowBatch {
    let mut batch = FlowBatch {
        nodes: vec![Node::unknown(source_address)],
        edges: Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        let Some(counterparty) = record.counterparty(direction) else {
            debug!(
                direction = direction.label(),
                index, "skipping record without counterparty address"
            );
            continue;
        };

        batch.nodes.push(Node::new(counterparty, record.entity_label()));

        let (source, target) = match direction {
            FlowDirection::Inflow => (counterparty, source_address),
            FlowDirection::Outflow => (source_address, counterparty),
        };

        batch.edges.extend(record.transactions.iter().map(|transaction| Edge {
            source: source.to_owned(),
            target: target.to_owned(),
            amount: transaction.tx_amount,
            date: transaction.date_time.clone(),
            transaction_id: transaction.transaction_id.clone(),
        }));
    }

    batch
}

/// Source node first, then both record lists are replaced, then the
/// inflow and outflow batches are merged in.
pub fn apply_wallet_flows(store: &mut GraphStore, flows: WalletFlows) -> SliceChanges {
    let inflows = expand_direction(&flows.address, FlowDirection::Inflow, &flows.inflows);
    let outflows = expand_direction(&flows.address, FlowDirection::Outflow, &flows.outflows);

    let mut changes = store.add_node(Node::unknown(flows.address));
    changes |= store.set_inflows(flows.inflows);
    changes |= store.set_outflows(flows.outflows);
    changes |= inflows.apply_to(store);
    changes |= outflows.apply_to(store);
    changes
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::flow::model::Transaction;
    use crate::graph::store::GraphState;

    fn record(direction: FlowDirection, counterparty: Option<&str>, txs: &[(&str, f64)]) -> ConnectionRecord {
        let address = counterparty.map(str::to_owned);
        let (beneficiary_address, payer_address) = match direction {
            FlowDirection::Inflow => (address, None),
            FlowDirection::Outflow => (None, address),
        };
        ConnectionRecord {
            beneficiary_address,
            payer_address,
            amount: txs.iter().map(|(_, amount)| amount).sum(),
            date: "2022-07-17 14:10:09".to_owned(),
            transactions: txs
                .iter()
                .map(|(id, amount)| Transaction {
                    tx_amount: *amount,
                    date_time: "2022-07-17 14:10:09".to_owned(),
                    transaction_id: (*id).to_owned(),
                })
                .collect(),
            entity_name: String::new(),
            token_type: "BTC".to_owned(),
            transaction_type: "Normal Tx".to_owned(),
        }
    }

    fn scenario() -> WalletFlows {
        WalletFlows {
            address: "S".to_owned(),
            inflows: vec![record(FlowDirection::Inflow, Some("A"), &[("tx-a", 0.5)])],
            outflows: vec![record(FlowDirection::Outflow, Some("B"), &[("tx-b", 1.2)])],
        }
    }

    fn node_set(state: &GraphState) -> BTreeSet<String> {
        state.nodes().iter().map(|node| node.id.clone()).collect()
    }

    fn edge_set(state: &GraphState) -> BTreeSet<(String, String, String)> {
        state
            .links()
            .iter()
            .map(|edge| {
                (
                    edge.source.clone(),
                    edge.target.clone(),
                    edge.transaction_id.clone(),
                )
            })
            .collect()
    }

    fn replay(batches: Vec<FlowBatch>) -> GraphState {
        let mut store = GraphStore::new();
        for batch in batches {
            batch.apply_to(&mut store);
        }
        store.state().clone()
    }

    #[test]
    fn single_lookup_yields_three_nodes_and_two_edges() {
        let mut store = GraphStore::new();
        apply_wallet_flows(&mut store, scenario());
        let state = store.state();

        assert_eq!(state.node_count(), 3);
        assert_eq!(state.edge_count(), 2);
        assert_eq!(node_set(state), BTreeSet::from(["A", "B", "S"].map(str::to_owned)));

        let inflow = &state.links()[0];
        assert_eq!((inflow.source.as_str(), inflow.target.as_str()), ("A", "S"));
        assert_eq!(inflow.amount, 0.5);
        let outflow = &state.links()[1];
        assert_eq!((outflow.source.as_str(), outflow.target.as_str()), ("S", "B"));
        assert_eq!(outflow.amount, 1.2);
    }

    #[test]
    fn repeated_lookup_is_idempotent() {
        let mut store = GraphStore::new();
        apply_wallet_flows(&mut store, scenario());
        let once = store.state().clone();

        let changes = apply_wallet_flows(&mut store, scenario());

        assert!(!changes.topology);
        assert_eq!(store.state().node_count(), 3);
        assert_eq!(store.state().edge_count(), 2);
        assert_eq!(store.state().links(), once.links());
        assert_eq!(store.state().nodes(), once.nodes());
    }

    #[test]
    fn inflow_and_outflow_batches_commute() {
        let flows = scenario();
        let inflows = expand_direction("S", FlowDirection::Inflow, &flows.inflows);
        let outflows = expand_direction("S", FlowDirection::Outflow, &flows.outflows);

        let forward = replay(vec![inflows.clone(), outflows.clone()]);
        let backward = replay(vec![outflows, inflows]);

        assert_eq!(node_set(&forward), node_set(&backward));
        assert_eq!(edge_set(&forward), edge_set(&backward));
    }

    #[test]
    fn every_transaction_becomes_a_directed_edge() {
        let inflow = record(FlowDirection::Inflow, Some("A"), &[("t1", 0.1), ("t2", 0.2), ("t3", 0.3)]);
        let outflow = record(FlowDirection::Outflow, Some("B"), &[("t4", 1.0), ("t5", 2.0)]);

        let state = replay(vec![
            expand_direction("S", FlowDirection::Inflow, &[inflow]),
            expand_direction("S", FlowDirection::Outflow, &[outflow]),
        ]);

        let inbound = state.links().iter().filter(|edge| edge.target == "S").collect::<Vec<_>>();
        let outbound = state.links().iter().filter(|edge| edge.source == "S").collect::<Vec<_>>();
        assert_eq!(inbound.len(), 3);
        assert!(inbound.iter().all(|edge| edge.source == "A"));
        assert_eq!(outbound.len(), 2);
        assert!(outbound.iter().all(|edge| edge.target == "B"));
    }

    #[test]
    fn records_without_counterparty_are_skipped_individually() {
        let records = vec![
            record(FlowDirection::Inflow, None, &[("lost", 4.0)]),
            record(FlowDirection::Inflow, Some("A"), &[("kept", 0.5)]),
        ];

        let state = replay(vec![expand_direction("S", FlowDirection::Inflow, &records)]);

        assert_eq!(node_set(&state), BTreeSet::from(["A", "S"].map(str::to_owned)));
        assert_eq!(state.edge_count(), 1);
        assert_eq!(state.links()[0].transaction_id, "kept");
    }

    #[test]
    fn record_lists_are_replaced_not_merged() {
        let mut store = GraphStore::new();
        apply_wallet_flows(&mut store, scenario());
        apply_wallet_flows(
            &mut store,
            WalletFlows {
                address: "T".to_owned(),
                inflows: Vec::new(),
                outflows: vec![record(FlowDirection::Outflow, Some("C"), &[("tx-c", 3.0)])],
            },
        );

        let state = store.state();
        assert!(state.inflows().is_empty());
        assert_eq!(state.outflows().len(), 1);
        assert_eq!(state.node_count(), 5);
        assert_eq!(state.edge_count(), 3);
    }

    #[test]
    fn counterparty_label_comes_from_the_record() {
        let mut labelled = record(FlowDirection::Outflow, Some("B"), &[("tx", 1.0)]);
        labelled.entity_name = "Whitebit".to_owned();

        let state = replay(vec![expand_direction("S", FlowDirection::Outflow, &[labelled])]);

        assert_eq!(state.node("B").map(|node| node.entity_name.as_str()), Some("Whitebit"));
        assert_eq!(state.node("S").map(|node| node.entity_name.as_str()), Some("Unknown"));
    }
}
