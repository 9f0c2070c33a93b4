use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    Inflow,
    Outflow,
}

impl FlowDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Inflow => "inflows",
            Self::Outflow => "outflows",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    #[serde(default)]
    pub tx_amount: f64,
    #[serde(default)]
    pub date_time: String,
    #[serde(default)]
    pub transaction_id: String,
}

/// One counterparty aggregate as returned by a flow source. Inflow records
/// carry `beneficiary_address`, outflow records carry `payer_address`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConnectionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_address: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub transaction_type: String,
}

impl ConnectionRecord {
    pub fn counterparty(&self, direction: FlowDirection) -> Option<&str> {
        let address = match direction {
            FlowDirection::Inflow => self.beneficiary_address.as_deref(),
            FlowDirection::Outflow => self.payer_address.as_deref(),
        };
        address.filter(|address| !address.is_empty())
    }

    pub fn entity_label(&self) -> &str {
        if self.entity_name.is_empty() {
            "Unknown"
        } else {
            self.entity_name.as_str()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FlowResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Vec<ConnectionRecord>,
}

/// Both directions of one completed wallet lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletFlows {
    pub address: String,
    pub inflows: Vec<ConnectionRecord>,
    pub outflows: Vec<ConnectionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let record: ConnectionRecord =
            serde_json::from_str(r#"{"payer_address": "bc1qpayer", "amount": 1.5}"#)
                .expect("record parses");

        assert_eq!(record.counterparty(FlowDirection::Outflow), Some("bc1qpayer"));
        assert_eq!(record.counterparty(FlowDirection::Inflow), None);
        assert!(record.transactions.is_empty());
        assert_eq!(record.entity_label(), "Unknown");
    }

    #[test]
    fn empty_counterparty_counts_as_absent() {
        let record: ConnectionRecord =
            serde_json::from_str(r#"{"beneficiary_address": "", "entity_name": "Whitebit"}"#)
                .expect("record parses");

        assert_eq!(record.counterparty(FlowDirection::Inflow), None);
        assert_eq!(record.entity_label(), "Whitebit");
    }
}
