use std::sync::Arc;

use eframe::egui::{self, RichText, Ui};

use crate::flow::{ConnectionRecord, FlowDirection};
use crate::graph::NodeDetails;
use crate::util::{format_btc, shorten_address};

use super::super::{DetailsCache, ViewModel};

impl ViewModel {
    /// Re-derives only when a store revision moved since the cached copy.
    pub(in crate::app) fn selected_details(&mut self) -> Option<Arc<NodeDetails>> {
        let revisions = self.store.revisions();
        if let Some(cached) = &self.details_cache
            && cached.revisions == revisions
        {
            return Some(Arc::clone(&cached.details));
        }

        let state = self.store.state();
        let Some(selected) = state.selected_node() else {
            self.details_cache = None;
            return None;
        };
        let details = Arc::new(NodeDetails::derive(state, selected));
        self.details_cache = Some(DetailsCache {
            revisions,
            details: Arc::clone(&details),
        });
        Some(details)
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let Some(details) = self.selected_details() else {
            ui.label("Click a wallet in the graph to inspect it.");
            return;
        };

        ui.horizontal(|ui| {
            ui.label(RichText::new(details.entity_name.as_deref().unwrap_or("Not in graph")).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("✕").on_hover_text("Clear selection").clicked() {
                    self.set_selected(None);
                }
            });
        });
        ui.small(details.address.as_str());
        ui.add_space(6.0);

        egui::Grid::new("node_totals").num_columns(2).show(ui, |ui| {
            ui.label("Total in");
            ui.label(format_btc(details.total_in, 8));
            ui.end_row();
            ui.label("Total out");
            ui.label(format_btc(details.total_out, 8));
            ui.end_row();
        });

        if details.is_empty() {
            ui.add_space(6.0);
            ui.label("No transfers with this wallet in the loaded records.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("node_details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                draw_record_section(ui, "Inflows", &details.inflows, FlowDirection::Inflow);
                draw_record_section(ui, "Outflows", &details.outflows, FlowDirection::Outflow);
            });
    }
}

fn draw_record_section(ui: &mut Ui, title: &str, records: &[ConnectionRecord], direction: FlowDirection) {
    if records.is_empty() {
        return;
    }

    ui.separator();
    ui.label(RichText::new(format!("{title} ({})", records.len())).strong());
    for record in records {
        ui.label(format!(
            "{}  {}",
            format_btc(record.amount, 8),
            record.date
        ));
        if let Some(address) = record.counterparty(direction) {
            ui.small(shorten_address(address)).on_hover_text(address);
        }
        for transaction in &record.transactions {
            ui.small(format!(
                "  {}  {}",
                format_btc(transaction.tx_amount, 8),
                transaction.date_time
            ))
            .on_hover_text(transaction.transaction_id.as_str());
        }
        ui.add_space(4.0);
    }
}
