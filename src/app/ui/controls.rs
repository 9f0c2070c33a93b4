use eframe::egui::{self, Align, Key, Layout, RichText, Ui};

use crate::flow::{ConnectionRecord, FlowDirection};
use crate::util::{format_btc, shorten_address};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Trace a wallet");
        ui.add_space(4.0);

        let submitted = ui
            .horizontal(|ui| {
                let input = ui.add(
                    egui::TextEdit::singleline(&mut self.address_input)
                        .hint_text("Wallet address")
                        .desired_width(ui.available_width() - 56.0),
                );
                let entered = input.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
                let add_clicked = ui
                    .add_enabled(
                        !self.address_input.trim().is_empty(),
                        egui::Button::new("ADD"),
                    )
                    .clicked();
                entered || add_clicked
            })
            .inner;
        if submitted {
            let address = std::mem::take(&mut self.address_input);
            self.start_lookup(&address);
        }

        self.draw_lookup_status(ui);

        ui.separator();
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Highlight address or entity"),
        )
        .on_hover_text("Fuzzy match against node addresses and entity names.");

        self.draw_layout_tuning(ui);

        ui.separator();
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.flow_tab, FlowDirection::Inflow, "INFLOWS");
            ui.selectable_value(&mut self.flow_tab, FlowDirection::Outflow, "OUTFLOWS");
        });
        self.draw_flow_records(ui);

        ui.with_layout(Layout::bottom_up(Align::Min), |ui| {
            ui.add_space(6.0);
            let has_content = self.store.state().node_count() > 0 || !self.lookups.is_empty();
            if ui
                .add_enabled(has_content, egui::Button::new("CLEAR GRAPH"))
                .clicked()
            {
                self.clear_graph();
            }
        });
    }

    fn draw_lookup_status(&mut self, ui: &mut Ui) {
        for lookup in &self.lookups {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!(
                    "{}  ({:.1}s)",
                    shorten_address(&lookup.address),
                    lookup.elapsed().as_secs_f32()
                ))
                .on_hover_text(lookup.address.as_str());
            });
        }

        let mut retry = None;
        let mut dismiss = None;
        for (index, failed) in self.failed_lookups.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.colored_label(ui.visuals().error_fg_color, shorten_address(&failed.address))
                    .on_hover_text(failed.error.to_string());
                if ui.small_button("Retry").clicked() {
                    retry = Some(index);
                }
                if ui.small_button("Dismiss").clicked() {
                    dismiss = Some(index);
                }
            });
        }

        if let Some(index) = retry {
            self.retry_lookup(index);
        } else if let Some(index) = dismiss {
            self.dismiss_failed_lookup(index);
        }
    }

    fn draw_layout_tuning(&mut self, ui: &mut Ui) {
        let mut config = self.layout.config();
        ui.collapsing("Layout tuning", |ui| {
            ui.add(
                egui::Slider::new(&mut config.charge_strength, -1200.0..=-20.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly wallets push away from each other.");
            ui.add(
                egui::Slider::new(&mut config.link_distance, 40.0..=400.0)
                    .text("Link distance")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Rest length of each transfer arc.");
            ui.add(
                egui::Slider::new(&mut config.center_strength, 0.0..=0.5)
                    .text("Centering")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Pull toward the middle of the canvas.");
            let status = if self.layout.is_running() {
                format!("Simulating (alpha {:.3})", self.layout.alpha())
            } else {
                "Settled".to_owned()
            };
            ui.small(status);
        });
        self.apply_layout_config(config);
    }

    fn draw_flow_records(&mut self, ui: &mut Ui) {
        let state = self.store.state();
        let (records, direction) = match self.flow_tab {
            FlowDirection::Inflow => (state.inflows(), FlowDirection::Inflow),
            FlowDirection::Outflow => (state.outflows(), FlowDirection::Outflow),
        };

        if records.is_empty() {
            ui.label(format!("No {} loaded.", direction.label()));
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("flow_records_scroll")
            .max_height(ui.available_height() - 40.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for record in records {
                    if let Some(address) = draw_record_row(ui, record, direction) {
                        clicked = Some(address);
                    }
                }
            });

        if let Some(address) = clicked {
            self.set_selected(Some(address));
        }
    }
}

/// Returns the counterparty when its row is clicked.
fn draw_record_row(ui: &mut Ui, record: &ConnectionRecord, direction: FlowDirection) -> Option<String> {
    let counterparty = record.counterparty(direction);
    let mut clicked = None;

    ui.vertical(|ui| {
        let title = format!("{} – {}", record.entity_label(), format_btc(record.amount, 8));
        match counterparty {
            Some(address) => {
                if ui.link(RichText::new(title).strong()).on_hover_text(address).clicked() {
                    clicked = Some(address.to_owned());
                }
                ui.small(shorten_address(address));
            }
            None => {
                ui.label(RichText::new(title).strong());
            }
        }
        ui.small(record.date.as_str());
    });
    ui.add_space(4.0);

    clicked
}
