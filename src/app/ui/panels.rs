use eframe::egui::{self, Align, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);
        if self.notice.as_ref().is_some_and(|notice| notice.expires_at <= now) {
            self.notice = None;
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("wallet-trace");
                    ui.separator();
                    let state = self.store.state();
                    ui.label(format!(
                        "{} Nodes • {} Connections",
                        state.node_count(),
                        state.edge_count()
                    ));
                    if ui.button("Reset view").clicked() {
                        self.reset_view();
                    }
                    let export_button = ui.add_enabled(
                        !self.export.is_busy(),
                        egui::Button::new("SAVE AS PNG"),
                    );
                    if export_button.clicked() {
                        self.request_export(ctx);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button(self.theme.toggle_label()).clicked() {
                            self.set_theme(ctx, self.theme.toggled());
                        }
                        if let Some(notice) = &self.notice {
                            let color = if notice.is_error {
                                ui.visuals().error_fg_color
                            } else {
                                ui.visuals().weak_text_color()
                            };
                            ui.colored_label(color, notice.text.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        if self.store.state().selected_node().is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| self.draw_details(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
