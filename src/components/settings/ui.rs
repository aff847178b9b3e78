use super::state::Settings;

/// Draws the settings window. Returns a new update interval in milliseconds
/// when the user applies one.
pub fn show_settings_window(ctx: &egui::Context, settings: &mut Settings) -> Option<u64> {
    if !settings.is_visible() {
        return None;
    }

    let mut applied = None;
    egui::Window::new("⚙ Settings")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Update Interval:");
                ui.add(egui::Slider::new(&mut settings.pending_interval_secs, 1..=300).suffix(" s"));
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("UI Scale:");
                ui.add(egui::Slider::new(&mut settings.scale, 0.5..=2.0).step_by(0.1));
            });

            ui.horizontal(|ui| {
                ui.label("Font Size:");
                ui.add(egui::Slider::new(&mut settings.font_size, 8.0..=32.0).step_by(1.0));
            });

            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    applied = Some(settings.pending_interval_secs * 1000);
                    settings.hide();
                }
                if ui.button("Close").clicked() {
                    settings.hide();
                }
            });
        });

    applied
}
