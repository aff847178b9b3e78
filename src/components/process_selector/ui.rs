use super::state::ProcessSelector;

impl ProcessSelector {
    pub fn open(&mut self, names: Vec<String>) {
        self.show = true;
        self.search.clear();
        self.names = names;
    }

    /// Draws the "Add Process" dialog. Returns the name the user picked or typed.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<String> {
        if !self.show {
            return None;
        }

        let mut chosen = None;

        egui::Window::new("Add Process")
            .collapsible(false)
            .resizable(true)
            .default_size([300.0, 400.0])
            .min_width(250.0)
            .max_height(500.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Process name:");
                    let response = ui.text_edit_singleline(&mut self.search);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        chosen = Some(self.search.clone());
                    }
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        self.show = false;
                    }
                    if ui.button("Add").clicked() {
                        chosen = Some(self.search.clone());
                    }
                    if ui.small_button("❌").clicked() {
                        self.show = false;
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(300.0)
                    .show(ui, |ui| {
                        let search_term = self.search.to_lowercase();
                        for process_name in &self.names {
                            if search_term.is_empty()
                                || process_name.to_lowercase().contains(&search_term)
                            {
                                if ui.button(process_name).clicked() {
                                    chosen = Some(process_name.clone());
                                }
                            }
                        }
                    });
            });

        if chosen.is_some() {
            self.show = false;
        }
        chosen
    }
}
