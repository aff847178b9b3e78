use crate::config::MonitorConfig;

#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    pub scale: f32,
    pub font_size: f32,
    pub monitor: MonitorConfig,
    #[serde(skip)]
    show_window: bool,
    /// Interval being edited in the settings window, in seconds
    #[serde(skip)]
    pub pending_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let monitor = MonitorConfig::default();
        Self {
            scale: 1.2,
            font_size: 15.0,
            pending_interval_secs: monitor.update_interval_ms / 1000,
            monitor,
            show_window: false,
        }
    }
}

impl Settings {
    pub fn show(&mut self) {
        self.pending_interval_secs = self.monitor.update_interval_ms / 1000;
        self.show_window = true;
    }

    pub fn is_visible(&self) -> bool {
        self.show_window
    }

    pub fn hide(&mut self) {
        self.show_window = false;
    }

    pub fn apply(&self, ctx: &egui::Context) {
        ctx.set_pixels_per_point(self.scale);

        let mut style = (*ctx.style()).clone();
        style.text_styles = [
            (
                egui::TextStyle::Heading,
                egui::FontId::new(self.font_size + 4.0, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Body,
                egui::FontId::new(self.font_size, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Monospace,
                egui::FontId::new(self.font_size, egui::FontFamily::Monospace),
            ),
            (
                egui::TextStyle::Button,
                egui::FontId::new(self.font_size, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Small,
                egui::FontId::new(self.font_size - 2.0, egui::FontFamily::Proportional),
            ),
        ]
        .into();
        ctx.set_style(style);
    }
}
