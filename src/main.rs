#![warn(clippy::all, rust_2018_idioms)]

// When compiling natively:
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Process Monitor")
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "procpulse",
        native_options,
        Box::new(|cc| Ok(Box::new(procpulse::ProcessMonitorApp::new(cc)))),
    )
}
