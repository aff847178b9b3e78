use crate::metrics::process::{MetricType, MonitorEntry};

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(value) => format!("{:.2} {}", value, unit),
        None => format!("-- {}", unit),
    }
}

pub fn show_process_stats(ui: &mut egui::Ui, entry: &MonitorEntry) {
    let series = entry.series();
    let live = entry.state.is_active();
    let current = |metric: MetricType| if live { series.last(metric) } else { None };

    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(format!("CPU: {}", reading(current(MetricType::Cpu), "%")));
            ui.label(format!("RAM: {}", reading(current(MetricType::Memory), "MB")));
        });

        ui.add_space(32.0);

        ui.vertical(|ui| {
            ui.label(format!(
                "Average CPU: {:.2} %",
                series.running_average(MetricType::Cpu)
            ));
            ui.label(format!(
                "Average RAM: {:.2} MB",
                series.running_average(MetricType::Memory)
            ));
        });

        ui.add_space(32.0);

        ui.vertical(|ui| {
            ui.label(format!("Peak CPU: {}", reading(series.peak(MetricType::Cpu), "%")));
            ui.label(format!(
                "Peak RAM: {}",
                reading(series.peak(MetricType::Memory), "MB")
            ));
        });
    });
    ui.add_space(8.0);
}
