use super::state::{ProcessView, ViewCommand};
use crate::components::stats_view;
use crate::config::DISPLAY_WINDOW_RANGE_SECS;
use crate::metrics::process::{MetricType, MonitorEntry, MonitorState};
use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints};

const PLOT_LINE_WIDTH: f32 = 2.0;

pub fn show_process(
    ui: &mut egui::Ui,
    entry: &MonitorEntry,
    view: &mut ProcessView,
) -> Option<ViewCommand> {
    let mut command = None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.heading(&entry.process_name);
            ui.add_space(16.0);
            match entry.state {
                MonitorState::Active => {
                    ui.label(format!("Monitoring PID: {}", entry.pid));
                }
                MonitorState::Terminated => {
                    ui.colored_label(Color32::RED, format!("PID: {} (Terminated)", entry.pid));
                }
                MonitorState::Errored => {
                    ui.colored_label(
                        Color32::from_rgb(255, 140, 0),
                        format!("PID: {} (Error)", entry.pid),
                    );
                }
            }
        });
        if let Some(error) = &entry.last_error {
            ui.small(error.as_str());
        }

        stats_view::show_process_stats(ui, entry);

        ui.horizontal(|ui| {
            if ui
                .checkbox(&mut view.limit_window, "Show only the last")
                .changed()
                && !view.limit_window
            {
                command = Some(ViewCommand::ClearWindow);
            }
            ui.add_enabled(
                view.limit_window,
                egui::DragValue::new(&mut view.window_secs)
                    .range(DISPLAY_WINDOW_RANGE_SECS)
                    .suffix(" s"),
            );
            if ui
                .add_enabled(view.limit_window, egui::Button::new("Apply"))
                .clicked()
            {
                command = Some(ViewCommand::SetWindow(view.window_secs));
            }
        });

        let data = entry.windowed_view();
        let id = entry.pid.as_u32();

        ui.label("CPU Usage (%)");
        metric_plot(
            ui,
            format!("cpu_plot_{}", id),
            "CPU (%)",
            Some(100.0),
            data.points(MetricType::Cpu),
            Color32::BLUE,
        );

        ui.label("RAM Usage (MB)");
        metric_plot(
            ui,
            format!("ram_plot_{}", id),
            "RAM (MB)",
            None,
            data.points(MetricType::Memory),
            Color32::RED,
        );
    });

    command
}

fn metric_plot(
    ui: &mut egui::Ui,
    id: impl std::hash::Hash,
    y_label: &str,
    y_max: Option<f64>,
    points: Vec<[f64; 2]>,
    color: Color32,
) {
    let mut plot = Plot::new(id)
        .height(180.0)
        .show_axes(true)
        .show_grid(true)
        .x_axis_label("Time Elapsed (s)")
        .y_axis_label(y_label)
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false);
    if let Some(y_max) = y_max {
        plot = plot.include_y(y_max);
    }

    plot.show(ui, |plot_ui| {
        plot_ui.line(
            Line::new(PlotPoints::from(points))
                .color(color)
                .width(PLOT_LINE_WIDTH),
        );
    });
}
