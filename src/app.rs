use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use sysinfo::Pid;

use crate::components::process_selector::ProcessSelector;
use crate::components::process_view::{self, ProcessView, ViewCommand};
use crate::components::settings::{show_settings_window, Settings};
use crate::error::MonitorError;
use crate::metrics::process::{
    process_names, MonitorEvent, MonitorRegistry, ProcessReader, SysinfoReader,
};
use crate::metrics::Monitor;

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

pub struct ProcessMonitorApp {
    monitor: Monitor,
    events: Receiver<MonitorEvent>,
    settings: Settings,
    process_selector: ProcessSelector,
    process_view: ProcessView,
    active_pid: Option<Pid>,
    notices: Vec<String>,
}

impl ProcessMonitorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Only the settings are persisted; monitoring always starts empty.
        let settings: Settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        Self::with_reader(Arc::new(SysinfoReader::new()), settings)
    }

    pub fn with_reader(reader: Arc<dyn ProcessReader>, mut settings: Settings) -> Self {
        let mut registry = match MonitorRegistry::new(Arc::clone(&reader), settings.monitor) {
            Ok(registry) => registry,
            Err(err) => {
                warn!("Ignoring saved monitor settings: {}", err);
                settings.monitor = Default::default();
                MonitorRegistry::with_defaults(reader)
            }
        };
        let events = registry.subscribe();

        Self {
            monitor: Monitor::spawn(registry),
            events,
            settings,
            process_selector: ProcessSelector::default(),
            process_view: ProcessView::default(),
            active_pid: None,
            notices: Vec::new(),
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            match event {
                MonitorEvent::Sample(_) => {}
                MonitorEvent::Terminated { pid } => info!("Process PID {} terminated", pid),
                MonitorEvent::Errored { pid, message } => {
                    self.notices
                        .push(format!("Process Error (PID: {}): {}", pid, message));
                }
            }
        }
    }

    fn select(&mut self, pid: Option<Pid>) {
        if self.active_pid == pid {
            return;
        }
        self.active_pid = pid;
        let window = pid.and_then(|pid| {
            self.monitor
                .registry()
                .entry(pid)
                .and_then(|e| e.display_window_secs)
        });
        self.process_view = ProcessView::for_window(window);
    }

    fn add_process(&mut self, name: &str) {
        let result = self.monitor.registry().add_by_name(name);
        match result {
            Ok(pid) => self.select(Some(pid)),
            Err(MonitorError::AlreadyMonitored { pid, name }) => {
                self.notices.push(format!(
                    "Process '{}' (PID: {}) is already being monitored.",
                    name, pid
                ));
                self.select(Some(pid));
            }
            Err(err) => self.notices.push(err.to_string()),
        }
    }

    fn remove_process(&mut self, pid: Pid) {
        let remaining = {
            let mut registry = self.monitor.registry();
            registry.remove_process(pid);
            registry.pids()
        };
        if self.active_pid == Some(pid) {
            self.select(remaining.last().copied());
        }
    }

    fn set_interval(&mut self, interval_ms: u64) {
        let result = self.monitor.registry().set_global_interval(interval_ms);
        match result {
            Ok(()) => self.settings.monitor.update_interval_ms = interval_ms,
            Err(err) => self.notices.push(err.to_string()),
        }
    }

    fn apply_view_command(&mut self, pid: Pid, command: ViewCommand) {
        let result = {
            let mut registry = self.monitor.registry();
            match command {
                ViewCommand::SetWindow(seconds) => registry.set_display_window(pid, seconds),
                ViewCommand::ClearWindow => registry.clear_display_window(pid),
            }
        };
        if let Err(err) = result {
            self.notices.push(err.to_string());
        }
    }
}

impl eframe::App for ProcessMonitorApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.settings.apply(ctx);
        self.drain_events();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Actions", |ui| {
                    if ui.button("Add Process...").clicked() {
                        let names = process_names(self.monitor.registry().reader().as_ref());
                        self.process_selector.open(names);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Settings", |ui| {
                    if ui.button("Set Update Interval...").clicked() {
                        self.settings.show();
                        ui.close_menu();
                    }
                });

                ui.add_space(16.0);
                egui::widgets::global_theme_preference_buttons(ui);
            });
        });

        if let Some(name) = self.process_selector.show(ctx) {
            self.add_process(&name);
        }
        if let Some(interval_ms) = show_settings_window(ctx, &mut self.settings) {
            self.set_interval(interval_ms);
        }

        // Tabs are rebuilt from the registry every frame.
        let tabs: Vec<(Pid, String)> = {
            let registry = self.monitor.registry();
            registry
                .pids()
                .into_iter()
                .filter_map(|pid| {
                    registry
                        .entry(pid)
                        .map(|e| (pid, format!("{} ({})", e.process_name, pid)))
                })
                .collect()
        };
        if self.active_pid.map_or(true, |pid| !tabs.iter().any(|(p, _)| *p == pid)) {
            self.select(tabs.last().map(|(pid, _)| *pid));
        }

        let mut clicked = None;
        let mut to_remove = None;
        egui::TopBottomPanel::top("process_tabs").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for (pid, label) in &tabs {
                    let is_active = self.active_pid == Some(*pid);
                    if ui.selectable_label(is_active, label).clicked() {
                        clicked = Some(*pid);
                    }
                    if ui.small_button("❌").clicked() {
                        to_remove = Some(*pid);
                    }
                    ui.separator();
                }
            });
        });
        if let Some(pid) = clicked {
            self.select(Some(pid));
        }
        if let Some(pid) = to_remove {
            self.remove_process(pid);
        }

        if !self.notices.is_empty() {
            egui::TopBottomPanel::bottom("notices").show(ctx, |ui| {
                let mut dismissed = None;
                for (i, notice) in self.notices.iter().enumerate() {
                    ui.horizontal(|ui| {
                        if ui.small_button("✔").clicked() {
                            dismissed = Some(i);
                        }
                        ui.label(notice);
                    });
                }
                if let Some(i) = dismissed {
                    self.notices.remove(i);
                }
            });
        }

        let mut view_command = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let registry = self.monitor.registry();
            match self.active_pid.and_then(|pid| registry.entry(pid)) {
                Some(entry) => {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        view_command = process_view::show_process(ui, entry, &mut self.process_view)
                            .map(|command| (entry.pid, command));
                    });
                }
                None => {
                    ui.heading("Process Monitor");
                    ui.label("Use Actions > Add Process... to start monitoring a process.");
                }
            }
        });
        if let Some((pid, command)) = view_command {
            self.apply_view_command(pid, command);
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
