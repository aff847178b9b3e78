/// Per-tab editing state for the display window controls.
pub struct ProcessView {
    pub limit_window: bool,
    pub window_secs: u64,
}

impl Default for ProcessView {
    fn default() -> Self {
        Self {
            limit_window: false,
            window_secs: 60,
        }
    }
}

impl ProcessView {
    pub fn for_window(window_secs: Option<u64>) -> Self {
        match window_secs {
            Some(window_secs) => Self {
                limit_window: true,
                window_secs,
            },
            None => Self::default(),
        }
    }
}

/// What the user asked for from a process tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    SetWindow(u64),
    ClearWindow,
}
