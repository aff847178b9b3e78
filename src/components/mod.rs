pub mod process_selector;
pub mod process_view;
pub mod settings;
pub mod stats_view;
