#[derive(Default)]
pub struct ProcessSelector {
    pub show: bool,
    pub search: String,
    /// Process names captured when the dialog was opened
    pub names: Vec<String>,
}
