//! Defines structures and types for progress reporting.

/// Represents a snapshot of the progress during a long-running operation.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// A description of the current stage (e.g., "Resolving vocabulary").
    pub stage_description: String,
    /// Number of items processed in the current stage.
    pub current_item: u64,
    /// Total number of items expected in the current stage (if calculable).
    pub total_items: Option<u64>,
    /// An optional message providing more context (e.g., the word currently
    /// being resolved).
    pub message: Option<String>,
}

/// Type alias for the progress callback function.
///
/// The callback is invoked once per processed item. `FnMut` allows it to
/// update captured state (e.g., a terminal progress bar); `Send` lets the
/// orchestrator carry it across await points.
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate) + Send>;

impl ProgressUpdate {
    pub fn new(
        stage_description: impl Into<String>,
        current_item: u64,
        total_items: Option<u64>,
        message: Option<String>,
    ) -> Self {
        ProgressUpdate {
            stage_description: stage_description.into(),
            current_item,
            total_items,
            message,
        }
    }
}
