use crate::session::{CaptureController, CaptureState};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single capture controller; one recording at a time
    pub controller: Arc<Mutex<CaptureController>>,
    /// Readable while a stop holds the controller
    pub capture_state: watch::Receiver<CaptureState>,
}

impl AppState {
    pub fn new(controller: CaptureController) -> Self {
        Self {
            capture_state: controller.subscribe_state(),
            controller: Arc::new(Mutex::new(controller)),
        }
    }
}
