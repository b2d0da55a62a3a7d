use crate::error::ClientError;

/// Lifecycle of the last operation a slice ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Status plus the user-visible message of the last failure
#[derive(Debug, Clone, Default)]
pub struct SliceState {
    status: SliceStatus,
    error: Option<String>,
}

impl SliceState {
    pub fn status(&self) -> SliceStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin(&mut self) {
        self.status = SliceStatus::Loading;
        self.error = None;
    }

    /// Record how an operation ended and hand its result back. Failures are
    /// kept as `"<context>: <cause>"`.
    pub fn settle<T>(&mut self, result: Result<T, ClientError>, context: &str) -> Result<T, ClientError> {
        match &result {
            Ok(_) => {
                self.status = SliceStatus::Succeeded;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                self.status = SliceStatus::Failed;
                self.error = Some(format!("{}: {}", context, e));
            }
        }
        result
    }
}
