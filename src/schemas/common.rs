use poem_openapi::Object;

/// JSON error body surfaced for transport-level failures:
/// `{"success": false, "error": ..., "message": ...}`.
#[derive(Object, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(context: &str, err: &str, hint: &str) -> Self {
        let error = format!("{context}: {err}");
        tracing::error!("{error}");
        Self {
            success: false,
            error,
            message: hint.to_string(),
        }
    }
}
