use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to initialize hook engine: {0}")]
    EngineInit(String),

    #[error("Failed to create hook at {target:#x}: {reason}")]
    HookCreate { target: u64, reason: String },

    #[error("Failed to enable hook at {target:#x}: {reason}")]
    HookEnable { target: u64, reason: String },

    #[error("Invalid offset table: {0}")]
    InvalidOffsets(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_enable_error_reports_cause() {
        let err = Error::HookEnable {
            target: 0x1000,
            reason: "VirtualProtect failed".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("0x1000"));
        assert!(rendered.contains("VirtualProtect failed"));
    }
}
