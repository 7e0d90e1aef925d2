use std::fmt;

/// Core error type for the remodel engine.
///
/// Only conditions that abort a run live here. Everything recoverable is a
/// [`Warning`] — a run never fails because one input file is malformed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A source file is not syntactically valid; it was dropped from the index.
    Parse,
    /// An import specifier could not be mapped to any indexed file.
    Resolution,
    /// A cycle among mixin base references was broken deterministically.
    Cycle,
    /// A member could not be read as a field and was kept as a residual member.
    Classify,
    /// An unrecognized or suspicious configuration value was ignored.
    Config,
}

impl WarningKind {
    pub fn label(self) -> &'static str {
        match self {
            WarningKind::Parse => "parse",
            WarningKind::Resolution => "resolution",
            WarningKind::Cycle => "cycle",
            WarningKind::Classify => "classify",
            WarningKind::Config => "config",
        }
    }
}

/// A non-fatal diagnostic collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_carries_kind_label() {
        let w = Warning::new(WarningKind::Resolution, "cannot resolve 'x'");
        assert_eq!(w.to_string(), "[resolution] cannot resolve 'x'");
    }

    #[test]
    fn io_error_converts() {
        let err: CoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().contains("I/O error"));
    }
}
