use crate::data::TimetableRequest;
use crate::error::ParseError;
use log::{debug, info, trace};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Relative locations tried for a locally hosted request file.
pub const REQUEST_FILE_PATHS: [&str; 4] = [
    "request.json",
    "data/request.json",
    "web-ui/request.json",
    "../request.json",
];

/// Built-in sample configuration offered by the "Load sample" action.
pub const SAMPLE_REQUEST: &str = include_str!("../assets/sample_request.json");

/// A submission that is syntactically valid JSON. The submitted text is
/// posted to the solver verbatim.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    text: String,
    value: Value,
}

impl ParsedRequest {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Typed view of the request, if it matches the wire contract. Used only
    /// for display hints; the solver decides what is semantically valid.
    pub fn config(&self) -> Option<TimetableRequest> {
        serde_json::from_value(self.value().clone()).ok()
    }
}

/// Checks that `text` is well-formed JSON. No schema checks are made.
pub fn validate(text: &str) -> Result<ParsedRequest, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| ParseError::Syntax(e.to_string()))?;
    trace!("validated request of {} bytes", trimmed.len());
    Ok(ParsedRequest {
        text: trimmed.to_string(),
        value,
    })
}

/// Empty configuration used when no request file can be found.
pub fn skeleton() -> String {
    let skeleton = TimetableRequest::default();
    // serializing plain structs of strings and integers cannot fail
    serde_json::to_string_pretty(&skeleton).unwrap_or_else(|_| "{}".to_string())
}

/// Resolves the text that pre-fills the input on startup: an explicit file
/// if given, else the first readable candidate path, else the skeleton.
pub fn load_initial(explicit: Option<&Path>) -> String {
    let candidates: Vec<PathBuf> = match explicit {
        Some(p) => vec![p.to_path_buf()],
        None => REQUEST_FILE_PATHS.iter().map(PathBuf::from).collect(),
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("Loaded initial request from {}", path.display());
                return text;
            }
            Err(e) => debug!("No request file at {}: {}", path.display(), e),
        }
    }

    info!("No request file found; starting from an empty configuration.");
    skeleton()
}
