//! Response bodies.

use serde::Serialize;

/// JSON answer of `POST /api/upload/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Logical path of the stored file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    /// Upload stored under `path`.
    pub fn stored(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            ok: true,
            name: Some(name.into()),
            path: Some(path.into()),
            error: None,
        }
    }

    /// Upload rejected or failed.
    pub fn failed(name: Option<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            name,
            path: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_serialization() {
        let json = serde_json::to_value(UploadResponse::stored("a.txt", "docs/a.txt")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "name": "a.txt", "path": "docs/a.txt"})
        );
    }

    #[test]
    fn test_failed_serialization_skips_missing_fields() {
        let json = serde_json::to_value(UploadResponse::failed(None, "bad name")).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "bad name"}));
    }
}
