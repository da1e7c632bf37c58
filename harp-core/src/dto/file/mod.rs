//! File reference DTOs

use serde::{Deserialize, Serialize};

/// Value of `meta._type` marking an object as a file reference
pub const FILE_DATA_TYPE: &str = "gradio.FileData";

/// Reference to a file held by the remote service
///
/// Sent in place of a local path after upload, and received for file outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub meta: FileMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub type_name: String,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            type_name: FILE_DATA_TYPE.to_string(),
        }
    }
}

impl FileData {
    /// Wraps a path the service already holds (e.g. after upload)
    pub fn uploaded(path: impl Into<String>, orig_name: Option<String>) -> Self {
        Self {
            path: path.into(),
            url: None,
            orig_name,
            meta: FileMeta::default(),
        }
    }

    /// Interprets an output value as a file reference, if it is one
    pub fn from_output(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let tagged = obj
            .get("meta")
            .and_then(|m| m.get("_type"))
            .and_then(|t| t.as_str())
            == Some(FILE_DATA_TYPE);
        if !tagged && !(obj.contains_key("path") && obj.contains_key("url")) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// File name to use locally
    pub fn file_name(&self) -> &str {
        self.orig_name
            .as_deref()
            .unwrap_or_else(|| self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uploaded_serialization() {
        let data = FileData::uploaded("/tmp/gradio/abc/input.wav", Some("input.wav".to_string()));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!({
                "path": "/tmp/gradio/abc/input.wav",
                "orig_name": "input.wav",
                "meta": {"_type": "gradio.FileData"}
            })
        );
    }

    #[test]
    fn test_from_output_detects_file_reference() {
        let value = json!({
            "path": "/tmp/gradio/xyz/out.wav",
            "url": "http://localhost:7860/file=/tmp/gradio/xyz/out.wav",
            "size": null,
            "orig_name": "out.wav",
            "mime_type": null,
            "is_stream": false,
            "meta": {"_type": "gradio.FileData"}
        });

        let file = FileData::from_output(&value).unwrap();
        assert_eq!(file.file_name(), "out.wav");
        assert!(file.url.is_some());
    }

    #[test]
    fn test_from_output_rejects_plain_data() {
        assert!(FileData::from_output(&json!({"ctrls": [], "card": {}})).is_none());
        assert!(FileData::from_output(&json!("some text")).is_none());
    }

    #[test]
    fn test_file_name_falls_back_to_path() {
        let file = FileData {
            path: "/tmp/gradio/xyz/render.mid".to_string(),
            url: None,
            orig_name: None,
            meta: FileMeta::default(),
        };
        assert_eq!(file.file_name(), "render.mid");
    }
}
