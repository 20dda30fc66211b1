//! Values passed between pipeline functions.

/// Output of one pipeline function, input of the next.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineData {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

impl PipelineData {
    /// Render the value as the bytes an export stage sends.
    ///
    /// Bytes pass through, text is taken as UTF-8, anything structured is
    /// serialized to JSON.
    pub fn coerce_type(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            PipelineData::Bytes(bytes) => Ok(bytes.clone()),
            PipelineData::Text(text) => Ok(text.as_bytes().to_vec()),
            PipelineData::Json(value) => serde_json::to_vec(value),
        }
    }
}

impl From<Vec<u8>> for PipelineData {
    fn from(bytes: Vec<u8>) -> Self {
        PipelineData::Bytes(bytes)
    }
}

impl From<String> for PipelineData {
    fn from(text: String) -> Self {
        PipelineData::Text(text)
    }
}

impl From<&str> for PipelineData {
    fn from(text: &str) -> Self {
        PipelineData::Text(text.to_string())
    }
}

impl From<serde_json::Value> for PipelineData {
    fn from(value: serde_json::Value) -> Self {
        PipelineData::Json(value)
    }
}
