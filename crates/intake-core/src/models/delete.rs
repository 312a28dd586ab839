use serde::Serialize;

/// Input of the delete entry point: one identifier or path, or a batch of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for DeleteRequest {
    fn from(value: &str) -> Self {
        DeleteRequest::One(value.to_string())
    }
}

impl From<String> for DeleteRequest {
    fn from(value: String) -> Self {
        DeleteRequest::One(value)
    }
}

impl From<i64> for DeleteRequest {
    fn from(id: i64) -> Self {
        DeleteRequest::One(id.to_string())
    }
}

impl From<Vec<String>> for DeleteRequest {
    fn from(values: Vec<String>) -> Self {
        DeleteRequest::Many(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteStatus {
    pub status: bool,
}

/// Per-item result of a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteItem {
    pub target: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeleteOutcome {
    Single(DeleteStatus),
    Batch(Vec<DeleteItem>),
}
