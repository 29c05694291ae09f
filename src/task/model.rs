//! Task records as exposed on the wire.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::task::headers::HeaderList;

/// Free-form monitoring metadata. Keys may be dot-namespaced.
pub type Tags = BTreeMap<String, String>;

/// Query parameters in request order, serialized as `[["key", "value"], ...]`.
pub type QueryParams = Vec<(String, String)>;

/// Task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Name(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Name(s) => f.write_str(s),
        }
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId::Number(id)
    }
}

/// Current UTC time in the `2024-01-31T12:00:00.000Z` form.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Base tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    pub host_name: String,
    pub process_id: u32,
    /// Absent when the host runtime is single-threaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_internal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_name: Option<String>,
    pub started_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_successfully: Option<bool>,
    #[serde(default)]
    pub tags: Tags,
}

/// HTTP request/response task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub params: QueryParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(default)]
    pub request_headers: HeaderList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<HeaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// Everything `end_task` writes onto a task, applied as one unit.
#[derive(Debug, Clone)]
pub struct Completion {
    pub ended_at: String,
    pub status_code: u16,
    pub status_message: Option<String>,
    pub response_headers: HeaderList,
}

impl HttpTask {
    pub fn id(&self) -> &TaskId {
        &self.task.task_id
    }

    /// True once `complete` has been applied.
    pub fn is_completed(&self) -> bool {
        self.task.ended_at.is_some()
    }

    pub(crate) fn complete(&mut self, completion: Completion) {
        self.task.updated_at = completion.ended_at.clone();
        self.task.ended_at = Some(completion.ended_at);
        self.task.recorded_successfully = Some(true);
        self.status_code = Some(completion.status_code);
        self.status_message = completion.status_message;
        self.response_headers = Some(completion.response_headers);
    }
}
