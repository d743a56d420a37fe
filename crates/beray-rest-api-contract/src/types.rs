// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! API contract types for the BeRay REST service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiContractError;

/// One live progress message of a task, as pushed on the event stream.
///
/// The payload is open-ended (status changes, log lines, tool calls), so it is
/// kept as raw JSON.
pub type TaskEvent = Value;

/// Server-defined task lifecycle state
///
/// Parsing is case-insensitive. Statuses this client does not know about are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Stopped,
    Failed,
    Other(String),
}

impl TaskStatus {
    /// Whether the task can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Stopped | TaskStatus::Failed
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Stopped => "stopped",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(raw) => raw,
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ApiContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ApiContractError::InvalidTaskStatus(s.to_string()));
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "pending" => TaskStatus::Pending,
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "stopped" => TaskStatus::Stopped,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(trimmed.to_string()),
        })
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = ApiContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task snapshot as returned by `/tasks` endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    pub status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Task creation request
///
/// `tools` is always serialized; `null` lets the service pick its default
/// tool set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub goal: String,
    pub tools: Option<Vec<String>>,
}

impl CreateTaskRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            tools: None,
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }
}

/// Request body for `POST /auth/request-verification-code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCodeRequest {
    pub email: String,
}

/// Request body for `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub verification_code: String,
    pub password: String,
}

/// Request body for `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password form for `POST /auth/token` (form-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

/// User profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the login, register and token endpoints
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Generic acknowledgement (`{"message": ...}` and similar)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageResponse {
    /// True for the empty result produced by a 204 response
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.status.is_none() && self.extra.is_empty()
    }
}

/// Kind of a workspace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    #[serde(alias = "directory")]
    Dir,
    #[serde(other)]
    Other,
}

/// File or directory node in a task's working directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkspaceEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }
}

/// Response of `PUT /tasks/{id}/files/content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub path: String,
    pub size: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for `POST /tasks/{id}/files/download`
///
/// An empty `paths` list selects the whole workspace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_status_parses_case_insensitively() {
        assert_eq!("RUNNING".parse::<TaskStatus>().unwrap(), TaskStatus::Running);
        assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!(
            "queued".parse::<TaskStatus>().unwrap(),
            TaskStatus::Other("queued".to_string())
        );
        assert!(matches!(
            "  ".parse::<TaskStatus>(),
            Err(ApiContractError::InvalidTaskStatus(_))
        ));
    }

    #[test]
    fn task_status_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Stopped.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Other("queued".into()).is_terminal());
    }

    #[test]
    fn task_keeps_unknown_fields() {
        let raw = json!({
            "id": 7,
            "goal": "summarize the repo",
            "status": "RUNNING",
            "created_at": "2025-01-01T00:00:00",
        });
        let task: Task = serde_json::from_value(raw).unwrap();

        assert_eq!(task.id, 7);
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.tools, None);
        assert_eq!(task.extra["created_at"], json!("2025-01-01T00:00:00"));
    }

    #[test]
    fn task_rejects_empty_status() {
        let raw = json!({"id": 1, "goal": "g", "status": ""});
        assert!(serde_json::from_value::<Task>(raw).is_err());
    }

    #[test]
    fn create_task_request_always_sends_tools() {
        let request = CreateTaskRequest::new("write tests");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"goal": "write tests", "tools": null})
        );

        let request = CreateTaskRequest::new("browse").with_tools(["web_search", "shell"]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"goal": "browse", "tools": ["web_search", "shell"]})
        );
    }

    #[test]
    fn message_response_round_trips_exactly() {
        let raw = json!({"message": "ok"});
        let ack: MessageResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&ack).unwrap(), raw);

        let raw = json!({"status": "success", "message": "Task deleted", "task_id": 3});
        let ack: MessageResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ack.status.as_deref(), Some("success"));
        assert_eq!(serde_json::to_value(&ack).unwrap(), raw);
    }

    #[test]
    fn empty_object_is_an_empty_message_response() {
        let ack: MessageResponse = serde_json::from_value(json!({})).unwrap();
        assert!(ack.is_empty());
        assert_eq!(serde_json::to_value(&ack).unwrap(), json!({}));
    }

    #[test]
    fn workspace_entry_types() {
        let entries: Vec<WorkspaceEntry> = serde_json::from_value(json!([
            {"name": "file.txt", "type": "file"},
            {"name": "src", "type": "dir", "path": "src"},
            {"name": "docs", "type": "directory"},
            {"name": "link", "type": "symlink"},
        ]))
        .unwrap();

        assert_eq!(entries[0].entry_type, EntryType::File);
        assert!(entries[1].is_dir());
        assert_eq!(entries[1].path.as_deref(), Some("src"));
        assert!(entries[2].is_dir());
        assert_eq!(entries[3].entry_type, EntryType::Other);
    }

    #[test]
    fn auth_response_without_token() {
        let response: AuthResponse =
            serde_json::from_value(json!({"detail": "pending verification"})).unwrap();
        assert_eq!(response.access_token, None);
        assert_eq!(response.extra["detail"], json!("pending verification"));
    }
}
