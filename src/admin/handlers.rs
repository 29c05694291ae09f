use std::collections::BTreeMap;

use axum::{
    extract::{RawQuery, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};

use crate::admin::auth::{authenticate, ApiRejection};
use crate::admin::TrackerServer;
use crate::observability::metrics;
use crate::task::HttpTask;

/// Active index keyed by identifier. Keys serialize as JSON strings.
pub type ActiveTasksResponse = BTreeMap<u64, HttpTask>;

/// Completed history, newest first.
pub type CompletedTasksResponse = Vec<HttpTask>;

/// Views the API can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ActiveTasks,
    CompletedTasks,
}

impl Action {
    /// Parse the `action` parameter. Hyphenated spellings are accepted too.
    pub fn parse(value: Option<&str>) -> Result<Self, ApiRejection> {
        match value {
            None | Some("") => Err(ApiRejection::MissingAction),
            Some("active_tasks") | Some("active-tasks") => Ok(Action::ActiveTasks),
            Some("completed_tasks") | Some("completed-tasks") => Ok(Action::CompletedTasks),
            Some(other) => Err(ApiRejection::InvalidAction(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ActiveTasks => "active_tasks",
            Action::CompletedTasks => "completed_tasks",
        }
    }
}

/// First value of `name` in a raw query string.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

impl TrackerServer {
    /// Answer one tracker API query. Never mutates tracker state.
    pub fn serve(&self, method: &Method, query: Option<&str>) -> Response {
        let response = match self.respond(method, query) {
            Ok(response) => response,
            Err(rejection) => {
                tracing::warn!(
                    method = %method,
                    status = rejection.status().as_u16(),
                    reason = %rejection,
                    "Tracker API query rejected"
                );
                rejection.into_response()
            }
        };
        metrics::record_api_request(response.status().as_u16());
        response
    }

    fn respond(&self, method: &Method, query: Option<&str>) -> Result<Response, ApiRejection> {
        let supplied_key = query_param(query, "api-key");
        authenticate(self.api_key(), method, supplied_key.as_deref())?;

        let action = Action::parse(query_param(query, "action").as_deref())?;
        tracing::debug!(action = action.as_str(), "Serving tracker API query");

        // Snapshots are copied out of the tracker lock before encoding.
        Ok(match action {
            Action::ActiveTasks => Json(self.active_tasks()).into_response(),
            Action::CompletedTasks => Json(self.completed_tasks()).into_response(),
        })
    }

    pub fn active_tasks(&self) -> ActiveTasksResponse {
        self.tracker().active_tasks()
    }

    pub fn completed_tasks(&self) -> CompletedTasksResponse {
        self.tracker().completed_tasks()
    }
}

pub async fn tracker_handler(
    State(server): State<TrackerServer>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Response {
    server.serve(&method, query.as_deref())
}
