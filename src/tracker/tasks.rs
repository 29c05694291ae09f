//! Task lifecycle bookkeeping.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::TrackerSection;
use crate::config::loader::ConfigError;
use crate::observability::metrics;
use crate::process::{ProcessInfoProvider, SystemProcessInfo};
use crate::task::{normalize_header_map, timestamp_now, Completion, HttpTask, Tags, Task, TaskId};
use crate::tracker::error::TrackerError;
use crate::tracker::request::{RequestDescriptor, ResponseDescriptor};

/// Default size of the completed-task history.
pub const DEFAULT_MAX_COMPLETED_TASKS: usize = 256;

/// Correlation handle returned by `start_task` and consumed by `end_task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingHandle {
    Tracked(u64),
    /// The request matched the ignore list.
    Ignored,
}

/// Outcome of `Tracker::start_task`.
#[derive(Debug, Clone)]
pub enum TaskStart {
    Created { handle: TrackingHandle, task: HttpTask },
    Ignored,
}

impl TaskStart {
    pub fn handle(&self) -> TrackingHandle {
        match self {
            TaskStart::Created { handle, .. } => *handle,
            TaskStart::Ignored => TrackingHandle::Ignored,
        }
    }

    pub fn task(&self) -> Option<&HttpTask> {
        match self {
            TaskStart::Created { task, .. } => Some(task),
            TaskStart::Ignored => None,
        }
    }
}

/// Outcome of `Tracker::end_task`.
#[derive(Debug, Clone)]
pub enum TaskEnd {
    Completed(HttpTask),
    Ignored,
}

impl TaskEnd {
    pub fn task(&self) -> Option<&HttpTask> {
        match self {
            TaskEnd::Completed(task) => Some(task),
            TaskEnd::Ignored => None,
        }
    }
}

/// State guarded as one critical section.
#[derive(Debug)]
struct TrackerState {
    next_id: u64,
    active: BTreeMap<u64, HttpTask>,
    /// Newest first.
    completed: VecDeque<HttpTask>,
}

/// Tracks active and recently completed HTTP requests.
pub struct Tracker {
    state: Mutex<TrackerState>,
    max_completed_tasks: usize,
    ignore_paths: Vec<String>,
    tags: Tags,
    process: Arc<dyn ProcessInfoProvider>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("max_completed_tasks", &self.max_completed_tasks)
            .field("ignore_paths", &self.ignore_paths)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Create a tracker.
    ///
    /// `tags` are attached to every task; per-request tags override them.
    pub fn new(
        max_completed_tasks: usize,
        tags: Tags,
        ignore_paths: Vec<String>,
        process: Arc<dyn ProcessInfoProvider>,
    ) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                next_id: 1,
                active: BTreeMap::new(),
                completed: VecDeque::with_capacity(max_completed_tasks.min(1024)),
            }),
            max_completed_tasks,
            ignore_paths,
            tags,
            process,
        }
    }

    /// Create a tracker from the `[tracker]` config section.
    ///
    /// An unset history bound falls back to `TOP_MAX_COMPLETED_TASKS`, then
    /// to [`DEFAULT_MAX_COMPLETED_TASKS`]. Unset tags fall back to the
    /// provider's default tags.
    pub fn from_config(
        config: &TrackerSection,
        process: Arc<dyn ProcessInfoProvider>,
    ) -> Result<Self, ConfigError> {
        let max_completed_tasks = config.resolve_max_completed_tasks()?;
        let tags = config.tags.clone().unwrap_or_else(|| process.default_tags());

        tracing::info!(
            max_completed_tasks,
            ignore_paths = ?config.ignore_paths,
            "Tracker configured"
        );

        Ok(Self::new(
            max_completed_tasks,
            tags,
            config.ignore_paths.clone(),
            process,
        ))
    }

    /// Tracker with default settings and the system process provider.
    pub fn with_defaults() -> Self {
        let process = Arc::new(SystemProcessInfo::new());
        let tags = process.default_tags();
        Self::new(
            DEFAULT_MAX_COMPLETED_TASKS,
            tags,
            vec!["/tracker".to_string()],
            process,
        )
    }

    pub fn max_completed_tasks(&self) -> usize {
        self.max_completed_tasks
    }

    pub fn ignore_paths(&self) -> &[String] {
        &self.ignore_paths
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Exact match against the ignore list.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_paths.iter().any(|p| p == path)
    }

    /// Start tracking a request.
    pub fn start_task(
        &self,
        request: &RequestDescriptor,
        extra_tags: Option<&Tags>,
    ) -> Result<TaskStart, TrackerError> {
        let target = request.resolve()?;

        if self.is_ignored(&target.path) {
            metrics::record_task_ignored();
            return Ok(TaskStart::Ignored);
        }

        let mut tags = self.tags.clone();
        if let Some(extra) = extra_tags {
            tags.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let process = self.process.current_process_info();
        let now = timestamp_now();

        let mut task = HttpTask {
            task: Task {
                task_id: TaskId::Number(0),
                task_name: Some(format!("{} {}", request.method, target.path)),
                host_name: process.host_name,
                process_id: process.process_id,
                thread_id: process.thread_id,
                process_internal_id: process.process_internal_id,
                processor_name: None,
                started_at: now.clone(),
                updated_at: now,
                ended_at: None,
                recorded_successfully: None,
                tags,
            },
            protocol: target.protocol,
            host: target.host,
            method: request.method.to_string(),
            path: target.path,
            params: target.params,
            uri: Some(request.target.clone()),
            client_ip_address: request.client_addr.map(|ip| ip.to_string()),
            request_headers: normalize_header_map(&request.headers),
            response_headers: None,
            status_code: None,
            status_message: None,
        };

        // Gauges are set under the lock so the last write reflects the last change.
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            task.task.task_id = TaskId::Number(id);
            state.active.insert(id, task.clone());
            metrics::record_task_started(state.active.len());
            id
        };

        tracing::debug!(
            task_id = id,
            method = %task.method,
            path = %task.path,
            "Task started"
        );

        Ok(TaskStart::Created {
            handle: TrackingHandle::Tracked(id),
            task,
        })
    }

    /// Finish tracking a request and move it to the completed history.
    pub fn end_task(
        &self,
        handle: Option<&TrackingHandle>,
        response: &ResponseDescriptor,
    ) -> Result<TaskEnd, TrackerError> {
        let id = match handle {
            None => return Err(TrackerError::MissingHandle),
            Some(TrackingHandle::Ignored) => return Ok(TaskEnd::Ignored),
            Some(TrackingHandle::Tracked(id)) => *id,
        };

        let completion = Completion {
            ended_at: timestamp_now(),
            status_code: response.status.as_u16(),
            status_message: response.status_message(),
            response_headers: normalize_header_map(&response.headers),
        };

        let task = {
            let mut state = self.state.lock();
            let mut task = state
                .active
                .remove(&id)
                .ok_or(TrackerError::UnknownTask(id))?;
            task.complete(completion);
            state.completed.push_front(task.clone());
            state.completed.truncate(self.max_completed_tasks);
            metrics::record_task_completed(state.active.len(), state.completed.len());
            task
        };

        tracing::debug!(
            task_id = id,
            status = task.status_code.unwrap_or_default(),
            "Task completed"
        );

        Ok(TaskEnd::Completed(task))
    }

    /// Snapshot of the active index.
    pub fn active_tasks(&self) -> BTreeMap<u64, HttpTask> {
        self.state.lock().active.clone()
    }

    /// Snapshot of the completed history, newest first.
    pub fn completed_tasks(&self) -> Vec<HttpTask> {
        self.state.lock().completed.iter().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    pub fn completed_count(&self) -> usize {
        self.state.lock().completed.len()
    }
}
