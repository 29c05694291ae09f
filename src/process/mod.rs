//! Process and host metadata.
//!
//! # Responsibilities
//! - Report process id, thread id and host name for each new task
//! - Supply default tags describing the running process
//!
//! # Design Decisions
//! - Thread id is a per-thread sequence number, absent on current-thread runtimes
//! - Host name is resolved once and cached
//! - Process instance id is a random UUID fixed for the process lifetime

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use tokio::runtime::{Handle, RuntimeFlavor};
use uuid::Uuid;

use crate::task::Tags;

/// Point-in-time facts about the executing process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub process_id: u32,
    pub thread_id: Option<u64>,
    pub host_name: String,
    pub process_internal_id: Option<String>,
}

/// Source of host-bound metadata attached to every task.
pub trait ProcessInfoProvider: Send + Sync {
    /// Facts about the process and the calling thread.
    fn current_process_info(&self) -> ProcessInfo;

    /// Tags applied to every task unless overridden.
    fn default_tags(&self) -> Tags;
}

static NEXT_THREAD_SEQ: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_SEQ: Cell<u64> = const { Cell::new(0) };
}

fn thread_seq() -> u64 {
    THREAD_SEQ.with(|seq| {
        if seq.get() == 0 {
            seq.set(NEXT_THREAD_SEQ.fetch_add(1, Ordering::Relaxed));
        }
        seq.get()
    })
}

fn resolve_host_name() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Provider backed by the operating system and the tokio runtime.
#[derive(Debug, Clone)]
pub struct SystemProcessInfo {
    host_name: String,
    instance_id: String,
}

impl SystemProcessInfo {
    pub fn new() -> Self {
        static INSTANCE_ID: OnceLock<String> = OnceLock::new();
        static HOST_NAME: OnceLock<String> = OnceLock::new();

        Self {
            host_name: HOST_NAME.get_or_init(resolve_host_name).clone(),
            instance_id: INSTANCE_ID
                .get_or_init(|| Uuid::new_v4().to_string())
                .clone(),
        }
    }

    fn thread_id(&self) -> Option<u64> {
        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::CurrentThread) => None,
            _ => Some(thread_seq()),
        }
    }
}

impl Default for SystemProcessInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInfoProvider for SystemProcessInfo {
    fn current_process_info(&self) -> ProcessInfo {
        ProcessInfo {
            process_id: std::process::id(),
            thread_id: self.thread_id(),
            host_name: self.host_name.clone(),
            process_internal_id: Some(self.instance_id.clone()),
        }
    }

    fn default_tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert("process.platform".into(), std::env::consts::OS.into());
        tags.insert("process.arch".into(), std::env::consts::ARCH.into());
        tags.insert("tracker.version".into(), env!("CARGO_PKG_VERSION").into());
        tags
    }
}

/// Provider returning fixed values.
#[derive(Debug, Clone)]
pub struct StaticProcessInfo {
    pub info: ProcessInfo,
    pub tags: Tags,
}

impl ProcessInfoProvider for StaticProcessInfo {
    fn current_process_info(&self) -> ProcessInfo {
        self.info.clone()
    }

    fn default_tags(&self) -> Tags {
        self.tags.clone()
    }
}
