//! Task model.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → headers.rs (normalize request headers)
//!     → model.rs (HttpTask created, active)
//!     → model.rs (Completion applied at request end)
//!     → completed history (immutable)
//! ```

pub mod headers;
pub mod model;

pub use headers::{normalize_header_map, normalize_headers, HeaderList, HeaderValues};
pub use model::{timestamp_now, Completion, HttpTask, QueryParams, Tags, Task, TaskId};
