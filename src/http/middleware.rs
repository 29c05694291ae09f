//! Request tracking middleware.
//! Records every request passing through the router as a task.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::task::Tags;
use crate::tracker::{RequestDescriptor, ResponseDescriptor, Tracker, TrackingHandle};

/// Status recorded for a request whose client went away before a response
/// was produced.
pub const CLIENT_CLOSED_REQUEST_STATUS: u16 = 499;

/// State required by [`track_requests`].
#[derive(Clone)]
pub struct TrackingState {
    pub tracker: Arc<Tracker>,
    /// Added to every task, overriding the tracker's default tags.
    pub request_tags: Arc<Tags>,
}

impl TrackingState {
    pub fn new(tracker: Arc<Tracker>, request_tags: Tags) -> Self {
        Self {
            tracker,
            request_tags: Arc::new(request_tags),
        }
    }
}

/// Ends a task when dropped before `finish`, e.g. when hyper drops the
/// handler future on client disconnect.
struct PendingTask {
    tracker: Arc<Tracker>,
    handle: Option<TrackingHandle>,
}

impl PendingTask {
    fn finish(mut self, response: &ResponseDescriptor) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.tracker.end_task(Some(&handle), response) {
                tracing::error!(error = %e, handle = ?handle, "Failed to complete tracked task");
            }
        }
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let status = StatusCode::from_u16(CLIENT_CLOSED_REQUEST_STATUS)
            .unwrap_or(StatusCode::REQUEST_TIMEOUT);
        tracing::warn!(
            handle = ?handle,
            status = status.as_u16(),
            "Request cancelled before completion"
        );
        if let Err(e) = self.tracker.end_task(Some(&handle), &ResponseDescriptor::new(status)) {
            tracing::error!(error = %e, handle = ?handle, "Failed to complete cancelled task");
        }
    }
}

pub async fn track_requests(
    State(state): State<TrackingState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let descriptor = RequestDescriptor::from_request(&request);
    let extra_tags = (!state.request_tags.is_empty()).then(|| state.request_tags.as_ref());

    // 1. Start tracking; a failure here is an integration bug.
    let start = match state.tracker.start_task(&descriptor, extra_tags) {
        Ok(start) => start,
        Err(e) => {
            tracing::error!(error = %e, uri = %descriptor.target, "Tracker middleware failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Tracker middleware failure").into_response();
        }
    };

    // 2. Handle travels with the request so handlers can see it.
    let handle = start.handle();
    request.extensions_mut().insert(handle);
    let pending = PendingTask {
        tracker: state.tracker.clone(),
        handle: matches!(handle, TrackingHandle::Tracked(_)).then_some(handle),
    };

    let response = next.run(request).await;

    // 3. Complete; the response is returned regardless.
    pending.finish(&ResponseDescriptor::from_response(&response));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::to_bytes;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app(tracker: Arc<Tracker>, routes: Router) -> Router {
        routes.layer(middleware::from_fn_with_state(
            TrackingState::new(tracker, Tags::new()),
            track_requests,
        ))
    }

    #[tokio::test]
    async fn test_start_failure_returns_500() {
        let tracker = Arc::new(Tracker::with_defaults());
        let router = app(
            tracker.clone(),
            Router::new().fallback(|| async { "never reached" }),
        );

        // Authority-form target: no path to track.
        let request = Request::get("example.com:443").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Tracker middleware failure");
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.completed_count(), 0);
    }

    #[tokio::test]
    async fn test_end_failure_still_returns_response() {
        let tracker = Arc::new(Tracker::with_defaults());
        let inner = tracker.clone();
        let routes = Router::new().route(
            "/early",
            get(move |Extension(handle): Extension<TrackingHandle>| {
                let inner = inner.clone();
                async move {
                    // Complete the task before the middleware does.
                    let _ = inner.end_task(Some(&handle), &ResponseDescriptor::new(StatusCode::ACCEPTED));
                    (StatusCode::IM_A_TEAPOT, "inner response")
                }
            }),
        );
        let router = app(tracker.clone(), routes);

        let request = Request::get("/early").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"inner response");

        let completed = tracker.completed_tasks();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status_code, Some(202));
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_is_completed() {
        let tracker = Arc::new(Tracker::with_defaults());
        let routes = Router::new().route(
            "/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let router = app(tracker.clone(), routes);

        let request = Request::get("/hang").body(Body::empty()).unwrap();
        let result = tokio::time::timeout(Duration::from_millis(50), router.oneshot(request)).await;
        assert!(result.is_err());

        assert_eq!(tracker.active_count(), 0);
        let completed = tracker.completed_tasks();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].path, "/hang");
        assert_eq!(completed[0].status_code, Some(CLIENT_CLOSED_REQUEST_STATUS));
        assert_eq!(completed[0].task.recorded_successfully, Some(true));
    }

    #[tokio::test]
    async fn test_ignored_request_is_not_completed_on_drop() {
        let tracker = Arc::new(Tracker::with_defaults());
        let routes = Router::new().route(
            "/tracker",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let router = app(tracker.clone(), routes);

        let request = Request::get("/tracker").body(Body::empty()).unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(50), router.oneshot(request)).await;

        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.completed_count(), 0);
    }
}
