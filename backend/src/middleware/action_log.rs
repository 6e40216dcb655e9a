//! Records administrative requests into the action log.
//!
//! The recording call is fire-and-forget: whatever happens inside the
//! pipeline, the response already on its way out is unaffected.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::{services::action_log::NewActionLog, state::AppState};

struct ActionDescriptor {
    action_name: &'static str,
    description: &'static str,
}

pub async fn action_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let descriptor = classify_action(&method, &path);

    let response = next.run(request).await;

    if let Some(descriptor) = descriptor {
        state.action_log.record(NewActionLog {
            action_name: descriptor.action_name.to_string(),
            description: descriptor.description.to_string(),
            // Identity is resolved outside this subsystem; requests reaching
            // this surface are recorded as system-attributed.
            user_id: None,
            payload: Some(json!({
                "path": path,
                "status": response.status().as_u16(),
            })),
        });
    }

    response
}

fn classify_action(method: &Method, path: &str) -> Option<ActionDescriptor> {
    let normalized = path.trim_end_matches('/');
    if !normalized.starts_with("/api/") {
        return None;
    }
    if normalized.starts_with("/api/docs") || normalized.starts_with("/api-doc/") {
        return None;
    }

    let segments: Vec<&str> = normalized.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (&Method::GET, ["api", "admin", "action-logs"]) => Some(ActionDescriptor {
            action_name: "action_log_list",
            description: "Administrator listed the action history",
        }),
        (&Method::GET, ["api", "admin", "action-logs", _id]) => Some(ActionDescriptor {
            action_name: "action_log_detail",
            description: "Administrator viewed an action log entry",
        }),
        _ => None,
    }
}
