#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::handlers::admin::action_logs::{
    ActionLogListQuery, ActionLogListResponse, ActionLogResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(list_action_logs_doc, action_log_detail_doc),
    components(schemas(ActionLogListQuery, ActionLogListResponse, ActionLogResponse)),
    tags(
        (name = "Admin", description = "Administrative action history API")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/api/admin/action-logs",
    params(ActionLogListQuery),
    responses(
        (status = 200, description = "One page of action history, newest first", body = ActionLogListResponse),
        (status = 400, description = "Invalid filter or date range")
    ),
    tag = "Admin"
)]
fn list_action_logs_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/action-logs/{id}",
    params(("id" = String, Path, description = "Action log entry ID")),
    responses(
        (status = 200, body = ActionLogResponse),
        (status = 404, description = "No such entry")
    ),
    tag = "Admin"
)]
fn action_log_detail_doc() {}
