use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use domaris_application::ResourceMutation;
use domaris_core::{AppError, Principal, PrincipalId, Role};
use domaris_domain::{AuditActionKind, NewAuditEntry, RequestMeta, ResourceRef, Severity};
use serde_json::Value;
use tower_sessions::Session;
use tracing::warn;

use crate::auth::SESSION_PRINCIPAL_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Path prefixes reserved for specific roles. Checked before any handler runs.
const PATH_ROLE_RULES: &[(&str, &[Role])] = &[
    ("/admin", &[Role::Admin]),
    ("/api/users", &[Role::Admin]),
    ("/api/activity-logs/cleanup", &[Role::Admin]),
];

/// Collections whose successful mutations are written to the activity log.
const AUDITED_PATH_PREFIXES: &[&str] = &[
    "/api/properties",
    "/api/transactions",
    "/api/documents",
    "/api/materials",
    "/api/estimates",
];

/// What a handler changed, attached to its response for the audit trigger.
#[derive(Debug, Clone)]
pub struct MutationTrail {
    /// Snapshot of the mutated resource.
    pub resource: ResourceRef,
    /// Field-level diff, for updates.
    pub changes: Option<Value>,
}

impl From<&ResourceMutation> for MutationTrail {
    fn from(value: &ResourceMutation) -> Self {
        Self {
            resource: value.snapshot.clone(),
            changes: value.changes.clone(),
        }
    }
}

/// Captures client address and user agent for every request.
pub async fn attach_request_meta(mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| *address);
    let request_meta = request_meta_from(request.headers(), peer);

    request.extensions_mut().insert(request_meta);
    next.run(request).await
}

/// Resolves the session principal and attaches it to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal_id = session
        .get::<PrincipalId>(SESSION_PRINCIPAL_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session principal: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let principal = state
        .principal_service
        .resolve_session(principal_id)
        .await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Rejects principals whose role is outside a protected prefix's allow-list.
pub async fn enforce_path_roles(request: Request, next: Next) -> ApiResult<Response> {
    let Some(required_roles) = required_roles(request.uri().path()) else {
        return Ok(next.run(request).await);
    };

    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    if !required_roles.contains(&principal.role()) {
        let required = required_roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        warn!(
            principal_id = %principal.id(),
            role = principal.role().as_str(),
            path = request.uri().path(),
            "path role gate denied request"
        );
        return Err(AppError::Forbidden(format!("Access denied. Required roles: {required}")).into());
    }

    Ok(next.run(request).await)
}

/// Computes the principal's role flags once, after the path role gate passed.
pub async fn attach_role_context(mut request: Request, next: Next) -> Response {
    if let Some(role_context) = request
        .extensions()
        .get::<Principal>()
        .map(Principal::role_context)
    {
        request.extensions_mut().insert(role_context);
    }
    next.run(request).await
}

/// Records successful mutations on audited collections.
///
/// Runs after the handler; recording failures never change the response.
pub async fn record_mutation_activity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let Some(action) = audited_action(&method, &path) else {
        return next.run(request).await;
    };

    let principal = request.extensions().get::<Principal>().cloned();
    let request_meta = request
        .extensions()
        .get::<RequestMeta>()
        .cloned()
        .unwrap_or_default();

    let response = next.run(request).await;

    let Some(principal) = principal else {
        return response;
    };
    if !matches!(
        response.status(),
        StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
    ) {
        return response;
    }

    let mut entry = NewAuditEntry::new(action, format!("{method} request to {path}"))
        .with_actor(principal.id(), principal.display_name())
        .with_severity(Severity::for_action(action))
        .with_request(request_meta);
    if let Some(trail) = response.extensions().get::<MutationTrail>() {
        entry = entry.with_resource(trail.resource.clone());
        if let Some(changes) = trail.changes.clone() {
            entry = entry.with_changes(changes);
        }
    }

    state.audit_recorder.record(entry).await;
    response
}

fn request_meta_from(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| peer.map(|address| address.ip().to_string()));

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestMeta {
        ip_address,
        user_agent,
    }
}

/// Prefix match on path-segment boundaries: `/api/users` covers
/// `/api/users/4` but not `/api/usersettings`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn required_roles(path: &str) -> Option<&'static [Role]> {
    PATH_ROLE_RULES
        .iter()
        .find(|(prefix, _)| matches_prefix(path, prefix))
        .map(|(_, roles)| *roles)
}

fn audited_action(method: &Method, path: &str) -> Option<AuditActionKind> {
    if !AUDITED_PATH_PREFIXES
        .iter()
        .any(|prefix| matches_prefix(path, prefix))
    {
        return None;
    }

    match *method {
        Method::POST => Some(AuditActionKind::Create),
        Method::PUT | Method::PATCH => Some(AuditActionKind::Update),
        Method::DELETE => Some(AuditActionKind::Delete),
        _ => None,
    }
}
