use axum::Router;
use axum::extract::Extension;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{any, get, post};
use domaris_core::AppError;
use domaris_domain::ResourceType;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::error::ApiError;
use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

/// Collaborator collections exposed through the generic resource handlers.
const RESOURCE_COLLECTIONS: &[(&str, ResourceType)] = &[
    ("/api/properties", ResourceType::Property),
    ("/api/transactions", ResourceType::Transaction),
    ("/api/documents", ResourceType::Document),
    ("/api/materials", ResourceType::Material),
    ("/api/estimates", ResourceType::CostEstimate),
];

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = protected_routes(app_state.clone()).route_layer(from_fn_with_state(
        app_state.clone(),
        middleware::require_auth,
    ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .merge(protected_routes)
        .layer(from_fn(middleware::attach_request_meta))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}

/// Routes that need an authenticated principal in the request extensions.
///
/// Layer order per request: path role gate, role context, handler, then the
/// audit trigger on the way out.
pub(crate) fn protected_routes(app_state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/api/activity-logs",
            get(handlers::activity_logs::list_activity_logs_handler)
                .post(handlers::activity_logs::create_activity_log_handler),
        )
        .route(
            "/api/activity-logs/mine",
            get(handlers::activity_logs::my_activity_handler),
        )
        .route(
            "/api/activity-logs/critical",
            get(handlers::activity_logs::critical_activity_handler),
        )
        .route(
            "/api/activity-logs/stats",
            get(handlers::activity_logs::activity_stats_handler),
        )
        .route(
            "/api/activity-logs/cleanup",
            post(handlers::activity_logs::cleanup_activity_logs_handler),
        )
        .route(
            "/api/activity-logs/{entry_id}",
            get(handlers::activity_logs::get_activity_log_handler),
        )
        .route("/api/users", get(handlers::users::list_users_handler))
        .route(
            "/api/users/{user_id}/deactivate",
            post(handlers::users::deactivate_user_handler),
        )
        .route(
            "/api/users/{user_id}/activate",
            post(handlers::users::activate_user_handler),
        )
        .route("/admin", any(admin_path_not_mounted))
        .route("/admin/{*path}", any(admin_path_not_mounted));

    RESOURCE_COLLECTIONS
        .iter()
        .fold(router, |router, (path, resource_type)| {
            router.merge(resource_routes(path, *resource_type))
        })
        .route_layer(from_fn(middleware::attach_role_context))
        .route_layer(from_fn_with_state(
            app_state,
            middleware::record_mutation_activity,
        ))
        .route_layer(from_fn(middleware::enforce_path_roles))
}

fn resource_routes(path: &str, resource_type: ResourceType) -> Router<AppState> {
    Router::new()
        .route(
            path,
            get(handlers::resources::list_resources_handler)
                .post(handlers::resources::create_resource_handler),
        )
        .route(
            &format!("{path}/{{id}}"),
            get(handlers::resources::get_resource_handler)
                .put(handlers::resources::replace_resource_handler)
                .patch(handlers::resources::patch_resource_handler)
                .delete(handlers::resources::delete_resource_handler),
        )
        .layer(Extension(resource_type))
}

/// The admin namespace is reserved: it passes the path role gate but serves
/// nothing yet.
async fn admin_path_not_mounted() -> ApiError {
    AppError::NotFound("no admin surface is mounted".to_owned()).into()
}
