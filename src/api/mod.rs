mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use middleware::{auth_middleware, rate_limit_middleware, SecurityConfig};

/// Router with every security feature off.
pub fn create_router(db: Database) -> Router {
    create_router_with_security(db, SecurityConfig::disabled())
}

pub fn create_router_with_security(db: Database, security: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Stateless scoring
        .route("/catalog", get(handlers::get_catalog))
        .route("/balance/preview", post(handlers::preview_balance))
        .route("/tasks/preview", post(handlers::preview_tasks))
        // Families
        .route("/families", get(handlers::list_families).post(handlers::create_family))
        .route(
            "/families/{id}",
            get(handlers::get_family).delete(handlers::delete_family),
        )
        // Surveys and balance
        .route("/families/{id}/surveys", post(handlers::record_survey))
        .route("/families/{id}/balance", get(handlers::get_balance))
        .route("/families/{id}/balance/weighted", get(handlers::get_weighted_balance))
        // Tasks
        .route("/families/{id}/tasks", get(handlers::list_tasks))
        .route("/families/{id}/tasks/plan", post(handlers::plan_tasks))
        .route(
            "/families/{id}/tasks/{task_id}/completion",
            put(handlers::set_task_completion),
        )
        .route(
            "/families/{id}/tasks/{task_id}/subtasks/{sub_task_id}/completion",
            put(handlers::set_subtask_completion),
        )
        .route("/families/{id}/tasks/{task_id}/comments", post(handlers::add_comment))
        // Meetings and cycles
        .route(
            "/families/{id}/cycles/{cycle}/meeting",
            get(handlers::get_meeting_notes).put(handlers::save_meeting_notes),
        )
        .route("/families/{id}/cycles/complete", post(handlers::complete_cycle))
        .route("/families/{id}/cycles", get(handlers::list_cycles))
        .route("/families/{id}/effectiveness", get(handlers::get_effectiveness))
        // Couple check-ins
        .route("/strategies", get(handlers::list_strategies))
        .route(
            "/families/{id}/checkins",
            get(handlers::list_checkins).post(handlers::save_checkin),
        )
        .layer(from_fn_with_state(security.clone(), auth_middleware))
        // Health stays reachable without credentials
        .route("/health", get(handlers::health));

    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(db)
}
