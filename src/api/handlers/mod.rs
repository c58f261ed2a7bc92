use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use balance_core::{
    assess_signal, compute_category_balance, generate_next_cycle_tasks, Comment, CyclePlan,
    EffectivenessRecord, Question, Task, WeightedBalance,
};
use uuid::Uuid;

use crate::db::Database;
use crate::error::DomainError;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Map a service error to a response.
///
/// Domain errors are caller mistakes and are returned verbatim (404 for
/// missing entities, 400 otherwise). Anything else is logged in full and
/// reported as a generic 500.
fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(domain) = e.downcast_ref::<DomainError>() {
        let status = if domain.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        tracing::warn!("Rejected request: {}", domain);
        return (status, domain.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn family_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Family not found".to_string())
}

// ============================================================
// Health and stateless scoring
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_catalog(State(db): State<Database>) -> Json<Vec<Question>> {
    Json(db.catalog().questions().to_vec())
}

pub async fn preview_balance(
    State(db): State<Database>,
    Json(input): Json<BalancePreviewInput>,
) -> Json<BalanceReport> {
    let balances = compute_category_balance(&input.answers, db.catalog());
    Json(BalanceReport {
        cycle: 0,
        signal: assess_signal(&balances),
        balances,
    })
}

pub async fn preview_tasks(
    State(db): State<Database>,
    Json(request): Json<PlanRequest>,
) -> Json<CyclePlan> {
    let plan = generate_next_cycle_tasks(
        &request.cycle_input(db.catalog()),
        db.generator_config(),
    );
    Json(plan)
}

// ============================================================
// Families
// ============================================================

pub async fn list_families(
    State(db): State<Database>,
) -> Result<Json<Vec<Family>>, (StatusCode, String)> {
    db.list_families().map(Json).map_err(internal_error)
}

pub async fn create_family(
    State(db): State<Database>,
    Json(input): Json<CreateFamilyInput>,
) -> Result<(StatusCode, Json<Family>), (StatusCode, String)> {
    db.create_family(input)
        .map(|f| (StatusCode::CREATED, Json(f)))
        .map_err(internal_error)
}

pub async fn get_family(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Family>, (StatusCode, String)> {
    db.get_family(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(family_not_found)
}

pub async fn delete_family(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_family(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(family_not_found())
    }
}

// ============================================================
// Surveys and balance
// ============================================================

pub async fn record_survey(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<SurveySubmission>,
) -> Result<(StatusCode, Json<SurveyReceipt>), (StatusCode, String)> {
    db.record_survey(id, input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(internal_error)
}

pub async fn get_balance(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<CycleQuery>,
) -> Result<Json<BalanceReport>, (StatusCode, String)> {
    db.category_balance(id, query.cycle)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_weighted_balance(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<WeightedQuery>,
) -> Result<Json<WeightedBalance>, (StatusCode, String)> {
    db.weighted_balance(id, query.cycle, &query.priorities())
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<CycleQuery>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    db.get_tasks(id, query.cycle)
        .map(Json)
        .map_err(internal_error)
}

pub async fn plan_tasks(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<CyclePlan>, (StatusCode, String)> {
    db.plan_current_cycle(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn set_task_completion(
    State(db): State<Database>,
    Path((id, task_id)): Path<(Uuid, String)>,
    Json(input): Json<CompletionInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.set_task_completion(id, &task_id, input.completed)
        .map(Json)
        .map_err(internal_error)
}

pub async fn set_subtask_completion(
    State(db): State<Database>,
    Path((id, task_id, sub_task_id)): Path<(Uuid, String, String)>,
    Json(input): Json<CompletionInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.set_subtask_completion(id, &task_id, &sub_task_id, input.completed)
        .map(Json)
        .map_err(internal_error)
}

pub async fn add_comment(
    State(db): State<Database>,
    Path((id, task_id)): Path<(Uuid, String)>,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), (StatusCode, String)> {
    db.add_comment(id, &task_id, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

// ============================================================
// Meetings and cycles
// ============================================================

pub async fn get_meeting_notes(
    State(db): State<Database>,
    Path((id, cycle)): Path<(Uuid, u32)>,
) -> Result<Json<MeetingNotes>, (StatusCode, String)> {
    db.get_family(id)
        .map_err(internal_error)?
        .ok_or_else(family_not_found)?;
    db.get_meeting_notes(id, cycle)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Meeting notes not found".to_string()))
}

pub async fn save_meeting_notes(
    State(db): State<Database>,
    Path((id, cycle)): Path<(Uuid, u32)>,
    Json(input): Json<MeetingNotesInput>,
) -> Result<Json<MeetingNotes>, (StatusCode, String)> {
    db.save_meeting_notes(id, cycle, input)
        .map(Json)
        .map_err(internal_error)
}

pub async fn complete_cycle(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<CycleTransition>, (StatusCode, String)> {
    db.complete_cycle(id).map(Json).map_err(internal_error)
}

pub async fn list_cycles(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CycleRecord>>, (StatusCode, String)> {
    db.get_cycle_history(id).map(Json).map_err(internal_error)
}

pub async fn get_effectiveness(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EffectivenessRecord>>, (StatusCode, String)> {
    db.get_family(id)
        .map_err(internal_error)?
        .ok_or_else(family_not_found)?;
    db.get_effectiveness(id).map(Json).map_err(internal_error)
}

// ============================================================
// Couple check-ins
// ============================================================

pub async fn list_strategies() -> Json<Vec<StrategyOption>> {
    Json(Strategy::options())
}

pub async fn list_checkins(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<CycleQuery>,
) -> Result<Json<Vec<CoupleCheckIn>>, (StatusCode, String)> {
    db.list_checkins(id, query.cycle)
        .map(Json)
        .map_err(internal_error)
}

pub async fn save_checkin(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CheckInInput>,
) -> Result<(StatusCode, Json<CoupleCheckIn>), (StatusCode, String)> {
    db.save_checkin(id, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}
