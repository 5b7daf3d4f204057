use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::LedgerError,
        models::{
            expense::{ExpenseView, NewPersonalExpense, PersonalExpense},
            group::{Group, GroupExpense},
        },
        services::{GroupSummary, LedgerService, NewGroupExpense, SettleResponse},
    },
    infrastructure::{enrichment::Enricher, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{delete, get, post},
};
use http::header;

use std::sync::Arc;

pub type AppService = LedgerService<InMemoryStorage, Box<dyn Enricher>>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| LedgerError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| LedgerError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn require_email(claims: &Claims) -> Result<&str, LedgerError> {
    claims
        .email
        .as_deref()
        .ok_or_else(|| LedgerError::Unauthorized("Token carries no email".to_string()))
}

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/claim", post(claim_membership))
        .route("/groups/{group_id}/expenses", post(add_group_expense))
        .route("/groups/{group_id}/expenses/{expense_ref}", delete(remove_group_expense))
        .route("/groups/{group_id}/settle", post(settle))
        .route("/groups/{group_id}/balances", get(get_balances))
        .route("/groups/{group_id}/summary", get(get_summary))
        .route("/expenses", post(create_expense).get(list_expenses))
        .route("/expenses/{expense_id}", delete(delete_expense))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_group(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service.create_group(&claims.sub, req.name, req.members).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Groups the caller owns or belongs to", body = [Group]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_groups(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let groups = service.list_groups(&claims.sub, claims.email.as_deref()).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_group(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service.get_group(&group_id, &claims.sub).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Member added", body = Group),
        (status = 403, description = "Not group owner", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_member(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service.add_member(&group_id, &claims.sub, req.into()).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/claim",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Pending membership claimed", body = Group),
        (status = 404, description = "No pending membership for the caller", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn claim_membership(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let email = require_email(&claims)?;
    let group = service.claim_membership(&group_id, &claims.sub, email).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses",
    request_body = NewGroupExpense,
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 201, description = "Expense recorded", body = GroupExpense),
        (status = 400, description = "Invalid split or input", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_group_expense(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<NewGroupExpense>,
) -> Result<(StatusCode, Json<GroupExpense>), ApiError> {
    let expense = service.add_expense(&group_id, &claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/expenses/{expense_ref}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("expense_ref" = String, Path, description = "Group expense id or originating personal expense id")
    ),
    responses(
        (status = 200, description = "Balances after removal", body = BalancesResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn remove_group_expense(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((group_id, expense_ref)): Path<(String, String)>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let balances = service.remove_expense(&group_id, &claims.sub, &expense_ref).await?;
    Ok(Json(BalancesResponse { balances }))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/settle",
    request_body = SettleRequest,
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Payment recorded", body = SettleResponse),
        (status = 400, description = "No balance between the parties", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn settle(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let result = service
        .settle(&group_id, &claims.sub, &req.debtor_id, &req.creditor_id, req.amount)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Simplified balances", body = BalancesResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_balances(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let balances = service.get_balances(&group_id, &claims.sub).await?;
    Ok(Json(BalancesResponse { balances }))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/summary",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Group totals and balances", body = GroupSummary),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_summary(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupSummary>, ApiError> {
    let summary = service.get_summary(&group_id, &claims.sub).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = NewPersonalExpense,
    responses(
        (status = 201, description = "Expense created", body = PersonalExpense),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not a member of the linked group", body = ErrorResponse),
        (status = 404, description = "Linked group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_expense(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewPersonalExpense>,
) -> Result<(StatusCode, Json<PersonalExpense>), ApiError> {
    let expense = service.create_personal_expense(&claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "Own expenses plus those shared into the caller's groups", body = [ExpenseView]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_expenses(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ExpenseView>>, ApiError> {
    let expenses = service.list_expenses(&claims.sub, claims.email.as_deref()).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "ID of the personal expense")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_expense(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_personal_expense(&claims.sub, &expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
