use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Json,
};
use roster_auth::SessionClaims;
use roster_core::{
    ErrorKind, NewOperator, NewPerson, OperatorIdentity, OperatorUpdate, TeamSeed, ValidationError,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{api_error, internal_error, ApiError};
use crate::middleware::SESSION_COOKIE;
use crate::models::*;
use crate::AppState;

// ============================================================
// System
// ============================================================

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Dashboard totals
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Roster totals", body = StatsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "system"
)]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.roster.teams().stats().await.map_err(api_error)?;
    Ok(Json(stats.into()))
}

// ============================================================
// Auth
// ============================================================

/// Log in as a portal operator
///
/// Returns the session token and also sets it as an HTTP-only cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .roster
        .operators()
        .authenticate(&req.username, &req.password)
        .await
        .map_err(api_error)?;

    let ttl = state.sessions.ttl();
    let claims = SessionClaims::new(account.id, &account.username, ttl);
    let token = state.sessions.encode(&claims).map_err(internal_error)?;

    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            expires_at: claims.expires_at(),
            operator: account.into(),
        }),
    ))
}

/// Log out (clears the session cookie)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

/// The operator behind the current session
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current operator", body = Operator),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_operator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
) -> Result<Json<Operator>, ApiError> {
    let account = state
        .roster
        .operators()
        .get(actor.operator_id)
        .await
        .map_err(api_error)?;
    Ok(Json(account.into()))
}

// ============================================================
// People
// ============================================================

/// List people ordered by SR No
#[utoipa::path(
    get,
    path = "/api/people",
    responses(
        (status = 200, description = "List of people", body = PersonList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "people"
)]
pub async fn list_people(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PersonList>, ApiError> {
    let people: Vec<Person> = state
        .roster
        .people()
        .list_all()
        .await
        .map_err(api_error)?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = people.len();
    Ok(Json(PersonList { people, total }))
}

/// Register a person
#[utoipa::path(
    post,
    path = "/api/people",
    request_body = CreatePersonRequest,
    responses(
        (status = 201, description = "Person registered", body = Person),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 409, description = "SR No already exists", body = ErrorResponse)
    ),
    tag = "people"
)]
pub async fn create_person(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let candidate = NewPerson::new(
        req.entry_seq.as_deref(),
        req.serial_number.to_string(),
        req.full_name,
        req.mobile_number,
    );

    let person = state
        .roster
        .people()
        .add(&actor, candidate)
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(person.into())))
}

/// Bulk import people from pasted text
#[utoipa::path(
    post,
    path = "/api/people/import",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "people"
)]
pub async fn import_people(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let report = state
        .roster
        .importer()
        .import(&actor, &req.text)
        .await
        .map_err(api_error)?;

    Ok(Json(ImportResponse {
        added: report.added,
        failed: report.failed,
        messages: report.messages,
    }))
}

/// Fill SR No 1..=count with generated people
#[utoipa::path(
    post,
    path = "/api/people/sample",
    request_body = SampleRequest,
    responses(
        (status = 200, description = "Sample data generated", body = SampleResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "people"
)]
pub async fn generate_sample(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<SampleRequest>,
) -> Result<Json<SampleResponse>, ApiError> {
    let count = req.count.unwrap_or(roster_core::DEFAULT_SAMPLE_COUNT);
    let report = state
        .roster
        .samples()
        .generate(&actor, count)
        .await
        .map_err(api_error)?;

    Ok(Json(SampleResponse {
        message: report.message(),
        inserted: report.inserted,
        skipped: report.skipped,
        failed: report.failed,
    }))
}

/// Delete a person who is on no team
#[utoipa::path(
    delete,
    path = "/api/people/{id}",
    params(
        ("id" = i32, Path, description = "Person ID")
    ),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 409, description = "Person is assigned to a team", body = ErrorResponse)
    ),
    tag = "people"
)]
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .roster
        .people()
        .remove(&actor, id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Owners
// ============================================================

/// List owners with their team counts
#[utoipa::path(
    get,
    path = "/api/owners",
    responses(
        (status = 200, description = "List of owners", body = OwnerList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "owners"
)]
pub async fn list_owners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OwnerList>, ApiError> {
    let owners: Vec<Owner> = state
        .roster
        .owners()
        .list_with_team_counts()
        .await
        .map_err(api_error)?
        .into_iter()
        .map(|s| Owner::from_model(s.owner, s.team_count))
        .collect();

    let total = owners.len();
    Ok(Json(OwnerList { owners, total }))
}

/// Add an owner
#[utoipa::path(
    post,
    path = "/api/owners",
    request_body = OwnerRequest,
    responses(
        (status = 201, description = "Owner added", body = Owner),
        (status = 400, description = "Name missing", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "owners"
)]
pub async fn create_owner(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<OwnerRequest>,
) -> Result<(StatusCode, Json<Owner>), ApiError> {
    let owner = state
        .roster
        .owners()
        .add(&actor, &req.name)
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(Owner::from_model(owner, 0))))
}

/// Rename an owner
#[utoipa::path(
    put,
    path = "/api/owners/{id}",
    params(
        ("id" = i32, Path, description = "Owner ID")
    ),
    request_body = OwnerRequest,
    responses(
        (status = 200, description = "Owner renamed", body = Owner),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "owners"
)]
pub async fn update_owner(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<i32>,
    Json(req): Json<OwnerRequest>,
) -> Result<Json<Owner>, ApiError> {
    let owners = state.roster.owners();
    let owner = owners.update(&actor, id, &req.name).await.map_err(api_error)?;
    let team_count = owners.team_count(id).await.map_err(api_error)?;

    Ok(Json(Owner::from_model(owner, team_count)))
}

/// Delete an owner with all of its teams and their memberships
#[utoipa::path(
    delete,
    path = "/api/owners/{id}",
    params(
        ("id" = i32, Path, description = "Owner ID")
    ),
    responses(
        (status = 200, description = "Owner deleted", body = OwnerDeletedResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse)
    ),
    tag = "owners"
)]
pub async fn delete_owner(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<i32>,
) -> Result<Json<OwnerDeletedResponse>, ApiError> {
    let removal = state
        .roster
        .owners()
        .remove(&actor, id)
        .await
        .map_err(api_error)?;

    Ok(Json(OwnerDeletedResponse {
        teams_removed: removal.teams_removed,
        memberships_removed: removal.memberships_removed,
    }))
}

// ============================================================
// Teams
// ============================================================

/// List teams with owner names and member counts
#[utoipa::path(
    get,
    path = "/api/teams",
    responses(
        (status = 200, description = "List of teams", body = TeamList)
    ),
    tag = "teams"
)]
pub async fn list_teams(State(state): State<Arc<AppState>>) -> Result<Json<TeamList>, ApiError> {
    let teams: Vec<Team> = state
        .roster
        .teams()
        .list_with_owners()
        .await
        .map_err(api_error)?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = teams.len();
    Ok(Json(TeamList { teams, total }))
}

/// Team detail by URL slug
#[utoipa::path(
    get,
    path = "/api/teams/by-slug/{slug}",
    params(
        ("slug" = String, Path, description = "Team slug, e.g. `a` for Team A")
    ),
    responses(
        (status = 200, description = "Team with members", body = TeamDetail),
        (status = 404, description = "No such team", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn get_team_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<TeamDetail>, ApiError> {
    debug!("Resolving team slug: {}", slug);
    let detail = state
        .roster
        .teams()
        .detail_by_slug(&slug)
        .await
        .map_err(api_error)?;
    Ok(Json(detail.into()))
}

/// Short team link
///
/// Unknown slugs redirect to the team list instead of failing.
#[utoipa::path(
    get,
    path = "/t/{slug}",
    params(
        ("slug" = String, Path, description = "Team slug")
    ),
    responses(
        (status = 200, description = "Team with members", body = TeamDetail),
        (status = 303, description = "Unknown slug, redirected to the team list")
    ),
    tag = "teams"
)]
pub async fn team_short_link(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    match state.roster.teams().detail_by_slug(&slug).await {
        Ok(detail) => Ok(Json(TeamDetail::from(detail)).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(slug = %slug, "Unknown team slug, redirecting");
            Ok(Redirect::to("/api/teams").into_response())
        }
        Err(e) => Err(api_error(e)),
    }
}

/// Replace every team with one team per owner, in the given order
#[utoipa::path(
    post,
    path = "/api/teams/regenerate",
    request_body = RegenerateRequest,
    responses(
        (status = 200, description = "Teams regenerated; check `errors` for partial failures", body = RegenerateResponse),
        (status = 400, description = "Invalid owner or captain ids, or captain count differs from owner count; nothing changed", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn regenerate_teams(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, ApiError> {
    if !req.captain_serials.is_empty() && req.captain_serials.len() != req.owner_ids.len() {
        return Err(api_error(
            ValidationError::CaptainCountMismatch {
                owners: req.owner_ids.len(),
                captains: req.captain_serials.len(),
            }
            .into(),
        ));
    }

    let seeds: Vec<TeamSeed> = req
        .owner_ids
        .iter()
        .enumerate()
        .map(|(position, &owner_id)| TeamSeed {
            owner_id,
            captain_serial: req.captain_serials.get(position).copied().flatten(),
        })
        .collect();

    let report = state
        .roster
        .assignment()
        .regenerate_with_captains(&actor, &seeds)
        .await
        .map_err(api_error)?;

    Ok(Json(report.into()))
}

/// Delete one team and its memberships
#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(
        ("id" = i32, Path, description = "Team ID")
    ),
    responses(
        (status = 200, description = "Team deleted", body = TeamDeletedResponse),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<i32>,
) -> Result<Json<TeamDeletedResponse>, ApiError> {
    let removal = state
        .roster
        .teams()
        .remove(&actor, id)
        .await
        .map_err(api_error)?;

    Ok(Json(TeamDeletedResponse {
        memberships_removed: removal.memberships_removed,
    }))
}

/// Export a team as CSV or as a printable page
#[utoipa::path(
    get,
    path = "/api/teams/{id}/export",
    params(
        ("id" = i32, Path, description = "Team ID"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "CSV attachment, or printable HTML with `format=print`", body = String, content_type = "text/csv"),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn export_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let export = state.roster.teams().export(id).await.map_err(api_error)?;

    let response = match query.format {
        ExportFormat::Csv => {
            let disposition = format!("attachment; filename=\"{}\"", export.csv_filename());
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.to_csv(),
            )
                .into_response()
        }
        ExportFormat::Print => Html(export.to_printable_html()).into_response(),
    };

    Ok(response)
}

// ============================================================
// Memberships
// ============================================================

/// Add a person to a team by SR No
#[utoipa::path(
    post,
    path = "/api/teams/{id}/members",
    params(
        ("id" = i32, Path, description = "Team ID")
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = Membership),
        (status = 404, description = "Team or person not found", body = ErrorResponse),
        (status = 409, description = "Captain of this team, or already on a team", body = ErrorResponse)
    ),
    tag = "members"
)]
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(team_id): Path<i32>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    let membership = state
        .roster
        .memberships()
        .add_member(&actor, team_id, req.serial_number)
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(membership.into())))
}

/// Remove a member from their team
#[utoipa::path(
    delete,
    path = "/api/members/{id}",
    params(
        ("id" = i32, Path, description = "Membership ID")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 404, description = "Membership not found", body = ErrorResponse)
    ),
    tag = "members"
)]
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .roster
        .memberships()
        .remove_member(&actor, id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Operators
// ============================================================

/// List portal operators, newest first
#[utoipa::path(
    get,
    path = "/api/operators",
    responses(
        (status = 200, description = "List of operators", body = OperatorList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "operators"
)]
pub async fn list_operators(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OperatorList>, ApiError> {
    let operators: Vec<Operator> = state
        .roster
        .operators()
        .list()
        .await
        .map_err(api_error)?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = operators.len();
    Ok(Json(OperatorList { operators, total }))
}

/// Create a portal operator
#[utoipa::path(
    post,
    path = "/api/operators",
    request_body = CreateOperatorRequest,
    responses(
        (status = 201, description = "Operator created", body = Operator),
        (status = 400, description = "Missing field or weak password", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    ),
    tag = "operators"
)]
pub async fn create_operator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Json(req): Json<CreateOperatorRequest>,
) -> Result<(StatusCode, Json<Operator>), ApiError> {
    let account = state
        .roster
        .operators()
        .create(
            &actor,
            NewOperator {
                username: req.username,
                password: req.password,
                full_name: req.full_name,
                email: req.email,
            },
        )
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Update a portal operator
#[utoipa::path(
    put,
    path = "/api/operators/{id}",
    params(
        ("id" = Uuid, Path, description = "Operator ID")
    ),
    request_body = UpdateOperatorRequest,
    responses(
        (status = 200, description = "Operator updated", body = Operator),
        (status = 404, description = "Operator not found", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    ),
    tag = "operators"
)]
pub async fn update_operator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOperatorRequest>,
) -> Result<Json<Operator>, ApiError> {
    let account = state
        .roster
        .operators()
        .update(
            &actor,
            id,
            OperatorUpdate {
                username: req.username,
                full_name: req.full_name,
                email: req.email,
                is_active: req.is_active,
                new_password: req.password,
            },
        )
        .await
        .map_err(api_error)?;

    Ok(Json(account.into()))
}

/// Delete a portal operator
#[utoipa::path(
    delete,
    path = "/api/operators/{id}",
    params(
        ("id" = Uuid, Path, description = "Operator ID")
    ),
    responses(
        (status = 204, description = "Operator deleted"),
        (status = 404, description = "Operator not found", body = ErrorResponse),
        (status = 409, description = "Own account or last remaining operator", body = ErrorResponse)
    ),
    tag = "operators"
)]
pub async fn delete_operator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<OperatorIdentity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .roster
        .operators()
        .remove(&actor, id)
        .await
        .map_err(api_error)?;

    Ok(StatusCode::NO_CONTENT)
}
