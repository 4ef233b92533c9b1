use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use roster_db::entities::{operator, owner, person, team, team_member};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Plain confirmation message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================
// Auth
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Session token (also set as an HTTP-only cookie)
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub operator: Operator,
}

// ============================================================
// People
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Person {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_seq: Option<String>,
    /// SR No
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<person::Model> for Person {
    fn from(m: person::Model) -> Self {
        Self {
            id: m.id,
            entry_seq: m.entry_seq,
            serial_number: m.serial_number,
            full_name: m.full_name,
            mobile_number: m.mobile_number,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonList {
    pub people: Vec<Person>,
    pub total: usize,
}

/// Register one person
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePersonRequest {
    #[serde(default)]
    pub entry_seq: Option<String>,
    /// SR No, a positive whole number
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
}

/// Bulk import: one `entry, serial, name, mobile` record per line
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub added: usize,
    pub failed: usize,
    /// First few failure messages
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SampleRequest {
    /// Number of serials to fill, 55 when omitted
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SampleResponse {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub message: String,
}

// ============================================================
// Owners
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Owner {
    pub id: i32,
    pub name: String,
    pub team_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn from_model(m: owner::Model, team_count: u64) -> Self {
        Self {
            id: m.id,
            name: m.name,
            team_count,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerList {
    pub owners: Vec<Owner>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerDeletedResponse {
    pub teams_removed: u64,
    pub memberships_removed: u64,
}

// ============================================================
// Teams
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub id: i32,
    pub name: String,
    /// URL slug, e.g. `a` for "Team A"
    pub slug: String,
    pub owner_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Legacy captain SR No
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captain_serial_number: Option<i64>,
    pub member_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<roster_core::TeamSummary> for Team {
    fn from(s: roster_core::TeamSummary) -> Self {
        Self {
            id: s.id,
            name: s.name,
            slug: s.slug,
            owner_id: s.owner_id,
            owner_name: s.owner_name,
            captain_serial_number: s.captain_serial_number,
            member_count: s.member_count,
            created_at: s.created_at,
        }
    }
}

impl From<team::Model> for Team {
    fn from(m: team::Model) -> Self {
        Self {
            slug: roster_core::team_slug(&m.name),
            id: m.id,
            name: m.name,
            owner_id: m.owner_id,
            owner_name: None,
            captain_serial_number: m.captain_serial_number,
            member_count: 0,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamList {
    pub teams: Vec<Team>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Member {
    /// Membership id (used to remove the member)
    pub membership_id: i32,
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_seq: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<roster_core::MemberView> for Member {
    fn from(v: roster_core::MemberView) -> Self {
        Self {
            membership_id: v.membership_id,
            serial_number: v.serial_number,
            full_name: v.full_name,
            mobile_number: v.mobile_number,
            entry_seq: v.entry_seq,
            joined_at: v.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<Member>,
}

impl From<roster_core::TeamDetail> for TeamDetail {
    fn from(d: roster_core::TeamDetail) -> Self {
        Self {
            team: d.team.into(),
            members: d.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rebuild all teams from an ordered list of owners
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegenerateRequest {
    /// Owner ids in team order: first owner gets "Team A"
    pub owner_ids: Vec<i32>,
    /// Optional legacy captain SR No per position. Empty, or one entry per owner.
    #[serde(default)]
    pub captain_serials: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamCreationFailure {
    pub position: usize,
    pub owner_id: i32,
    pub team_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegenerateResponse {
    /// e.g. "created 3 of 4 teams"
    pub message: String,
    pub requested: usize,
    pub created_count: usize,
    pub removed_teams: u64,
    pub removed_memberships: u64,
    pub teams: Vec<Team>,
    pub errors: Vec<TeamCreationFailure>,
}

impl From<roster_core::RegenerationReport> for RegenerateResponse {
    fn from(r: roster_core::RegenerationReport) -> Self {
        Self {
            message: r.summary(),
            requested: r.requested,
            created_count: r.created_count,
            removed_teams: r.removed_teams,
            removed_memberships: r.removed_memberships,
            teams: r.teams.into_iter().map(Into::into).collect(),
            errors: r
                .per_item_errors
                .into_iter()
                .map(|e| TeamCreationFailure {
                    position: e.position,
                    owner_id: e.owner_id,
                    team_name: e.team_name,
                    message: e.message,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamDeletedResponse {
    pub memberships_removed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet download
    #[default]
    Csv,
    /// Printable HTML page
    Print,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `csv` (default) or `print`
    #[serde(default)]
    pub format: ExportFormat,
}

// ============================================================
// Memberships
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    /// SR No of the person to add
    pub serial_number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    pub id: i32,
    pub team_id: i32,
    pub person_serial_number: i64,
    pub created_at: DateTime<Utc>,
}

impl From<team_member::Model> for Membership {
    fn from(m: team_member::Model) -> Self {
        Self {
            id: m.id,
            team_id: m.team_id,
            person_serial_number: m.person_serial_number,
            created_at: m.created_at,
        }
    }
}

// ============================================================
// Operators
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Operator {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<operator::Model> for Operator {
    fn from(m: operator::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            full_name: m.full_name,
            email: m.email,
            is_active: m.is_active,
            created_at: m.created_at,
            last_login_at: m.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperatorList {
    pub operators: Vec<Operator>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOperatorRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOperatorRequest {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub is_active: bool,
    /// New password; leave empty to keep the current one
    #[serde(default)]
    pub password: Option<String>,
}

// ============================================================
// Dashboard
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub people: u64,
    pub owners: u64,
    pub teams: u64,
    pub memberships: u64,
    pub unassigned_people: u64,
}

impl From<roster_core::RosterStats> for StatsResponse {
    fn from(s: roster_core::RosterStats) -> Self {
        Self {
            people: s.people,
            owners: s.owners,
            teams: s.teams,
            memberships: s.memberships,
            unassigned_people: s.unassigned_people,
        }
    }
}
