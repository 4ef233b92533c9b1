//! Team naming, slug addressing and read-side queries

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use roster_db::entities::{owner, person, team, team_member, Owner, Person, Team, TeamMember};

use crate::context::OperatorIdentity;
use crate::error::{NotFound, RosterResult};
use crate::export::{MemberRow, TeamExport};

const NAME_PREFIX: &str = "Team ";

/// Letter label for a 0-based position: A..Z, then AA, AB, ... (bijective base 26).
pub fn team_label(position: usize) -> String {
    let mut n = position + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// "Team A", "Team B", ... for a 0-based position
pub fn team_name(position: usize) -> String {
    format!("{}{}", NAME_PREFIX, team_label(position))
}

/// URL slug for a generated team name: the label after "Team ", lowercased.
pub fn team_slug(name: &str) -> String {
    name.strip_prefix(NAME_PREFIX)
        .unwrap_or(name)
        .to_ascii_lowercase()
}

/// Team as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub owner_id: i32,
    pub owner_name: Option<String>,
    pub captain_serial_number: Option<i64>,
    pub member_count: u64,
    pub created_at: DateTime<Utc>,
}

/// One member row joined with the person record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub membership_id: i32,
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
    pub entry_seq: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamDetail {
    pub team: TeamSummary,
    pub members: Vec<MemberView>,
}

impl TeamDetail {
    /// Structured input for the CSV and printable renderers
    pub fn to_export(&self, generated_at: DateTime<Utc>) -> TeamExport {
        TeamExport {
            team_name: self.team.name.clone(),
            owner_name: self.team.owner_name.clone().unwrap_or_default(),
            members: self
                .members
                .iter()
                .map(|m| MemberRow {
                    serial_number: m.serial_number,
                    full_name: m.full_name.clone(),
                    mobile_number: m.mobile_number.clone(),
                    entry_seq: m.entry_seq.clone(),
                })
                .collect(),
            generated_at,
        }
    }
}

/// Dashboard totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub people: u64,
    pub owners: u64,
    pub teams: u64,
    pub memberships: u64,
    pub unassigned_people: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamRemoval {
    pub memberships_removed: u64,
}

/// Delete the memberships of the given teams, then the teams.
///
/// Returns `(memberships_removed, teams_removed)`. Callers own the transaction.
pub(crate) async fn delete_teams<C: ConnectionTrait>(
    conn: &C,
    team_ids: &[i32],
) -> Result<(u64, u64), DbErr> {
    if team_ids.is_empty() {
        return Ok((0, 0));
    }

    let memberships = TeamMember::delete_many()
        .filter(team_member::Column::TeamId.is_in(team_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;

    let teams = Team::delete_many()
        .filter(team::Column::Id.is_in(team_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;

    Ok((memberships, teams))
}

async fn member_counts<C: ConnectionTrait>(conn: &C) -> Result<HashMap<i32, u64>, DbErr> {
    Ok(TeamMember::find()
        .select_only()
        .column(team_member::Column::TeamId)
        .column_as(team_member::Column::Id.count(), "member_count")
        .group_by(team_member::Column::TeamId)
        .into_tuple::<(i32, i64)>()
        .all(conn)
        .await?
        .into_iter()
        .map(|(team_id, count)| (team_id, count.max(0) as u64))
        .collect())
}

fn summarize(team: team::Model, owner: Option<owner::Model>, member_count: u64) -> TeamSummary {
    TeamSummary {
        slug: team_slug(&team.name),
        id: team.id,
        name: team.name,
        owner_id: team.owner_id,
        owner_name: owner.map(|o| o.name),
        captain_serial_number: team.captain_serial_number,
        member_count,
        created_at: team.created_at,
    }
}

/// Read access to teams plus single-team deletion
#[derive(Clone)]
pub struct TeamDirectory {
    db: DatabaseConnection,
}

impl TeamDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every team with its owner name, ordered by id
    pub async fn list_with_owners(&self) -> RosterResult<Vec<TeamSummary>> {
        let rows = Team::find()
            .find_also_related(Owner)
            .order_by_asc(team::Column::Id)
            .all(&self.db)
            .await?;
        let counts = member_counts(&self.db).await?;

        Ok(rows
            .into_iter()
            .map(|(team, owner)| {
                let count = counts.get(&team.id).copied().unwrap_or(0);
                summarize(team, owner, count)
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> RosterResult<team::Model> {
        Ok(Team::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Team(id))?)
    }

    /// Resolve a slug such as `a` or `B` to its team.
    pub async fn lookup_team_by_slug(&self, slug: &str) -> RosterResult<team::Model> {
        let normalized = slug.trim().to_ascii_lowercase();
        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(NotFound::TeamSlug(slug.to_string()).into());
        }

        let expected = format!("{}{}", NAME_PREFIX, normalized.to_ascii_uppercase());
        match Team::find()
            .filter(team::Column::Name.eq(expected.as_str()))
            .order_by_asc(team::Column::Id)
            .one(&self.db)
            .await?
        {
            Some(team) => Ok(team),
            None => {
                debug!(slug, "No team for slug");
                Err(NotFound::TeamSlug(slug.to_string()).into())
            }
        }
    }

    /// Team with owner name and members, members in join order
    pub async fn detail(&self, id: i32) -> RosterResult<TeamDetail> {
        let (team, owner) = Team::find_by_id(id)
            .find_also_related(Owner)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Team(id))?;

        let rows = TeamMember::find()
            .filter(team_member::Column::TeamId.eq(id))
            .find_also_related(Person)
            .order_by_asc(team_member::Column::Id)
            .all(&self.db)
            .await?;

        let members: Vec<MemberView> = rows
            .into_iter()
            .filter_map(|(member, person)| match person {
                Some(p) => Some(member_view(member, p)),
                None => {
                    warn!(
                        membership_id = member.id,
                        serial_number = member.person_serial_number,
                        "Membership without person record"
                    );
                    None
                }
            })
            .collect();

        let member_count = members.len() as u64;
        Ok(TeamDetail {
            team: summarize(team, owner, member_count),
            members,
        })
    }

    pub async fn detail_by_slug(&self, slug: &str) -> RosterResult<TeamDetail> {
        let team = self.lookup_team_by_slug(slug).await?;
        self.detail(team.id).await
    }

    /// Export payload for a team, stamped with the current time
    pub async fn export(&self, id: i32) -> RosterResult<TeamExport> {
        Ok(self.detail(id).await?.to_export(Utc::now()))
    }

    /// Delete one team and its memberships.
    pub async fn remove(&self, actor: &OperatorIdentity, id: i32) -> RosterResult<TeamRemoval> {
        let tx = self.db.begin().await?;

        let team = Team::find_by_id(id)
            .one(&tx)
            .await?
            .ok_or(NotFound::Team(id))?;

        let (memberships_removed, _) = delete_teams(&tx, &[team.id]).await?;
        tx.commit().await?;

        info!(
            operator = %actor.username,
            team_id = id,
            team = %team.name,
            memberships_removed,
            "Team deleted"
        );
        Ok(TeamRemoval {
            memberships_removed,
        })
    }

    pub async fn stats(&self) -> RosterResult<RosterStats> {
        let people = Person::find().count(&self.db).await?;
        let owners = Owner::find().count(&self.db).await?;
        let teams = Team::find().count(&self.db).await?;
        let memberships = TeamMember::find().count(&self.db).await?;

        Ok(RosterStats {
            people,
            owners,
            teams,
            memberships,
            // Every membership points at a distinct person
            unassigned_people: people.saturating_sub(memberships),
        })
    }
}

fn member_view(member: team_member::Model, person: person::Model) -> MemberView {
    MemberView {
        membership_id: member.id,
        serial_number: person.serial_number,
        full_name: person.full_name,
        mobile_number: person.mobile_number,
        entry_seq: person.entry_seq,
        joined_at: member.created_at,
    }
}
