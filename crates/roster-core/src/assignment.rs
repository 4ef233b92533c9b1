//! Team assignment engine
//!
//! Rebuilds the whole team set from an ordered list of owners. A regeneration
//! has three passes, all inside one database transaction:
//!
//! 1. **Validation**: every owner id (and legacy captain serial) must resolve.
//!    Any unresolved id aborts before anything is written.
//! 2. **Destruction**: every membership and every team is deleted,
//!    unconditionally.
//! 3. **Creation**: one team per owner, named "Team A", "Team B", ... by
//!    position. Each team is inserted under its own savepoint, so a failure on
//!    one is recorded in the report and the rest still get created.
//!
//! The transaction commits after the creation pass, so readers never see the
//! intermediate empty state. Partial creation is committed and reported, never
//! silently rolled back.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use roster_db::entities::{owner, person, team, Owner, Person, Team, TeamMember};

use crate::context::OperatorIdentity;
use crate::error::{RosterResult, ValidationError};
use crate::teams::team_name;

/// One team to create: its owner, and optionally a legacy captain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSeed {
    pub owner_id: i32,
    pub captain_serial: Option<i64>,
}

impl TeamSeed {
    pub fn owner(owner_id: i32) -> Self {
        Self {
            owner_id,
            captain_serial: None,
        }
    }
}

/// A team that could not be created during regeneration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamCreationError {
    pub position: usize,
    pub owner_id: i32,
    pub team_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegenerationReport {
    /// Number of teams asked for
    pub requested: usize,
    pub created_count: usize,
    pub removed_teams: u64,
    pub removed_memberships: u64,
    /// Created teams in position order
    pub teams: Vec<team::Model>,
    pub per_item_errors: Vec<TeamCreationError>,
}

impl RegenerationReport {
    pub fn is_complete(&self) -> bool {
        self.per_item_errors.is_empty() && self.created_count == self.requested
    }

    /// e.g. "created 3 of 4 teams"
    pub fn summary(&self) -> String {
        format!("created {} of {} teams", self.created_count, self.requested)
    }
}

#[derive(Clone)]
pub struct TeamAssignmentEngine {
    db: DatabaseConnection,
}

impl TeamAssignmentEngine {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replace all teams with one team per owner, in the given order.
    ///
    /// An empty list leaves the team set empty.
    pub async fn regenerate(
        &self,
        actor: &OperatorIdentity,
        ordered_owner_ids: &[i32],
    ) -> RosterResult<RegenerationReport> {
        let seeds: Vec<TeamSeed> = ordered_owner_ids
            .iter()
            .copied()
            .map(TeamSeed::owner)
            .collect();
        self.regenerate_with_captains(actor, &seeds).await
    }

    /// Same as [`regenerate`](Self::regenerate) but lets each team carry a
    /// legacy captain, who can then not be added as a member of that team.
    pub async fn regenerate_with_captains(
        &self,
        actor: &OperatorIdentity,
        seeds: &[TeamSeed],
    ) -> RosterResult<RegenerationReport> {
        let tx = self.db.begin().await?;

        // Validation: nothing is written if this fails; dropping tx rolls back
        validate_seeds(&tx, seeds).await?;

        // Destruction
        let removed_memberships = TeamMember::delete_many().exec(&tx).await?.rows_affected;
        let removed_teams = Team::delete_many().exec(&tx).await?.rows_affected;

        // Creation
        let (teams, per_item_errors) = create_teams(&tx, seeds).await?;

        tx.commit().await?;

        let report = RegenerationReport {
            requested: seeds.len(),
            created_count: teams.len(),
            removed_teams,
            removed_memberships,
            teams,
            per_item_errors,
        };

        if report.is_complete() {
            info!(
                operator = %actor.username,
                removed_teams,
                removed_memberships,
                "Teams regenerated: {}",
                report.summary()
            );
        } else {
            warn!(
                operator = %actor.username,
                failures = report.per_item_errors.len(),
                "Teams regenerated with failures: {}",
                report.summary()
            );
        }

        Ok(report)
    }
}

async fn validate_seeds(tx: &DatabaseTransaction, seeds: &[TeamSeed]) -> RosterResult<()> {
    let owner_ids: Vec<i32> = dedup(seeds.iter().map(|s| s.owner_id));
    if !owner_ids.is_empty() {
        let known: HashSet<i32> = Owner::find()
            .select_only()
            .column(owner::Column::Id)
            .filter(owner::Column::Id.is_in(owner_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(tx)
            .await?
            .into_iter()
            .collect();

        let unresolved: Vec<i32> = owner_ids
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        if !unresolved.is_empty() {
            warn!(?unresolved, "Regeneration rejected: unknown owner ids");
            return Err(ValidationError::InvalidOwnerIds(unresolved).into());
        }
    }

    let captains: Vec<i64> = dedup(seeds.iter().filter_map(|s| s.captain_serial));
    if !captains.is_empty() {
        let known: HashSet<i64> = Person::find()
            .select_only()
            .column(person::Column::SerialNumber)
            .filter(person::Column::SerialNumber.is_in(captains.iter().copied()))
            .into_tuple::<i64>()
            .all(tx)
            .await?
            .into_iter()
            .collect();

        let unresolved: Vec<i64> = captains
            .into_iter()
            .filter(|serial| !known.contains(serial))
            .collect();
        if !unresolved.is_empty() {
            warn!(?unresolved, "Regeneration rejected: unknown captains");
            return Err(ValidationError::UnknownCaptains(unresolved).into());
        }
    }

    Ok(())
}

/// Insert one team per seed, each under its own savepoint.
///
/// Storage failures on individual teams are collected rather than returned;
/// only a failure to open or close a savepoint aborts the pass.
pub(crate) async fn create_teams(
    tx: &DatabaseTransaction,
    seeds: &[TeamSeed],
) -> RosterResult<(Vec<team::Model>, Vec<TeamCreationError>)> {
    let mut created = Vec::with_capacity(seeds.len());
    let mut errors = Vec::new();

    for (position, seed) in seeds.iter().enumerate() {
        let name = team_name(position);
        let model = team::ActiveModel {
            name: Set(name.clone()),
            owner_id: Set(seed.owner_id),
            captain_serial_number: Set(seed.captain_serial),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let savepoint = tx.begin().await?;
        match model.insert(&savepoint).await {
            Ok(stored) => {
                savepoint.commit().await?;
                created.push(stored);
            }
            Err(e) => {
                savepoint.rollback().await?;
                warn!(position, owner_id = seed.owner_id, team = %name, error = %e, "Failed to create team");
                errors.push(TeamCreationError {
                    position,
                    owner_id: seed.owner_id,
                    team_name: name,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok((created, errors))
}

fn dedup<T: Copy + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}
