//! Owner registry with transactional cascade delete

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

use roster_db::entities::{owner, team, Owner, Team};

use crate::context::OperatorIdentity;
use crate::error::{is_unique_violation, Conflict, NotFound, RosterResult, ValidationError};
use crate::teams::delete_teams;

/// Owner row with the number of teams organized under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    #[serde(flatten)]
    pub owner: owner::Model,
    pub team_count: u64,
}

/// What an owner cascade removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnerRemoval {
    pub teams_removed: u64,
    pub memberships_removed: u64,
}

#[derive(Clone)]
pub struct OwnerRegistry {
    db: DatabaseConnection,
}

fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("Owner name"));
    }
    Ok(name.to_string())
}

impl OwnerRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add(&self, actor: &OperatorIdentity, name: &str) -> RosterResult<owner::Model> {
        let name = normalize_name(name)?;

        if self.name_taken(&name, None).await? {
            return Err(Conflict::DuplicateOwnerName(name).into());
        }

        let model = owner::ActiveModel {
            name: Set(name.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let stored = match model.insert(&self.db).await {
            Ok(stored) => stored,
            Err(e) if is_unique_violation(&e) => {
                return Err(Conflict::DuplicateOwnerName(name).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(operator = %actor.username, owner_id = stored.id, name = %stored.name, "Owner added");
        Ok(stored)
    }

    pub async fn update(
        &self,
        actor: &OperatorIdentity,
        id: i32,
        name: &str,
    ) -> RosterResult<owner::Model> {
        let name = normalize_name(name)?;

        let existing = Owner::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Owner(id))?;

        if self.name_taken(&name, Some(id)).await? {
            return Err(Conflict::DuplicateOwnerName(name).into());
        }

        let mut active: owner::ActiveModel = existing.into();
        active.name = Set(name.clone());

        let stored = match active.update(&self.db).await {
            Ok(stored) => stored,
            Err(e) if is_unique_violation(&e) => {
                return Err(Conflict::DuplicateOwnerName(name).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(operator = %actor.username, owner_id = id, name = %stored.name, "Owner renamed");
        Ok(stored)
    }

    /// Delete an owner together with its teams and their memberships.
    ///
    /// Runs in one transaction; readers see either everything or nothing.
    pub async fn remove(&self, actor: &OperatorIdentity, id: i32) -> RosterResult<OwnerRemoval> {
        let tx = self.db.begin().await?;

        if Owner::find_by_id(id).one(&tx).await?.is_none() {
            return Err(NotFound::Owner(id).into());
        }

        let team_ids: Vec<i32> = Team::find()
            .select_only()
            .column(team::Column::Id)
            .filter(team::Column::OwnerId.eq(id))
            .into_tuple()
            .all(&tx)
            .await?;

        let (memberships_removed, teams_removed) = delete_teams(&tx, &team_ids).await?;
        Owner::delete_by_id(id).exec(&tx).await?;

        tx.commit().await?;

        info!(
            operator = %actor.username,
            owner_id = id,
            teams_removed,
            memberships_removed,
            "Owner deleted with its teams"
        );

        Ok(OwnerRemoval {
            teams_removed,
            memberships_removed,
        })
    }

    pub async fn get(&self, id: i32) -> RosterResult<owner::Model> {
        Ok(Owner::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Owner(id))?)
    }

    /// All owners ordered by name
    pub async fn list_all(&self) -> RosterResult<Vec<owner::Model>> {
        Ok(Owner::find()
            .order_by_asc(owner::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// All owners ordered by name, each with its team count
    pub async fn list_with_team_counts(&self) -> RosterResult<Vec<OwnerSummary>> {
        let owners = self.list_all().await?;

        let counts: HashMap<i32, i64> = Team::find()
            .select_only()
            .column(team::Column::OwnerId)
            .column_as(team::Column::Id.count(), "team_count")
            .group_by(team::Column::OwnerId)
            .into_tuple::<(i32, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        Ok(owners
            .into_iter()
            .map(|owner| {
                let team_count = counts.get(&owner.id).copied().unwrap_or(0).max(0) as u64;
                OwnerSummary { owner, team_count }
            })
            .collect())
    }

    pub async fn team_count(&self, id: i32) -> RosterResult<u64> {
        Ok(Team::find()
            .filter(team::Column::OwnerId.eq(id))
            .count(&self.db)
            .await?)
    }

    async fn name_taken(&self, name: &str, except: Option<i32>) -> RosterResult<bool> {
        let mut query = Owner::find().filter(owner::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(owner::Column::Id.ne(id));
        }
        let taken = query.count(&self.db).await? > 0;
        if taken {
            warn!(name, "Owner name already in use");
        }
        Ok(taken)
    }
}
