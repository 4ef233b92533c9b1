//! Bulk maintenance operations run from the command line

use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde::Serialize;
use tracing::info;

use roster_db::entities::{Person, Team, TeamMember};

use crate::context::OperatorIdentity;
use crate::error::RosterResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub memberships: u64,
    pub teams: u64,
    pub people: u64,
}

#[derive(Clone)]
pub struct Maintenance {
    db: DatabaseConnection,
}

impl Maintenance {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Delete every membership, team and person in one transaction.
    ///
    /// Owners and operator accounts are kept.
    pub async fn clear_all_data(&self, actor: &OperatorIdentity) -> RosterResult<ClearReport> {
        let tx = self.db.begin().await?;

        let memberships = TeamMember::delete_many().exec(&tx).await?.rows_affected;
        let teams = Team::delete_many().exec(&tx).await?.rows_affected;
        let people = Person::delete_many().exec(&tx).await?.rows_affected;

        tx.commit().await?;

        info!(
            operator = %actor.username,
            memberships,
            teams,
            people,
            "All roster data cleared"
        );
        Ok(ClearReport {
            memberships,
            teams,
            people,
        })
    }
}
