//! Membership guard: one person, one team

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};

use roster_db::entities::{person, team_member, Person, Team, TeamMember};

use crate::context::OperatorIdentity;
use crate::error::{is_unique_violation, Conflict, NotFound, RosterError, RosterResult};

#[derive(Clone)]
pub struct MembershipGuard {
    db: DatabaseConnection,
}

impl MembershipGuard {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Put a person on a team.
    ///
    /// Checks run in a fixed order: team exists, person exists, person is not
    /// this team's captain, person is on no team at all. The unique indexes on
    /// `team_members` back the last two checks up when writers race.
    pub async fn add_member(
        &self,
        actor: &OperatorIdentity,
        team_id: i32,
        serial_number: i64,
    ) -> RosterResult<team_member::Model> {
        let tx = self.db.begin().await?;

        let team = Team::find_by_id(team_id)
            .one(&tx)
            .await?
            .ok_or(NotFound::Team(team_id))?;

        let person_exists = Person::find()
            .filter(person::Column::SerialNumber.eq(serial_number))
            .count(&tx)
            .await?
            > 0;
        if !person_exists {
            return Err(NotFound::PersonSerial(serial_number).into());
        }

        if team.captain_serial_number == Some(serial_number) {
            return Err(Conflict::AlreadyTeamOwner(serial_number).into());
        }

        let assigned = TeamMember::find()
            .filter(team_member::Column::PersonSerialNumber.eq(serial_number))
            .count(&tx)
            .await?
            > 0;
        if assigned {
            warn!(
                operator = %actor.username,
                team_id,
                serial_number,
                "Person already assigned to a team"
            );
            return Err(Conflict::AlreadyAssigned(serial_number).into());
        }

        let model = team_member::ActiveModel {
            team_id: Set(team_id),
            person_serial_number: Set(serial_number),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        // Savepoint so a constraint failure leaves the outer transaction usable
        let savepoint = tx.begin().await?;
        let stored = match model.insert(&savepoint).await {
            Ok(stored) => {
                savepoint.commit().await?;
                stored
            }
            Err(e) if is_unique_violation(&e) => {
                savepoint.rollback().await?;
                return Err(self.classify_race(&tx, team_id, serial_number).await?);
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        info!(
            operator = %actor.username,
            team = %team.name,
            serial_number,
            "Member added"
        );
        Ok(stored)
    }

    /// Which uniqueness rule a concurrent insert tripped
    async fn classify_race<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        serial_number: i64,
    ) -> RosterResult<RosterError> {
        let pair_exists = TeamMember::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::PersonSerialNumber.eq(serial_number))
            .count(conn)
            .await?
            > 0;

        Ok(if pair_exists {
            Conflict::DuplicatePair {
                team_id,
                serial_number,
            }
            .into()
        } else {
            Conflict::AlreadyAssigned(serial_number).into()
        })
    }

    pub async fn remove_member(
        &self,
        actor: &OperatorIdentity,
        membership_id: i32,
    ) -> RosterResult<()> {
        let result = TeamMember::delete_by_id(membership_id)
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(NotFound::Membership(membership_id).into());
        }

        info!(operator = %actor.username, membership_id, "Member removed");
        Ok(())
    }

    /// Memberships of one team in join order
    pub async fn members_of(&self, team_id: i32) -> RosterResult<Vec<team_member::Model>> {
        Ok(TeamMember::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .order_by_asc(team_member::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Number of memberships held by a serial number (0 or 1)
    pub async fn membership_count(&self, serial_number: i64) -> RosterResult<u64> {
        Ok(TeamMember::find()
            .filter(team_member::Column::PersonSerialNumber.eq(serial_number))
            .count(&self.db)
            .await?)
    }
}
