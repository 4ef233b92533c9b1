//! People registry keyed by serial number

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use roster_db::entities::{person, team, team_member, Person, Team, TeamMember};

use crate::context::OperatorIdentity;
use crate::error::{
    is_foreign_key_violation, is_unique_violation, Conflict, NotFound, RosterResult,
    StateViolation, ValidationError,
};

/// Raw person record as typed by an operator or produced by the import parser.
///
/// Nothing is validated until the record reaches [`PersonRegistry::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub entry_seq: Option<String>,
    pub serial_number: String,
    pub full_name: String,
    pub mobile_number: String,
}

/// A record that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidPerson {
    pub entry_seq: Option<String>,
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
}

impl NewPerson {
    pub fn new(
        entry_seq: Option<&str>,
        serial_number: impl Into<String>,
        full_name: impl Into<String>,
        mobile_number: impl Into<String>,
    ) -> Self {
        Self {
            entry_seq: entry_seq.map(str::to_string),
            serial_number: serial_number.into(),
            full_name: full_name.into(),
            mobile_number: mobile_number.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<ValidPerson, ValidationError> {
        let serial = self.serial_number.trim();
        if serial.is_empty() {
            return Err(ValidationError::MissingField("SR No"));
        }
        let serial_number = match serial.parse::<i64>() {
            Ok(n) if n > 0 => n,
            _ => return Err(ValidationError::InvalidSerial(serial.to_string())),
        };

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingField("Full Name"));
        }

        let mobile_number = self.mobile_number.trim();
        if mobile_number.is_empty() {
            return Err(ValidationError::MissingField("Mobile Number"));
        }

        let entry_seq = self
            .entry_seq
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ValidPerson {
            entry_seq,
            serial_number,
            full_name: full_name.to_string(),
            mobile_number: mobile_number.to_string(),
        })
    }
}

/// Insert a validated person on any connection or transaction.
///
/// The pre-check gives the common case a clean conflict; the unique index
/// catches the race where two writers pass the check at once.
pub(crate) async fn insert_person<C: ConnectionTrait>(
    conn: &C,
    valid: ValidPerson,
) -> RosterResult<person::Model> {
    let serial = valid.serial_number;

    let existing = Person::find()
        .filter(person::Column::SerialNumber.eq(serial))
        .count(conn)
        .await?;
    if existing > 0 {
        return Err(Conflict::DuplicateSerial(serial).into());
    }

    let model = person::ActiveModel {
        entry_seq: Set(valid.entry_seq),
        serial_number: Set(serial),
        full_name: Set(valid.full_name),
        mobile_number: Set(valid.mobile_number),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match model.insert(conn).await {
        Ok(stored) => Ok(stored),
        Err(e) if is_unique_violation(&e) => Err(Conflict::DuplicateSerial(serial).into()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Clone)]
pub struct PersonRegistry {
    db: DatabaseConnection,
}

impl PersonRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register one person. The serial number is immutable afterwards.
    pub async fn add(
        &self,
        actor: &OperatorIdentity,
        record: NewPerson,
    ) -> RosterResult<person::Model> {
        let valid = record.validate()?;
        let stored = insert_person(&self.db, valid).await?;

        info!(
            operator = %actor.username,
            serial_number = stored.serial_number,
            "Person added"
        );
        Ok(stored)
    }

    /// Delete a person who is not on any team and captains none.
    pub async fn remove(&self, actor: &OperatorIdentity, id: i32) -> RosterResult<()> {
        let tx = self.db.begin().await?;

        let person = Person::find_by_id(id)
            .one(&tx)
            .await?
            .ok_or(NotFound::Person(id))?;

        let memberships = TeamMember::find()
            .filter(team_member::Column::PersonSerialNumber.eq(person.serial_number))
            .count(&tx)
            .await?;
        if memberships > 0 {
            warn!(
                operator = %actor.username,
                serial_number = person.serial_number,
                "Refusing to delete person assigned to a team"
            );
            return Err(StateViolation::PersonInTeam(person.serial_number).into());
        }

        let captained = Team::find()
            .filter(team::Column::CaptainSerialNumber.eq(person.serial_number))
            .count(&tx)
            .await?;
        if captained > 0 {
            warn!(
                operator = %actor.username,
                serial_number = person.serial_number,
                teams = captained,
                "Refusing to delete team captain"
            );
            return Err(StateViolation::PersonIsCaptain(person.serial_number).into());
        }

        match Person::delete_by_id(id).exec(&tx).await {
            Ok(_) => {}
            // A membership or captaincy slipped in after the checks
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(StateViolation::PersonInTeam(person.serial_number).into());
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        info!(
            operator = %actor.username,
            serial_number = person.serial_number,
            "Person deleted"
        );
        Ok(())
    }

    pub async fn get(&self, id: i32) -> RosterResult<person::Model> {
        Ok(Person::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Person(id))?)
    }

    pub async fn lookup_by_serial(&self, serial_number: i64) -> RosterResult<Option<person::Model>> {
        debug!(serial_number, "Looking up person by serial");
        Ok(Person::find()
            .filter(person::Column::SerialNumber.eq(serial_number))
            .one(&self.db)
            .await?)
    }

    /// Everyone, ordered by serial number
    pub async fn list_all(&self) -> RosterResult<Vec<person::Model>> {
        Ok(Person::find()
            .order_by_asc(person::Column::SerialNumber)
            .all(&self.db)
            .await?)
    }

    pub async fn count(&self) -> RosterResult<u64> {
        Ok(Person::find().count(&self.db).await?)
    }
}
