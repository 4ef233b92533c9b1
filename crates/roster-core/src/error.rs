//! Error taxonomy for roster operations

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Coarse classification used by outer layers (HTTP status, exit codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    State,
    Unauthenticated,
    Internal,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    State(#[from] StateViolation),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("Password processing failed: {0}")]
    Credential(roster_auth::PasswordError),

    #[error("Database error: {0}")]
    Storage(#[from] DbErr),
}

/// Missing or malformed input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("SR No must be a positive whole number, got '{0}'.")]
    InvalidSerial(String),

    #[error("Invalid owner IDs: {}", join(.0))]
    InvalidOwnerIds(Vec<i32>),

    #[error("Unknown captain SR Nos: {}", join(.0))]
    UnknownCaptains(Vec<i64>),

    #[error("Got {captains} captain SR Nos for {owners} owners.")]
    CaptainCountMismatch { owners: usize, captains: usize },

    #[error("Password must be at least {0} characters.")]
    WeakPassword(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("Person not found.")]
    Person(i32),

    #[error("Person with SR No {0} not found.")]
    PersonSerial(i64),

    #[error("Team not found.")]
    Team(i32),

    #[error("No team matches '{0}'.")]
    TeamSlug(String),

    #[error("Owner not found.")]
    Owner(i32),

    #[error("Team member not found.")]
    Membership(i32),

    #[error("Operator not found.")]
    Operator(Uuid),
}

/// Uniqueness violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("SR No {0} already exists.")]
    DuplicateSerial(i64),

    #[error("Owner '{0}' already exists.")]
    DuplicateOwnerName(String),

    #[error("This person is already the captain of this team.")]
    AlreadyTeamOwner(i64),

    #[error("This person is already assigned to a team.")]
    AlreadyAssigned(i64),

    #[error("This member is already in this team.")]
    DuplicatePair { team_id: i32, serial_number: i64 },

    #[error("Username '{0}' already exists.")]
    DuplicateUsername(String),
}

/// Deletions refused because something still depends on the row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("Cannot delete person. They are assigned to a team. Remove them from team first.")]
    PersonInTeam(i64),

    #[error("Cannot delete person. They are the captain of a team.")]
    PersonIsCaptain(i64),

    #[error("Cannot delete the last operator account.")]
    LastOperator,

    #[error("You cannot delete your own account.")]
    SelfDeletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Authentication required.")]
    Unauthenticated,

    #[error("Invalid username or password.")]
    InvalidCredentials,
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::Validation(_) => ErrorKind::Validation,
            RosterError::NotFound(_) => ErrorKind::NotFound,
            RosterError::Conflict(_) => ErrorKind::Conflict,
            RosterError::State(_) => ErrorKind::State,
            RosterError::Auth(_) => ErrorKind::Unauthenticated,
            RosterError::Credential(_) | RosterError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::Validation(e) => match e {
                ValidationError::MissingField(_) => "MISSING_FIELD",
                ValidationError::InvalidSerial(_) => "INVALID_SERIAL",
                ValidationError::InvalidOwnerIds(_) => "INVALID_OWNER_IDS",
                ValidationError::UnknownCaptains(_) => "UNKNOWN_CAPTAINS",
                ValidationError::CaptainCountMismatch { .. } => "CAPTAIN_COUNT_MISMATCH",
                ValidationError::WeakPassword(_) => "WEAK_PASSWORD",
            },
            RosterError::NotFound(e) => match e {
                NotFound::Person(_) | NotFound::PersonSerial(_) => "PERSON_NOT_FOUND",
                NotFound::Team(_) | NotFound::TeamSlug(_) => "TEAM_NOT_FOUND",
                NotFound::Owner(_) => "OWNER_NOT_FOUND",
                NotFound::Membership(_) => "MEMBER_NOT_FOUND",
                NotFound::Operator(_) => "OPERATOR_NOT_FOUND",
            },
            RosterError::Conflict(e) => match e {
                Conflict::DuplicateSerial(_) => "DUPLICATE_SERIAL",
                Conflict::DuplicateOwnerName(_) => "DUPLICATE_OWNER_NAME",
                Conflict::AlreadyTeamOwner(_) => "ALREADY_TEAM_OWNER",
                Conflict::AlreadyAssigned(_) => "ALREADY_ASSIGNED",
                Conflict::DuplicatePair { .. } => "DUPLICATE_PAIR",
                Conflict::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            },
            RosterError::State(e) => match e {
                StateViolation::PersonInTeam(_) => "PERSON_IN_TEAM",
                StateViolation::PersonIsCaptain(_) => "PERSON_IS_CAPTAIN",
                StateViolation::LastOperator => "LAST_OPERATOR",
                StateViolation::SelfDeletion => "SELF_DELETION",
            },
            RosterError::Auth(e) => match e {
                AuthFailure::Unauthenticated => "UNAUTHENTICATED",
                AuthFailure::InvalidCredentials => "INVALID_CREDENTIALS",
            },
            RosterError::Credential(_) => "CREDENTIAL_ERROR",
            RosterError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<roster_auth::PasswordError> for RosterError {
    fn from(err: roster_auth::PasswordError) -> Self {
        match err {
            roster_auth::PasswordError::TooShort => {
                ValidationError::WeakPassword(roster_auth::password::MIN_PASSWORD_LENGTH).into()
            }
            other => RosterError::Credential(other),
        }
    }
}

pub type RosterResult<T> = Result<T, RosterError>;

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_codes() {
        let err: RosterError = Conflict::AlreadyAssigned(5).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "ALREADY_ASSIGNED");
        assert_eq!(err.to_string(), "This person is already assigned to a team.");

        let err: RosterError = ValidationError::InvalidOwnerIds(vec![4, 9]).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid owner IDs: 4, 9");
    }

    #[test]
    fn test_short_password_is_validation_error() {
        let err: RosterError = roster_auth::PasswordError::TooShort.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "WEAK_PASSWORD");

        let err: RosterError = roster_auth::PasswordError::HashingFailed("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_state_and_auth_kinds() {
        let err: RosterError = StateViolation::PersonInTeam(5).into();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.code(), "PERSON_IN_TEAM");

        let err: RosterError = StateViolation::PersonIsCaptain(5).into();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.code(), "PERSON_IS_CAPTAIN");

        let err: RosterError = AuthFailure::InvalidCredentials.into();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(err.to_string(), "Invalid username or password.");
    }
}
