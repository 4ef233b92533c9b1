//! Acting operator passed into every mutating call

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roster_db::entities::operator;

/// Who is performing an operation.
///
/// Mutations take this explicitly instead of looking up a session, and use it
/// for audit logging and for the self-deletion rule on operator accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub operator_id: Uuid,
    pub username: String,
}

impl OperatorIdentity {
    pub fn new(operator_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            operator_id,
            username: username.into(),
        }
    }

    /// Identity used by maintenance commands run from the command line
    pub fn system() -> Self {
        Self::new(Uuid::nil(), "system")
    }

    pub fn is_system(&self) -> bool {
        self.operator_id.is_nil()
    }
}

impl From<&operator::Model> for OperatorIdentity {
    fn from(model: &operator::Model) -> Self {
        Self::new(model.id, model.username.clone())
    }
}
