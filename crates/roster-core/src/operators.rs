//! Portal operator accounts

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use roster_auth::{hash_password, validate_password_strength, verify_password};
use roster_db::entities::{operator, Operator};

use crate::context::OperatorIdentity;
use crate::error::{
    is_unique_violation, AuthFailure, Conflict, NotFound, RosterResult, StateViolation,
    ValidationError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewOperator {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorUpdate {
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub is_active: bool,
    /// Replaces the password only when present and non-empty
    pub new_password: Option<String>,
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct OperatorRegistry {
    db: DatabaseConnection,
}

impl OperatorRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        actor: &OperatorIdentity,
        new: NewOperator,
    ) -> RosterResult<operator::Model> {
        let username = required(&new.username, "Username")?;
        if new.password.is_empty() {
            return Err(ValidationError::MissingField("Password").into());
        }
        let full_name = required(&new.full_name, "Full Name")?;
        validate_password_strength(&new.password)?;

        if self.username_taken(&username, None).await? {
            return Err(Conflict::DuplicateUsername(username).into());
        }

        let model = operator::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.clone()),
            password_hash: Set(hash_password(&new.password)?),
            full_name: Set(full_name),
            email: Set(optional(new.email)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            last_login_at: Set(None),
        };

        let stored = match model.insert(&self.db).await {
            Ok(stored) => stored,
            Err(e) if is_unique_violation(&e) => {
                return Err(Conflict::DuplicateUsername(username).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(operator = %actor.username, created = %stored.username, "Operator created");
        Ok(stored)
    }

    pub async fn update(
        &self,
        actor: &OperatorIdentity,
        id: Uuid,
        update: OperatorUpdate,
    ) -> RosterResult<operator::Model> {
        let username = required(&update.username, "Username")?;
        let full_name = required(&update.full_name, "Full Name")?;

        let existing = Operator::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Operator(id))?;

        if self.username_taken(&username, Some(id)).await? {
            return Err(Conflict::DuplicateUsername(username).into());
        }

        let mut active: operator::ActiveModel = existing.into();
        active.username = Set(username.clone());
        active.full_name = Set(full_name);
        active.email = Set(optional(update.email));
        active.is_active = Set(update.is_active);

        if let Some(password) = update.new_password.filter(|p| !p.is_empty()) {
            validate_password_strength(&password)?;
            active.password_hash = Set(hash_password(&password)?);
        }

        let stored = match active.update(&self.db).await {
            Ok(stored) => stored,
            Err(e) if is_unique_violation(&e) => {
                return Err(Conflict::DuplicateUsername(username).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(operator = %actor.username, updated = %stored.username, "Operator updated");
        Ok(stored)
    }

    /// Delete an account other than the caller's, never the last one.
    pub async fn remove(&self, actor: &OperatorIdentity, id: Uuid) -> RosterResult<()> {
        if id == actor.operator_id {
            return Err(StateViolation::SelfDeletion.into());
        }

        let tx = self.db.begin().await?;

        let target = Operator::find_by_id(id)
            .one(&tx)
            .await?
            .ok_or(NotFound::Operator(id))?;

        if Operator::find().count(&tx).await? <= 1 {
            return Err(StateViolation::LastOperator.into());
        }

        Operator::delete_by_id(id).exec(&tx).await?;
        tx.commit().await?;

        info!(operator = %actor.username, deleted = %target.username, "Operator deleted");
        Ok(())
    }

    /// Check credentials of an active account and stamp its last login.
    ///
    /// Unknown user, inactive account and wrong password are indistinguishable
    /// to the caller.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> RosterResult<operator::Model> {
        let account = Operator::find()
            .filter(operator::Column::Username.eq(username.trim()))
            .filter(operator::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;

        let Some(account) = account else {
            warn!(username, "Login failed: unknown or inactive account");
            return Err(AuthFailure::InvalidCredentials.into());
        };

        match verify_password(password, &account.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                warn!(username, "Login failed: wrong password");
                return Err(AuthFailure::InvalidCredentials.into());
            }
            Err(e) => {
                warn!(username, error = %e, "Login failed: unreadable password hash");
                return Err(AuthFailure::InvalidCredentials.into());
            }
        }

        let mut active: operator::ActiveModel = account.into();
        active.last_login_at = Set(Some(Utc::now()));
        let account = active.update(&self.db).await?;

        info!(username = %account.username, "Operator logged in");
        Ok(account)
    }

    /// Newest accounts first
    pub async fn list(&self) -> RosterResult<Vec<operator::Model>> {
        Ok(Operator::find()
            .order_by_desc(operator::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> RosterResult<operator::Model> {
        Ok(Operator::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(NotFound::Operator(id))?)
    }

    pub async fn count(&self) -> RosterResult<u64> {
        Ok(Operator::find().count(&self.db).await?)
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> RosterResult<bool> {
        let mut query = Operator::find().filter(operator::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(operator::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}
