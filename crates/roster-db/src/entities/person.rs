//! Person entity: everyone who can be placed on a team

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "people")]
pub struct Model {
    /// Internal row id
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Free-form entry label supplied at registration (optional)
    pub entry_seq: Option<String>,

    /// Externally meaningful serial number ("SR No"), unique and immutable
    #[sea_orm(unique, indexed)]
    pub serial_number: i64,

    pub full_name: String,

    pub mobile_number: String,

    /// When the person was registered
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Memberships referencing this person's serial number
    #[sea_orm(has_many = "super::team_member::Entity")]
    Memberships,
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
