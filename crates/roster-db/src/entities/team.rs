//! Team entity, created only by full-set regeneration

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Generated name ("Team A", "Team B", ...)
    pub name: String,

    /// Owner the team is organized under
    #[sea_orm(indexed)]
    pub owner_id: i32,

    /// Legacy captain key. Owner-keyed teams leave this empty.
    pub captain_serial_number: Option<i64>,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Team belongs to exactly one owner
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Owner,

    /// Optional captain; a referenced person cannot be deleted
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::CaptainSerialNumber",
        to = "super::person::Column::SerialNumber",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Captain,

    /// Team has members
    #[sea_orm(has_many = "super::team_member::Entity")]
    Members,
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
