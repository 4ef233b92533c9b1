//! TeamMember entity: the membership of one person (by serial) in one team

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub team_id: i32,

    /// Serial number of the member. Unique across the whole table, so a
    /// person can never sit on two teams.
    #[sea_orm(unique)]
    pub person_serial_number: i64,

    /// When the person joined the team
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Membership belongs to a team
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Team,

    /// Membership references a person by serial number
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::PersonSerialNumber",
        to = "super::person::Column::SerialNumber",
        on_update = "Restrict",
        on_delete = "Restrict"
    )]
    Person,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
