//! Consolidated roster schema: people, owners, teams and memberships

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create people table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(string_null(Person::EntrySeq))
                    .col(big_integer(Person::SerialNumber).not_null().unique_key())
                    .col(string(Person::FullName).not_null())
                    .col(string(Person::MobileNumber).not_null())
                    .col(
                        timestamp_with_time_zone(Person::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_people_serial_number")
                    .table(Person::Table)
                    .col(Person::SerialNumber)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create owners table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Owner::Table)
                    .if_not_exists()
                    .col(pk_auto(Owner::Id))
                    .col(string(Owner::Name).not_null().unique_key())
                    .col(
                        timestamp_with_time_zone(Owner::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create teams table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(pk_auto(Team::Id))
                    .col(string(Team::Name).not_null())
                    .col(integer(Team::OwnerId).not_null())
                    .col(big_integer_null(Team::CaptainSerialNumber))
                    .col(
                        timestamp_with_time_zone(Team::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_owner_id")
                            .from(Team::Table, Team::OwnerId)
                            .to(Owner::Table, Owner::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_captain_serial_number")
                            .from(Team::Table, Team::CaptainSerialNumber)
                            .to(Person::Table, Person::SerialNumber)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teams_owner_id")
                    .table(Team::Table)
                    .col(Team::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teams_name")
                    .table(Team::Table)
                    .col(Team::Name)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create team_members table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(pk_auto(TeamMember::Id))
                    .col(integer(TeamMember::TeamId).not_null())
                    .col(big_integer(TeamMember::PersonSerialNumber).not_null())
                    .col(
                        timestamp_with_time_zone(TeamMember::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_team_id")
                            .from(TeamMember::Table, TeamMember::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_person_serial_number")
                            .from(TeamMember::Table, TeamMember::PersonSerialNumber)
                            .to(Person::Table, Person::SerialNumber)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-team pair uniqueness
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_team_person")
                    .table(TeamMember::Table)
                    .col(TeamMember::TeamId)
                    .col(TeamMember::PersonSerialNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Cross-team exclusivity: one membership per person system-wide
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_person_serial")
                    .table(TeamMember::Table)
                    .col(TeamMember::PersonSerialNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_team_id")
                    .table(TeamMember::Table)
                    .col(TeamMember::TeamId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Owner::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Person::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum Person {
    #[sea_orm(iden = "people")]
    Table,
    Id,
    EntrySeq,
    SerialNumber,
    FullName,
    MobileNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Owner {
    #[sea_orm(iden = "owners")]
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    Name,
    OwnerId,
    CaptainSerialNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamMember {
    #[sea_orm(iden = "team_members")]
    Table,
    Id,
    TeamId,
    PersonSerialNumber,
    CreatedAt,
}
