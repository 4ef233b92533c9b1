//! Team roster engine
//!
//! Registries for people and owners, the membership guard that keeps every
//! person on at most one team, and the assignment engine that rebuilds the
//! team set from an ordered list of owners. Batch helpers (bulk import,
//! sample data, clearing) and the export renderers sit on top.
//!
//! Every mutating call takes an [`OperatorIdentity`] naming who acts.

pub mod assignment;
pub mod context;
pub mod error;
pub mod export;
pub mod import;
pub mod maintenance;
pub mod membership;
pub mod operators;
pub mod owner;
pub mod person;
pub mod sample;
pub mod teams;

use sea_orm::DatabaseConnection;

pub use assignment::{RegenerationReport, TeamAssignmentEngine, TeamCreationError, TeamSeed};
pub use context::OperatorIdentity;
pub use error::{
    AuthFailure, Conflict, ErrorKind, NotFound, RosterError, RosterResult, StateViolation,
    ValidationError,
};
pub use export::{MemberRow, TeamExport};
pub use import::{BulkImportParser, BulkImporter, ImportReport, MAX_IMPORT_MESSAGES};
pub use maintenance::{ClearReport, Maintenance};
pub use membership::MembershipGuard;
pub use operators::{NewOperator, OperatorRegistry, OperatorUpdate};
pub use owner::{OwnerRegistry, OwnerRemoval, OwnerSummary};
pub use person::{NewPerson, PersonRegistry};
pub use sample::{SampleDataGenerator, SampleReport, DEFAULT_SAMPLE_COUNT};
pub use teams::{
    team_label, team_name, team_slug, MemberView, RosterStats, TeamDetail, TeamDirectory,
    TeamRemoval, TeamSummary,
};

/// Entry point bundling every component over one shared connection
#[derive(Clone)]
pub struct Roster {
    db: DatabaseConnection,
}

impl Roster {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn people(&self) -> PersonRegistry {
        PersonRegistry::new(self.db.clone())
    }

    pub fn owners(&self) -> OwnerRegistry {
        OwnerRegistry::new(self.db.clone())
    }

    pub fn memberships(&self) -> MembershipGuard {
        MembershipGuard::new(self.db.clone())
    }

    pub fn assignment(&self) -> TeamAssignmentEngine {
        TeamAssignmentEngine::new(self.db.clone())
    }

    pub fn teams(&self) -> TeamDirectory {
        TeamDirectory::new(self.db.clone())
    }

    pub fn importer(&self) -> BulkImporter {
        BulkImporter::new(self.db.clone())
    }

    pub fn samples(&self) -> SampleDataGenerator {
        SampleDataGenerator::new(self.db.clone())
    }

    pub fn operators(&self) -> OperatorRegistry {
        OperatorRegistry::new(self.db.clone())
    }

    pub fn maintenance(&self) -> Maintenance {
        Maintenance::new(self.db.clone())
    }
}
