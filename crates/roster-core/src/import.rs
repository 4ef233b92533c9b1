//! Bulk import of people from pasted text

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::OperatorIdentity;
use crate::error::{Conflict, RosterError, RosterResult};
use crate::person::{insert_person, NewPerson};

/// Failure messages kept per import
pub const MAX_IMPORT_MESSAGES: usize = 5;

/// Turns free-form text into candidate person records.
///
/// One record per line: `entry, serial, name[, mobile]`. Lines containing a
/// comma are split on commas, others on runs of whitespace. Lines with fewer
/// than three fields are skipped without comment.
pub struct BulkImportParser;

impl BulkImportParser {
    pub fn parse(input: &str) -> Vec<NewPerson> {
        input.trim().lines().filter_map(Self::parse_line).collect()
    }

    fn parse_line(line: &str) -> Option<NewPerson> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let parts: Vec<&str> = if line.contains(',') {
            line.split(',').map(str::trim).collect()
        } else {
            line.split_whitespace().collect()
        };

        if parts.len() < 3 {
            return None;
        }

        Some(NewPerson {
            entry_seq: Some(parts[0].to_string()).filter(|s| !s.is_empty()),
            serial_number: parts[1].to_string(),
            full_name: parts[2].to_string(),
            mobile_number: parts.get(3).map(|s| s.to_string()).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub failed: usize,
    /// At most [`MAX_IMPORT_MESSAGES`] failure messages, in input order
    pub messages: Vec<String>,
}

impl ImportReport {
    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        if self.messages.len() < MAX_IMPORT_MESSAGES {
            self.messages.push(message);
        }
    }

    pub fn summary(&self) -> String {
        format!("{} people added, {} failed", self.added, self.failed)
    }
}

#[derive(Clone)]
pub struct BulkImporter {
    db: DatabaseConnection,
}

impl BulkImporter {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Parse `text` and add every candidate, continuing past failures.
    ///
    /// The whole batch commits together; each record is inserted under its own
    /// savepoint so one bad row does not poison the rest.
    pub async fn import(&self, actor: &OperatorIdentity, text: &str) -> RosterResult<ImportReport> {
        let candidates = BulkImportParser::parse(text);
        let mut report = ImportReport::default();

        let tx = self.db.begin().await?;

        for candidate in candidates {
            let raw_serial = candidate.serial_number.trim().to_string();

            let valid = match candidate.validate() {
                Ok(valid) => valid,
                Err(e) => {
                    report.record_failure(format!("Error adding SR No {}: {}", raw_serial, e));
                    continue;
                }
            };

            let savepoint = tx.begin().await?;
            match insert_person(&savepoint, valid).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.added += 1;
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    warn!(serial_number = %raw_serial, error = %e, "Import row rejected");
                    report.record_failure(failure_message(&raw_serial, &e));
                }
            }
        }

        tx.commit().await?;

        info!(
            operator = %actor.username,
            added = report.added,
            failed = report.failed,
            "Bulk import finished"
        );
        Ok(report)
    }
}

fn failure_message(serial: &str, err: &RosterError) -> String {
    match err {
        RosterError::Conflict(Conflict::DuplicateSerial(n)) => format!("SR No {} already exists", n),
        other => format!("Error adding SR No {}: {}", serial, other),
    }
}
