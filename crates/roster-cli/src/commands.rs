//! Maintenance commands run from the terminal
//!
//! Each command acts as [`OperatorIdentity::system`] and returns the text to
//! print, leaving process exit handling to `main`.

use anyhow::{Context, Result};
use roster_core::{NewOperator, OperatorIdentity, Roster};
use std::path::Path;
use tracing::info;

/// Connect and bring the schema up to date
pub async fn open_roster(database_url: &str) -> Result<Roster> {
    let db = roster_db::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", database_url))?;
    roster_db::migrate(&db)
        .await
        .context("Failed to apply migrations")?;
    Ok(Roster::new(db))
}

/// Delete every membership, team and person. Owners and operators stay.
pub async fn clear_all_data(roster: &Roster) -> Result<String> {
    let report = roster
        .maintenance()
        .clear_all_data(&OperatorIdentity::system())
        .await?;

    Ok(format!(
        "✓ All data cleared successfully!\n  Removed {} memberships, {} teams, {} people",
        report.memberships, report.teams, report.people
    ))
}

pub async fn generate_sample(roster: &Roster, count: usize) -> Result<String> {
    let report = roster
        .samples()
        .generate(&OperatorIdentity::system(), count)
        .await?;

    let mut output = report.message();
    if report.failed > 0 {
        output.push_str(&format!("\n  {} rows failed, see the log", report.failed));
    }
    Ok(output)
}

/// Bulk import people from a text file, one record per line
pub async fn import_file(roster: &Roster, path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {:?}", path))?;

    let report = roster
        .importer()
        .import(&OperatorIdentity::system(), &text)
        .await?;

    let mut output = format!("✓ {}", report.summary());
    for message in &report.messages {
        output.push_str("\n  ");
        output.push_str(message);
    }
    Ok(output)
}

pub async fn create_operator(roster: &Roster, new: NewOperator) -> Result<String> {
    let account = roster
        .operators()
        .create(&OperatorIdentity::system(), new)
        .await?;

    info!(operator_id = %account.id, "Bootstrap operator created");
    Ok(format!(
        "✓ Operator '{}' created ({})",
        account.username, account.id
    ))
}
