//! CSV and printable renderings of a team roster
//!
//! Pure transforms over [`TeamExport`]; nothing here touches storage.

use chrono::{DateTime, Utc};
use serde::Serialize;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub serial_number: i64,
    pub full_name: String,
    pub mobile_number: String,
    pub entry_seq: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamExport {
    pub team_name: String,
    pub owner_name: String,
    /// Members in display order
    pub members: Vec<MemberRow>,
    pub generated_at: DateTime<Utc>,
}

impl TeamExport {
    /// Spreadsheet-friendly CSV, prefixed with a UTF-8 byte order mark.
    pub fn to_csv(&self) -> Vec<u8> {
        let mut out = String::new();

        push_row(
            &mut out,
            &["Team Name", "Owner", "Total Members", "Export Date"],
        );
        push_row(
            &mut out,
            &[
                &self.team_name,
                &self.owner_name,
                &self.members.len().to_string(),
                &self.generated_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        );
        out.push_str("\r\n");
        push_row(
            &mut out,
            &["#", "SR No", "Full Name", "Mobile Number", "Entry No"],
        );

        for (index, member) in self.members.iter().enumerate() {
            push_row(
                &mut out,
                &[
                    &(index + 1).to_string(),
                    &member.serial_number.to_string(),
                    &member.full_name,
                    &member.mobile_number,
                    member.entry_seq.as_deref().unwrap_or("-"),
                ],
            );
        }

        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + out.len());
        bytes.extend_from_slice(UTF8_BOM);
        bytes.extend_from_slice(out.as_bytes());
        bytes
    }

    /// `Team_A_2025-03-01.csv`
    pub fn csv_filename(&self) -> String {
        let stem: String = self
            .team_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}.csv", stem, self.generated_at.format("%Y-%m-%d"))
    }

    /// Standalone HTML page laid out for printing.
    pub fn to_printable_html(&self) -> String {
        let title = html_escape(&self.team_name);
        let owner = html_escape(&self.owner_name);
        let generated = self.generated_at.format(TIMESTAMP_FORMAT).to_string();

        let body = if self.members.is_empty() {
            r#"<p class="empty">No members in this team.</p>"#.to_string()
        } else {
            let rows: String = self
                .members
                .iter()
                .enumerate()
                .map(|(index, m)| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                        index + 1,
                        m.serial_number,
                        html_escape(&m.full_name),
                        html_escape(&m.mobile_number),
                        html_escape(m.entry_seq.as_deref().unwrap_or("-")),
                    )
                })
                .collect();

            format!(
                r#"<table class="members">
<thead><tr><th>#</th><th>SR No</th><th>Full Name</th><th>Mobile Number</th><th>Entry No</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
            )
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Members</title>
<style>
  body {{ font-family: Arial, sans-serif; margin: 24px; color: #222; }}
  h1 {{ margin-bottom: 4px; }}
  .summary td {{ padding: 2px 16px 2px 0; }}
  table.members {{ width: 100%; border-collapse: collapse; margin-top: 16px; }}
  table.members th, table.members td {{ border: 1px solid #999; padding: 6px 8px; text-align: left; }}
  table.members th {{ background: #eee; }}
  .empty {{ font-style: italic; margin-top: 16px; }}
  @media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body onload="window.print()">
<h1>{title}</h1>
<table class="summary">
<tr><td><strong>Owner</strong></td><td>{owner}</td></tr>
<tr><td><strong>Total Members</strong></td><td>{count}</td></tr>
<tr><td><strong>Export Date</strong></td><td>{generated}</td></tr>
</table>
{body}
</body>
</html>
"#,
            count = self.members.len(),
        )
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// RFC 4180 quoting
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
