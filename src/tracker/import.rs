//! Bulk ticket import. Every line describes one ticket as `TICKET-ID | Title | Description`, the
//! description being optional.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{
    entities::{IterationId, NewTicket, ProjectId, TicketId},
    store::{Store, StoreError, StoreResult},
    validation::ValidationError,
};

const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLine {
    pub key: String,
    pub name: String,
    pub detail: String,
}

/// Parses the import text. Blank lines, lines with less than two fields and lines with an empty
/// id or title are skipped.
pub fn parse_ticket_lines(text: &str) -> Vec<TicketLine> {
    text.lines()
        .enumerate()
        .filter_map(|(number, line)| {
            let parsed = parse_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                debug!("Skipping import line {}: {line:?}", number + 1);
            }
            parsed
        })
        .collect()
}

fn parse_line(line: &str) -> Option<TicketLine> {
    let mut fields = line.splitn(3, FIELD_SEPARATOR).map(str::trim);
    let key = fields.next().filter(|v| !v.is_empty())?;
    let name = fields.next().filter(|v| !v.is_empty())?;
    let detail = fields.next().unwrap_or_default();
    Some(TicketLine {
        key: key.to_string(),
        name: name.to_string(),
        detail: detail.to_string(),
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: Vec<TicketId>,
    /// Ticket ids that were already taken.
    pub duplicates: Vec<String>,
}

/// Creates one ticket per line. All of them share `project`, `iteration` and `start_date`.
pub fn import_tickets(
    store: &mut Store,
    lines: Vec<TicketLine>,
    project: Option<ProjectId>,
    iteration: Option<IterationId>,
    start_date: NaiveDate,
) -> StoreResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    for TicketLine { key, name, detail } in lines {
        let result = store.add_ticket(NewTicket {
            key: key.clone(),
            name,
            detail,
            start_date,
            due_date: None,
            project,
            iteration,
        });
        match result {
            Ok(id) => summary.created.push(id),
            Err(StoreError::Validation(ValidationError::DuplicateTicket(_))) => {
                warn!("Ticket {key} already exists, skipping");
                summary.duplicates.push(key);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}
