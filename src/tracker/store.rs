//! In-memory repository of every entity. Relationships are stored as ids and delete rules are
//! applied explicitly:
//!  - deleting a project deletes its tickets and iterations, and through the tickets their entries;
//!  - deleting an iteration only clears the iteration of tickets referencing it;
//!  - deleting a ticket deletes its entries.

use std::{cmp::Reverse, collections::BTreeMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{
    entities::{
        EntryChanges, EntryId, Iteration, IterationChanges, IterationId, NewEntry, NewIteration,
        NewProject, NewTicket, Project, ProjectId, Ticket, TicketChanges, TicketId, TimeEntry,
    },
    validation::{
        ensure_due_after, ensure_positive_hours, normalize_note, required, ValidationError,
    },
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl StoreError {
    fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a cascading delete removed along with the requested entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removed {
    pub tickets: usize,
    pub iterations: usize,
    pub entries: usize,
    /// Tickets that kept existing but lost their iteration.
    pub detached_tickets: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoreSnapshot", into = "StoreSnapshot")]
pub struct Store {
    projects: BTreeMap<ProjectId, Project>,
    iterations: BTreeMap<IterationId, Iteration>,
    tickets: BTreeMap<TicketId, Ticket>,
    entries: BTreeMap<EntryId, TimeEntry>,
    last_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    // Projects

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        let name = name.trim();
        self.projects.values().find(|p| p.name == name)
    }

    pub fn add_project(&mut self, new: NewProject) -> StoreResult<ProjectId> {
        let name = required("project name", &new.name)?;
        self.ensure_project_name_free(&name, None)?;

        let id = ProjectId(self.next_id());
        info!("Adding project {id} {name:?}");
        self.projects.insert(
            id,
            Project {
                id,
                name,
                detail: new.detail.trim().to_string(),
            },
        );
        Ok(id)
    }

    pub fn rename_project(&mut self, id: ProjectId, name: &str) -> StoreResult<()> {
        let name = required("project name", name)?;
        self.ensure_project_name_free(&name, Some(id))?;
        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("project", id))?;
        info!("Renaming project {id} from {:?} to {name:?}", project.name);
        project.name = name;
        Ok(())
    }

    pub fn set_project_detail(&mut self, id: ProjectId, detail: &str) -> StoreResult<()> {
        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("project", id))?;
        project.detail = detail.trim().to_string();
        Ok(())
    }

    pub fn remove_project(&mut self, id: ProjectId) -> StoreResult<Removed> {
        let project = self
            .projects
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("project", id))?;

        let mut removed = Removed::default();

        let tickets = self.tickets_of_project(id).map(|t| t.id).collect::<Vec<_>>();
        for ticket in tickets {
            let by_ticket = self.remove_ticket(ticket)?;
            removed.tickets += 1;
            removed.entries += by_ticket.entries;
        }

        let iterations = self
            .iterations_of_project(id)
            .map(|i| i.id)
            .collect::<Vec<_>>();
        for iteration in iterations {
            let by_iteration = self.remove_iteration(iteration)?;
            removed.iterations += 1;
            removed.detached_tickets += by_iteration.detached_tickets;
        }

        info!("Removed project {id} {:?} with {removed:?}", project.name);
        Ok(removed)
    }

    fn ensure_project_name_free(&self, name: &str, own: Option<ProjectId>) -> StoreResult<()> {
        match self.project_by_name(name) {
            Some(existing) if Some(existing.id) != own => {
                Err(ValidationError::DuplicateProject(name.to_string()).into())
            }
            _ => Ok(()),
        }
    }

    fn ensure_project_exists(&self, id: Option<ProjectId>) -> StoreResult<()> {
        match id {
            Some(id) if !self.projects.contains_key(&id) => Err(StoreError::not_found("project", id)),
            _ => Ok(()),
        }
    }

    // Iterations

    pub fn iterations(&self) -> impl Iterator<Item = &Iteration> {
        self.iterations.values()
    }

    pub fn iteration(&self, id: IterationId) -> Option<&Iteration> {
        self.iterations.get(&id)
    }

    pub fn iterations_of_project(&self, project: ProjectId) -> impl Iterator<Item = &Iteration> {
        self.iterations
            .values()
            .filter(move |i| i.project == Some(project))
    }

    pub fn add_iteration(&mut self, new: NewIteration) -> StoreResult<IterationId> {
        let name = required("iteration name", &new.name)?;
        ensure_due_after(new.start_date, new.due_date)?;
        self.ensure_project_exists(new.project)?;

        let id = IterationId(self.next_id());
        info!("Adding {} {id} {name:?}", new.kind);
        self.iterations.insert(
            id,
            Iteration {
                id,
                name,
                kind: new.kind,
                start_date: new.start_date,
                due_date: new.due_date,
                project: new.project,
            },
        );
        Ok(id)
    }

    pub fn update_iteration(&mut self, id: IterationId, changes: IterationChanges) -> StoreResult<()> {
        let current = self
            .iterations
            .get(&id)
            .ok_or_else(|| StoreError::not_found("iteration", id))?;

        let name = match &changes.name {
            Some(name) => required("iteration name", name)?,
            None => current.name.clone(),
        };
        let start_date = changes.start_date.unwrap_or(current.start_date);
        let due_date = changes.due_date.unwrap_or(current.due_date);
        ensure_due_after(start_date, due_date)?;
        let project = changes.project.unwrap_or(current.project);
        self.ensure_project_exists(project)?;
        let kind = changes.kind.unwrap_or(current.kind);

        self.iterations.insert(
            id,
            Iteration {
                id,
                name,
                kind,
                start_date,
                due_date,
                project,
            },
        );
        Ok(())
    }

    pub fn remove_iteration(&mut self, id: IterationId) -> StoreResult<Removed> {
        let iteration = self
            .iterations
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("iteration", id))?;

        let mut removed = Removed::default();
        for ticket in self.tickets.values_mut() {
            if ticket.iteration == Some(id) {
                ticket.iteration = None;
                removed.detached_tickets += 1;
            }
        }
        debug!("Removed iteration {id} {:?}, detached {} tickets", iteration.name, removed.detached_tickets);
        Ok(removed)
    }

    fn ensure_iteration_exists(&self, id: Option<IterationId>) -> StoreResult<()> {
        match id {
            Some(id) if !self.iterations.contains_key(&id) => {
                Err(StoreError::not_found("iteration", id))
            }
            _ => Ok(()),
        }
    }

    // Tickets

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values()
    }

    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&id)
    }

    pub fn ticket_by_key(&self, key: &str) -> Option<&Ticket> {
        let key = key.trim();
        self.tickets.values().find(|t| t.key == key)
    }

    pub fn tickets_of_project(&self, project: ProjectId) -> impl Iterator<Item = &Ticket> {
        self.tickets
            .values()
            .filter(move |t| t.project == Some(project))
    }

    pub fn tickets_of_iteration(&self, iteration: IterationId) -> impl Iterator<Item = &Ticket> {
        self.tickets
            .values()
            .filter(move |t| t.iteration == Some(iteration))
    }

    pub fn add_ticket(&mut self, new: NewTicket) -> StoreResult<TicketId> {
        let key = required("ticket id", &new.key)?;
        let name = required("ticket name", &new.name)?;
        self.ensure_ticket_key_free(&key, None)?;
        if let Some(due) = new.due_date {
            ensure_due_after(new.start_date, due)?;
        }
        self.ensure_project_exists(new.project)?;
        self.ensure_iteration_exists(new.iteration)?;

        let id = TicketId(self.next_id());
        info!("Adding ticket {key} {name:?}");
        self.tickets.insert(
            id,
            Ticket {
                id,
                key,
                name,
                detail: new.detail.trim().to_string(),
                start_date: new.start_date,
                due_date: new.due_date,
                project: new.project,
                iteration: new.iteration,
            },
        );
        Ok(id)
    }

    pub fn update_ticket(&mut self, id: TicketId, changes: TicketChanges) -> StoreResult<()> {
        let current = self
            .tickets
            .get(&id)
            .ok_or_else(|| StoreError::not_found("ticket", id))?;

        let key = match &changes.key {
            Some(key) => required("ticket id", key)?,
            None => current.key.clone(),
        };
        let name = match &changes.name {
            Some(name) => required("ticket name", name)?,
            None => current.name.clone(),
        };
        let detail = changes
            .detail
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| current.detail.clone());
        let start_date = changes.start_date.unwrap_or(current.start_date);
        let due_date = changes.due_date.unwrap_or(current.due_date);
        let project = changes.project.unwrap_or(current.project);
        let iteration = changes.iteration.unwrap_or(current.iteration);

        self.ensure_ticket_key_free(&key, Some(id))?;
        if let Some(due) = due_date {
            ensure_due_after(start_date, due)?;
        }
        self.ensure_project_exists(project)?;
        self.ensure_iteration_exists(iteration)?;

        self.tickets.insert(
            id,
            Ticket {
                id,
                key,
                name,
                detail,
                start_date,
                due_date,
                project,
                iteration,
            },
        );
        Ok(())
    }

    pub fn remove_ticket(&mut self, id: TicketId) -> StoreResult<Removed> {
        let ticket = self
            .tickets
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("ticket", id))?;

        let before = self.entries.len();
        self.entries.retain(|_, e| e.ticket != Some(id));
        let removed = Removed {
            entries: before - self.entries.len(),
            ..Removed::default()
        };
        debug!("Removed ticket {} with {} entries", ticket.key, removed.entries);
        Ok(removed)
    }

    fn ensure_ticket_key_free(&self, key: &str, own: Option<TicketId>) -> StoreResult<()> {
        match self.ticket_by_key(key) {
            Some(existing) if Some(existing.id) != own => {
                Err(ValidationError::DuplicateTicket(key.to_string()).into())
            }
            _ => Ok(()),
        }
    }

    fn ensure_ticket_exists(&self, id: Option<TicketId>) -> StoreResult<()> {
        match id {
            Some(id) if !self.tickets.contains_key(&id) => Err(StoreError::not_found("ticket", id)),
            _ => Ok(()),
        }
    }

    // Time entries

    pub fn entries(&self) -> impl Iterator<Item = &TimeEntry> {
        self.entries.values()
    }

    pub fn entry(&self, id: EntryId) -> Option<&TimeEntry> {
        self.entries.get(&id)
    }

    /// Entries ordered by `logged_at`, newest first. Entries logged at the same moment are
    /// ordered newest created first.
    pub fn entries_newest_first(&self) -> Vec<&TimeEntry> {
        let mut entries = self.entries.values().collect::<Vec<_>>();
        entries.sort_by_key(|e| Reverse((e.logged_at, e.id)));
        entries
    }

    pub fn entries_of_ticket(&self, ticket: TicketId) -> impl Iterator<Item = &TimeEntry> {
        self.entries
            .values()
            .filter(move |e| e.ticket == Some(ticket))
    }

    pub fn ticket_hours(&self, ticket: TicketId) -> f64 {
        self.entries_of_ticket(ticket).map(|e| e.hours).sum()
    }

    /// The only way time gets recorded, both for manual logging and for a stopped timer.
    pub fn log_time(&mut self, new: NewEntry) -> StoreResult<EntryId> {
        let hours = ensure_positive_hours(new.hours)?;
        self.ensure_ticket_exists(new.ticket)?;

        let id = EntryId(self.next_id());
        debug!("Logging {hours}h as entry {id} for ticket {:?}", new.ticket);
        self.entries.insert(
            id,
            TimeEntry {
                id,
                hours,
                logged_at: new.logged_at,
                note: normalize_note(new.note),
                ticket: new.ticket,
            },
        );
        Ok(id)
    }

    pub fn update_entry(&mut self, id: EntryId, changes: EntryChanges) -> StoreResult<()> {
        let current = self
            .entries
            .get(&id)
            .ok_or_else(|| StoreError::not_found("entry", id))?;

        let hours = match changes.hours {
            Some(hours) => ensure_positive_hours(hours)?,
            None => current.hours,
        };
        let ticket = changes.ticket.unwrap_or(current.ticket);
        self.ensure_ticket_exists(ticket)?;
        let note = match changes.note {
            Some(note) => normalize_note(note),
            None => current.note.clone(),
        };
        let logged_at = changes.logged_at.unwrap_or(current.logged_at);

        self.entries.insert(
            id,
            TimeEntry {
                id,
                hours,
                logged_at,
                note,
                ticket,
            },
        );
        Ok(())
    }

    pub fn remove_entry(&mut self, id: EntryId) -> StoreResult<TimeEntry> {
        self.entries
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("entry", id))
    }
}

/// On-disk shape of the [Store].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    iterations: Vec<Iteration>,
    #[serde(default)]
    tickets: Vec<Ticket>,
    #[serde(default)]
    entries: Vec<TimeEntry>,
}

impl From<Store> for StoreSnapshot {
    fn from(store: Store) -> Self {
        StoreSnapshot {
            last_id: store.last_id,
            projects: store.projects.into_values().collect(),
            iterations: store.iterations.into_values().collect(),
            tickets: store.tickets.into_values().collect(),
            entries: store.entries.into_values().collect(),
        }
    }
}

impl From<StoreSnapshot> for Store {
    fn from(snapshot: StoreSnapshot) -> Self {
        let highest = snapshot
            .projects
            .iter()
            .map(|v| v.id.0)
            .chain(snapshot.iterations.iter().map(|v| v.id.0))
            .chain(snapshot.tickets.iter().map(|v| v.id.0))
            .chain(snapshot.entries.iter().map(|v| v.id.0))
            .max()
            .unwrap_or(0);

        Store {
            projects: snapshot.projects.into_iter().map(|v| (v.id, v)).collect(),
            iterations: snapshot.iterations.into_iter().map(|v| (v.id, v)).collect(),
            tickets: snapshot.tickets.into_iter().map(|v| (v.id, v)).collect(),
            entries: snapshot.entries.into_iter().map(|v| (v.id, v)).collect(),
            last_id: snapshot.last_id.max(highest),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use crate::tracker::{
        entities::{
            EntryChanges, IterationChanges, IterationId, IterationKind, NewEntry, NewIteration,
            NewProject, NewTicket, ProjectId, TicketChanges, TicketId,
        },
        validation::ValidationError,
    };

    use super::{Store, StoreError};

    pub const TEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 3, 10) {
        Some(date) => date,
        None => panic!("invalid test date"),
    };

    pub fn test_moment(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    pub fn project(store: &mut Store, name: &str) -> ProjectId {
        store
            .add_project(NewProject {
                name: name.into(),
                detail: String::new(),
            })
            .unwrap()
    }

    pub fn ticket(store: &mut Store, key: &str, project: Option<ProjectId>) -> TicketId {
        store
            .add_ticket(NewTicket {
                key: key.into(),
                name: format!("{key} name"),
                detail: String::new(),
                start_date: TEST_DATE,
                due_date: None,
                project,
                iteration: None,
            })
            .unwrap()
    }

    pub fn sprint(store: &mut Store, name: &str, project: Option<ProjectId>) -> IterationId {
        store
            .add_iteration(NewIteration {
                name: name.into(),
                kind: IterationKind::Sprint,
                start_date: TEST_DATE,
                due_date: TEST_DATE + chrono::Duration::days(14),
                project,
            })
            .unwrap()
    }

    pub fn log(store: &mut Store, ticket: Option<TicketId>, hours: f64, hour: u32) {
        store
            .log_time(NewEntry {
                ticket,
                hours,
                logged_at: test_moment(hour),
                note: None,
            })
            .unwrap();
    }

    #[test]
    fn test_remove_project_cascades_to_entries() {
        let mut store = Store::new();
        let kept = project(&mut store, "Kept");
        let doomed = project(&mut store, "Doomed");
        let iteration = sprint(&mut store, "Sprint 1", Some(doomed));
        let a = ticket(&mut store, "D-1", Some(doomed));
        let b = ticket(&mut store, "D-2", Some(doomed));
        let c = ticket(&mut store, "K-1", Some(kept));
        store
            .update_ticket(a, TicketChanges { iteration: Some(Some(iteration)), ..Default::default() })
            .unwrap();
        log(&mut store, Some(a), 1., 9);
        log(&mut store, Some(a), 2., 10);
        log(&mut store, Some(b), 1., 11);
        log(&mut store, Some(c), 3., 12);

        let removed = store.remove_project(doomed).unwrap();

        assert_eq!(removed.tickets, 2);
        assert_eq!(removed.iterations, 1);
        assert_eq!(removed.entries, 3);
        assert!(store.project(doomed).is_none());
        assert!(store.iteration(iteration).is_none());
        assert!(store.ticket(a).is_none());
        assert!(store.ticket(b).is_none());
        assert_eq!(store.entries().count(), 1);
        assert_eq!(store.ticket_hours(c), 3.);
        assert!(store.project(kept).is_some());
    }

    #[test]
    fn test_remove_iteration_detaches_tickets() {
        let mut store = Store::new();
        let p = project(&mut store, "P");
        let iteration = sprint(&mut store, "Sprint 1", Some(p));
        let t = ticket(&mut store, "P-1", Some(p));
        store
            .update_ticket(t, TicketChanges { iteration: Some(Some(iteration)), ..Default::default() })
            .unwrap();
        log(&mut store, Some(t), 1., 9);

        let removed = store.remove_iteration(iteration).unwrap();

        assert_eq!(removed.detached_tickets, 1);
        let ticket = store.ticket(t).unwrap();
        assert_eq!(ticket.iteration, None);
        assert_eq!(ticket.project, Some(p));
        assert_eq!(store.entries().count(), 1);
    }

    #[test]
    fn test_remove_project_detaches_tickets_of_other_projects() {
        let mut store = Store::new();
        let a = project(&mut store, "A");
        let b = project(&mut store, "B");
        let iteration_of_a = sprint(&mut store, "A sprint", Some(a));
        let foreign = ticket(&mut store, "B-1", Some(b));
        store
            .update_ticket(
                foreign,
                TicketChanges { iteration: Some(Some(iteration_of_a)), ..Default::default() },
            )
            .unwrap();

        let removed = store.remove_project(a).unwrap();

        assert_eq!(removed.detached_tickets, 1);
        assert_eq!(store.ticket(foreign).unwrap().iteration, None);
    }

    #[test]
    fn test_remove_ticket_cascades_entries_only() {
        let mut store = Store::new();
        let p = project(&mut store, "P");
        let t = ticket(&mut store, "P-1", Some(p));
        let other = ticket(&mut store, "P-2", Some(p));
        log(&mut store, Some(t), 1., 9);
        log(&mut store, Some(t), 1., 10);
        log(&mut store, Some(other), 1., 11);
        log(&mut store, None, 1., 12);

        let removed = store.remove_ticket(t).unwrap();

        assert_eq!(removed.entries, 2);
        assert!(store.project(p).is_some());
        assert_eq!(store.entries().count(), 2);
    }

    #[test]
    fn test_project_names_unique() {
        let mut store = Store::new();
        let first = project(&mut store, "Alpha");
        let second = project(&mut store, "Beta");

        let duplicate = store.add_project(NewProject {
            name: " Alpha ".into(),
            detail: String::new(),
        });
        assert!(matches!(
            duplicate,
            Err(StoreError::Validation(ValidationError::DuplicateProject(_)))
        ));

        assert!(store.rename_project(second, "Alpha").is_err());
        assert_eq!(store.project(second).unwrap().name, "Beta");

        store.rename_project(first, "Alpha").unwrap();
        store.rename_project(first, "Gamma").unwrap();
        assert!(store.project_by_name("Gamma").is_some());
    }

    #[test]
    fn test_empty_project_name_rejected() {
        let mut store = Store::new();
        let result = store.add_project(NewProject::default());
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::Empty { .. }))
        ));
        assert_eq!(store.projects().count(), 0);
    }

    #[test]
    fn test_ticket_keys_unique() {
        let mut store = Store::new();
        let first = ticket(&mut store, "A-1", None);
        let second = ticket(&mut store, "A-2", None);

        let result = store.add_ticket(NewTicket {
            key: "A-1".into(),
            name: "again".into(),
            detail: String::new(),
            start_date: TEST_DATE,
            due_date: None,
            project: None,
            iteration: None,
        });
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::DuplicateTicket(_)))
        ));

        let result = store.update_ticket(
            second,
            TicketChanges { key: Some("A-1".into()), ..Default::default() },
        );
        assert!(result.is_err());

        store
            .update_ticket(first, TicketChanges { key: Some("A-9".into()), ..Default::default() })
            .unwrap();
        assert_eq!(store.ticket_by_key("A-9").unwrap().id, first);
    }

    #[test]
    fn test_iteration_dates_validated() {
        let mut store = Store::new();
        let result = store.add_iteration(NewIteration {
            name: "Release".into(),
            kind: IterationKind::Milestone,
            start_date: TEST_DATE,
            due_date: TEST_DATE,
            project: None,
        });
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::DueNotAfterStart { .. }))
        ));

        let id = sprint(&mut store, "Sprint", None);
        let result = store.update_iteration(
            id,
            IterationChanges {
                due_date: Some(TEST_DATE - chrono::Duration::days(1)),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(
            store.iteration(id).unwrap().due_date,
            TEST_DATE + chrono::Duration::days(14)
        );
    }

    #[test]
    fn test_cross_project_iteration_permitted() {
        let mut store = Store::new();
        let a = project(&mut store, "A");
        let b = project(&mut store, "B");
        let iteration = sprint(&mut store, "A sprint", Some(a));
        let t = ticket(&mut store, "B-1", Some(b));

        store
            .update_ticket(t, TicketChanges { iteration: Some(Some(iteration)), ..Default::default() })
            .unwrap();

        assert_eq!(store.ticket(t).unwrap().iteration, Some(iteration));
    }

    #[test]
    fn test_log_time_rules() {
        let mut store = Store::new();
        let t = ticket(&mut store, "A-1", None);

        let zero = store.log_time(NewEntry {
            ticket: Some(t),
            hours: 0.,
            logged_at: test_moment(9),
            note: None,
        });
        assert!(matches!(
            zero,
            Err(StoreError::Validation(ValidationError::NonPositiveDuration))
        ));

        let missing = store.log_time(NewEntry {
            ticket: Some(TicketId(999)),
            hours: 1.,
            logged_at: test_moment(9),
            note: None,
        });
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));

        let id = store
            .log_time(NewEntry {
                ticket: Some(t),
                hours: 0.5,
                logged_at: test_moment(9),
                note: Some("".into()),
            })
            .unwrap();
        assert_eq!(store.entry(id).unwrap().note, None);
        assert_eq!(store.entries().count(), 1);
    }

    #[test]
    fn test_update_entry() {
        let mut store = Store::new();
        let t = ticket(&mut store, "A-1", None);
        log(&mut store, Some(t), 1., 9);
        let id = store.entries().next().unwrap().id;

        assert!(store
            .update_entry(id, EntryChanges { hours: Some(0.), ..Default::default() })
            .is_err());

        store
            .update_entry(
                id,
                EntryChanges {
                    hours: Some(2.25),
                    note: Some(Some("review".into())),
                    logged_at: Some(test_moment(15)),
                    ..Default::default()
                },
            )
            .unwrap();

        let entry = store.entry(id).unwrap();
        assert_eq!(entry.hours, 2.25);
        assert_eq!(entry.note.as_deref(), Some("review"));
        assert_eq!(entry.logged_at, test_moment(15));
        assert_eq!(entry.ticket, Some(t));
    }

    #[test]
    fn test_entries_newest_first() {
        let mut store = Store::new();
        log(&mut store, None, 1., 9);
        log(&mut store, None, 2., 14);
        log(&mut store, None, 3., 11);

        let hours = store
            .entries_newest_first()
            .iter()
            .map(|e| e.hours)
            .collect::<Vec<_>>();
        assert_eq!(hours, vec![2., 3., 1.]);
    }

    #[test]
    fn test_entries_logged_at_same_moment_newest_created_first() {
        let mut store = Store::new();
        log(&mut store, None, 1., 9);
        log(&mut store, None, 2., 9);
        log(&mut store, None, 3., 8);

        let hours = store
            .entries_newest_first()
            .iter()
            .map(|e| e.hours)
            .collect::<Vec<_>>();
        assert_eq!(hours, vec![2., 1., 3.]);
    }

    #[test]
    fn test_snapshot_keeps_ids_growing() {
        let mut store = Store::new();
        let p = project(&mut store, "P");
        ticket(&mut store, "P-1", Some(p));

        let json = serde_json::to_string(&store).unwrap();
        let mut restored: Store = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.project_by_name("P").unwrap().id, p);
        let next = project(&mut restored, "Q");
        assert!(next.0 > 2);
    }

    #[test]
    fn test_snapshot_without_counter() {
        let json = r#"{"projects":[{"id":7,"name":"Legacy"}]}"#;
        let mut store: Store = serde_json::from_str(json).unwrap();
        let next = project(&mut store, "New");
        assert_eq!(next, ProjectId(8));
    }
}
