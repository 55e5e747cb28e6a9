use std::{fmt::Display, num::ParseIntError, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().trim_start_matches('#').parse().map($name)
            }
        }
    };
}

entity_id!(
    /// Generated identity of a [Project].
    ProjectId
);
entity_id!(
    /// Generated identity of an [Iteration].
    IterationId
);
entity_id!(
    /// Generated identity of a [Ticket]. Users refer to tickets by [Ticket::key] instead.
    TicketId
);
entity_id!(
    /// Generated identity of a [TimeEntry].
    EntryId
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum IterationKind {
    Sprint,
    Milestone,
}

impl Display for IterationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IterationKind::Sprint => write!(f, "sprint"),
            IterationKind::Milestone => write!(f, "milestone"),
        }
    }
}

/// A sprint or a milestone. The due date is always strictly after the start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub id: IterationId,
    pub name: String,
    pub kind: IterationKind,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub project: Option<ProjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// User supplied identifier such as `APP-12`. Unique across the store.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub detail: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub project: Option<ProjectId>,
    /// Not required to belong to [Ticket::project].
    #[serde(default)]
    pub iteration: Option<IterationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    /// Fractional hours, 1.5 is 90 minutes.
    pub hours: f64,
    pub logged_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub ticket: Option<TicketId>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct NewIteration {
    pub name: String,
    pub kind: IterationKind,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub project: Option<ProjectId>,
}

/// Changes applied to an existing [Iteration]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct IterationChanges {
    pub name: Option<String>,
    pub kind: Option<IterationKind>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub project: Option<Option<ProjectId>>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub key: String,
    pub name: String,
    pub detail: String,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub project: Option<ProjectId>,
    pub iteration: Option<IterationId>,
}

/// Changes applied to an existing [Ticket]. `None` leaves a field as is, `Some(None)` clears an
/// optional field.
#[derive(Debug, Clone, Default)]
pub struct TicketChanges {
    pub key: Option<String>,
    pub name: Option<String>,
    pub detail: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub project: Option<Option<ProjectId>>,
    pub iteration: Option<Option<IterationId>>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub ticket: Option<TicketId>,
    pub hours: f64,
    pub logged_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub hours: Option<f64>,
    pub logged_at: Option<DateTime<Utc>>,
    pub note: Option<Option<String>>,
    pub ticket: Option<Option<TicketId>>,
}
