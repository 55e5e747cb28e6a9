use anyhow::Result;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use crate::{
    tracker::{
        entities::{EntryChanges, EntryId, NewEntry, TimeEntry},
        report::UNKNOWN_TICKET,
        store::Store,
        validation::ManualDuration,
    },
    utils::time::format_hours,
};

use super::{dates::parse_moment, dates::DATE_HELP, find_ticket, Context};

/// Duration typed in as hours, minutes and seconds. Missing parts count as zero.
#[derive(Debug, Clone, clap::Args)]
pub struct DurationArgs {
    #[arg(short = 'H', long)]
    hours: Option<String>,
    #[arg(short, long)]
    minutes: Option<String>,
    #[arg(short, long)]
    seconds: Option<String>,
}

impl DurationArgs {
    fn is_given(&self) -> bool {
        self.hours.is_some() || self.minutes.is_some() || self.seconds.is_some()
    }

    fn to_hours(&self) -> Result<f64> {
        let duration = ManualDuration::parse(
            self.hours.as_deref().unwrap_or_default(),
            self.minutes.as_deref().unwrap_or_default(),
            self.seconds.as_deref().unwrap_or_default(),
        )?;
        Ok(duration.to_hours()?)
    }
}

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(help = "Id of the ticket, for example APP-12")]
    ticket: String,
    #[command(flatten)]
    duration: DurationArgs,
    #[arg(short, long)]
    note: Option<String>,
    #[arg(long, help = format!("When the work was done. Defaults to now. {DATE_HELP}"))]
    at: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum EntryCommand {
    #[command(about = "List time entries, newest first")]
    List {
        #[arg(short, long, help = "Only entries of this ticket")]
        ticket: Option<String>,
        #[arg(short, long, help = "Show at most this many entries")]
        limit: Option<usize>,
    },
    #[command(about = "Change a time entry")]
    Edit {
        id: EntryId,
        #[command(flatten)]
        duration: DurationArgs,
        #[arg(long, help = DATE_HELP)]
        at: Option<String>,
        #[arg(short, long, conflicts_with = "no_note")]
        note: Option<String>,
        #[arg(long)]
        no_note: bool,
        #[arg(short, long, conflicts_with = "no_ticket")]
        ticket: Option<String>,
        #[arg(long, help = "Keep the entry without a ticket")]
        no_ticket: bool,
    },
    #[command(about = "Remove a time entry")]
    Remove { id: EntryId },
}

pub async fn process_log_command(
    LogCommand {
        ticket,
        duration,
        note,
        at,
    }: LogCommand,
    context: &Context,
) -> Result<()> {
    let hours = duration.to_hours()?;
    let logged_at = match at {
        Some(at) => parse_moment(&at, context.date_style)?.to_utc(),
        None => Utc::now(),
    };
    let id = context
        .database
        .update(|store| {
            let ticket = find_ticket(store, &ticket)?.id;
            Ok(store.log_time(NewEntry {
                ticket: Some(ticket),
                hours,
                logged_at,
                note,
            })?)
        })
        .await?;
    println!("Logged {} as entry {id}", format_hours(hours));
    Ok(())
}

pub async fn process_entry_command(command: EntryCommand, context: &Context) -> Result<()> {
    let database = &context.database;
    match command {
        EntryCommand::List { ticket, limit } => {
            let store = database.load().await?;
            let ticket = ticket
                .map(|key| find_ticket(&store, &key).map(|t| t.id))
                .transpose()?;
            let entries = store
                .entries_newest_first()
                .into_iter()
                .filter(|e| ticket.is_none() || e.ticket == ticket)
                .take(limit.unwrap_or(usize::MAX));
            for entry in entries {
                println!("{}", entry_line(&store, entry));
            }
        }
        EntryCommand::Edit {
            id,
            duration,
            at,
            note,
            no_note,
            ticket,
            no_ticket,
        } => {
            let hours = if duration.is_given() {
                Some(duration.to_hours()?)
            } else {
                None
            };
            let logged_at = at
                .map(|at| parse_moment(&at, context.date_style))
                .transpose()?
                .map(|at| at.to_utc());
            let note = if no_note { Some(None) } else { note.map(Some) };
            database
                .update(|store| {
                    let ticket = if no_ticket {
                        Some(None)
                    } else {
                        ticket
                            .map(|key| find_ticket(store, &key).map(|t| Some(t.id)))
                            .transpose()?
                    };
                    Ok(store.update_entry(
                        id,
                        EntryChanges {
                            hours,
                            logged_at,
                            note,
                            ticket,
                        },
                    )?)
                })
                .await?;
            println!("Updated entry {id}");
        }
        EntryCommand::Remove { id } => {
            let entry = database
                .update(|store| Ok(store.remove_entry(id)?))
                .await?;
            println!("Removed entry {id} of {}", format_hours(entry.hours));
        }
    }
    Ok(())
}

fn entry_line(store: &Store, entry: &TimeEntry) -> String {
    let ticket = entry
        .ticket
        .and_then(|id| store.ticket(id))
        .map(|t| t.key.as_str())
        .unwrap_or(UNKNOWN_TICKET);
    format!(
        "{}\t{}\t{}\t{}\t{}",
        entry.id,
        entry.logged_at.with_timezone(&Local).format("%x %H:%M"),
        ticket,
        format_hours(entry.hours),
        entry.note.as_deref().unwrap_or_default()
    )
}
