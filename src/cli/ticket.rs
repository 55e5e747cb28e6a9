use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Subcommand;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::{
    tracker::{
        entities::{IterationId, NewTicket, Ticket, TicketChanges},
        import::{import_tickets, parse_ticket_lines},
        store::Store,
    },
    utils::time::format_hours,
};

use super::{
    dates::{parse_optional_day, today, DATE_HELP},
    find_iteration, find_optional_project, find_ticket, project_name, Context,
};

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    #[command(about = "Create a ticket")]
    Add {
        #[arg(help = "Unique ticket id, for example APP-12")]
        key: String,
        name: String,
        #[arg(short, long, default_value = "")]
        detail: String,
        #[arg(long, help = format!("Defaults to today. {DATE_HELP}"))]
        start: Option<String>,
        #[arg(long, help = DATE_HELP)]
        due: Option<String>,
        #[arg(short, long, help = "Name of the owning project")]
        project: Option<String>,
        #[arg(short, long, help = "Id of the iteration")]
        iteration: Option<IterationId>,
    },
    #[command(about = "List tickets with their logged time")]
    List {
        #[arg(short, long)]
        project: Option<String>,
        #[arg(short, long)]
        iteration: Option<IterationId>,
    },
    #[command(about = "Show a ticket and the time logged on it")]
    Show { key: String },
    #[command(about = "Change a ticket")]
    Edit {
        key: String,
        #[arg(long, help = "New ticket id")]
        new_key: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        detail: Option<String>,
        #[arg(long, help = DATE_HELP)]
        start: Option<String>,
        #[arg(long, help = DATE_HELP, conflicts_with = "no_due")]
        due: Option<String>,
        #[arg(long, help = "Clear the due date")]
        no_due: bool,
        #[arg(short, long, conflicts_with = "no_project")]
        project: Option<String>,
        #[arg(long, help = "Detach the ticket from its project")]
        no_project: bool,
        #[arg(short, long, conflicts_with = "no_iteration")]
        iteration: Option<IterationId>,
        #[arg(long, help = "Detach the ticket from its iteration")]
        no_iteration: bool,
    },
    #[command(about = "Remove a ticket and the time logged on it")]
    Remove { key: String },
    #[command(
        about = "Create tickets from lines of `ID | Title | Description`. The description is optional"
    )]
    Import {
        #[arg(help = "File to read, - for stdin")]
        file: PathBuf,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(short, long)]
        iteration: Option<IterationId>,
    },
}

pub async fn process_ticket_command(command: TicketCommand, context: &Context) -> Result<()> {
    let database = &context.database;
    let style = context.date_style;
    match command {
        TicketCommand::Add {
            key,
            name,
            detail,
            start,
            due,
            project,
            iteration,
        } => {
            let start_date = parse_optional_day(start.as_deref(), style)?.unwrap_or_else(today);
            let due_date = parse_optional_day(due.as_deref(), style)?;
            let key = database
                .update(|store| {
                    let project = find_optional_project(store, project.as_deref())?.map(|p| p.id);
                    let id = store.add_ticket(NewTicket {
                        key,
                        name,
                        detail,
                        start_date,
                        due_date,
                        project,
                        iteration,
                    })?;
                    Ok(store.ticket(id).map(|t| t.key.clone()).unwrap_or_default())
                })
                .await?;
            println!("Created ticket {key}");
        }
        TicketCommand::List { project, iteration } => {
            let store = database.load().await?;
            let project = find_optional_project(&store, project.as_deref())?.map(|p| p.id);
            if let Some(iteration) = iteration {
                find_iteration(&store, iteration)?;
            }
            let tickets = store.tickets().filter(|ticket| {
                (project.is_none() || ticket.project == project)
                    && (iteration.is_none() || ticket.iteration == iteration)
            });
            for ticket in tickets {
                println!("{}", ticket_line(&store, ticket));
            }
        }
        TicketCommand::Show { key } => {
            let store = database.load().await?;
            let ticket = find_ticket(&store, &key)?;
            print!("{}", describe_ticket(&store, ticket));
        }
        TicketCommand::Edit {
            key,
            new_key,
            name,
            detail,
            start,
            due,
            no_due,
            project,
            no_project,
            iteration,
            no_iteration,
        } => {
            let start_date = parse_optional_day(start.as_deref(), style)?;
            let due_date = if no_due {
                Some(None)
            } else {
                parse_optional_day(due.as_deref(), style)?.map(Some)
            };
            let iteration = if no_iteration {
                Some(None)
            } else {
                iteration.map(Some)
            };
            database
                .update(|store| {
                    let id = find_ticket(store, &key)?.id;
                    let project = if no_project {
                        Some(None)
                    } else {
                        find_optional_project(store, project.as_deref())?.map(|p| Some(p.id))
                    };
                    Ok(store.update_ticket(
                        id,
                        TicketChanges {
                            key: new_key,
                            name,
                            detail,
                            start_date,
                            due_date,
                            project,
                            iteration,
                        },
                    )?)
                })
                .await?;
            println!("Updated ticket {key}");
        }
        TicketCommand::Remove { key } => {
            let removed = database
                .update(|store| {
                    let id = find_ticket(store, &key)?.id;
                    Ok(store.remove_ticket(id)?)
                })
                .await?;
            println!("Removed ticket {key} with {} entries", removed.entries);
        }
        TicketCommand::Import {
            file,
            project,
            iteration,
        } => {
            let text = read_import_source(&file).await?;
            let lines = parse_ticket_lines(&text);
            if lines.is_empty() {
                warn!("No tickets found in {file:?}");
                println!("No tickets to import");
                return Ok(());
            }
            let start_date = today();
            let summary = database
                .update(|store| {
                    let project = find_optional_project(store, project.as_deref())?.map(|p| p.id);
                    Ok(import_tickets(store, lines, project, iteration, start_date)?)
                })
                .await?;
            info!("Imported {} tickets from {file:?}", summary.created.len());
            println!("Imported {} tickets", summary.created.len());
            if !summary.duplicates.is_empty() {
                println!(
                    "Skipped already existing: {}",
                    summary.duplicates.join(", ")
                );
            }
        }
    }
    Ok(())
}

async fn read_import_source(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read tickets from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {file:?}"))
    }
}

fn ticket_line(store: &Store, ticket: &Ticket) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        ticket.key,
        ticket.name,
        project_name(store, ticket.project),
        format_hours(store.ticket_hours(ticket.id))
    )
}

fn describe_ticket(store: &Store, ticket: &Ticket) -> String {
    let iteration = ticket
        .iteration
        .and_then(|id| store.iteration(id))
        .map(|i| format!("{} ({} {})", i.name, i.kind, i.id))
        .unwrap_or_default();
    let due = ticket
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_default();

    let mut text = format!(
        "{} {}\n{}\nProject: {}\nIteration: {}\nStart: {}\nDue: {}\nLogged: {}\n",
        ticket.key,
        ticket.name,
        ticket.detail,
        project_name(store, ticket.project),
        iteration,
        ticket.start_date,
        due,
        format_hours(store.ticket_hours(ticket.id)),
    );
    for entry in store
        .entries_newest_first()
        .into_iter()
        .filter(|e| e.ticket == Some(ticket.id))
    {
        text.push_str(&format!(
            "  #{}\t{}\t{}\t{}\n",
            entry.id,
            entry.logged_at.with_timezone(&Local).format("%x %H:%M"),
            format_hours(entry.hours),
            entry.note.as_deref().unwrap_or_default()
        ));
    }
    text
}
