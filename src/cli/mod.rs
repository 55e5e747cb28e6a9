pub mod database;
pub mod dates;
pub mod entry;
pub mod iteration;
pub mod project;
pub mod report;
pub mod ticket;
pub mod timer;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dates::DateStyle;
use tracing::level_filters::LevelFilter;

use crate::{
    tracker::{
        database::Database,
        entities::{Iteration, IterationId, Project, ProjectId, Ticket},
        store::Store,
    },
    utils::{
        dir::{create_application_default_path, create_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

use self::{
    database::{process_database_command, DatabaseCommand},
    entry::{process_entry_command, process_log_command, EntryCommand, LogCommand},
    iteration::{process_iteration_command, IterationCommand},
    project::{process_project_command, ProjectCommand},
    report::{process_report_command, ReportCommand},
    ticket::{process_ticket_command, TicketCommand},
    timer::{process_timer_command, TimerCommand},
};

#[derive(Parser, Debug)]
#[command(name = "ticktrack", version)]
#[command(about = "Track time spent on tickets of your projects", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Mirror logs to stdout")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    #[command(about = "Manage sprints and milestones")]
    Iteration {
        #[command(subcommand)]
        command: IterationCommand,
    },
    #[command(about = "Manage tickets")]
    Ticket {
        #[command(subcommand)]
        command: TicketCommand,
    },
    #[command(about = "Log time spent on a ticket")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Manage logged time entries")]
    Entry {
        #[command(subcommand)]
        command: EntryCommand,
    },
    #[command(about = "Time a ticket live. The entry is saved when the timer stops")]
    Timer {
        #[command(flatten)]
        command: TimerCommand,
    },
    #[command(about = "Summarize logged time")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Export or import the whole database")]
    Db {
        #[command(subcommand)]
        command: DatabaseCommand,
    },
}

/// Settings shared by every command.
pub struct Context {
    pub database: Database,
    pub date_style: DateStyle,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => create_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let context = Context {
        database: Database::new(app_dir)?,
        date_style: args.date_style,
    };

    match args.commands {
        Commands::Project { command } => process_project_command(command, &context).await,
        Commands::Iteration { command } => process_iteration_command(command, &context).await,
        Commands::Ticket { command } => process_ticket_command(command, &context).await,
        Commands::Log { command } => process_log_command(command, &context).await,
        Commands::Entry { command } => process_entry_command(command, &context).await,
        Commands::Timer { command } => process_timer_command(command, &context).await,
        Commands::Report { command } => process_report_command(command, &context).await,
        Commands::Db { command } => process_database_command(command, &context).await,
    }
}

// Lookups shared by commands. Projects are addressed by name, tickets by their key and
// iterations by id.

fn find_project<'a>(store: &'a Store, name: &str) -> Result<&'a Project> {
    store
        .project_by_name(name)
        .ok_or_else(|| anyhow!("No project named {name:?}"))
}

fn find_optional_project<'a>(store: &'a Store, name: Option<&str>) -> Result<Option<&'a Project>> {
    name.map(|name| find_project(store, name)).transpose()
}

fn find_ticket<'a>(store: &'a Store, key: &str) -> Result<&'a Ticket> {
    store
        .ticket_by_key(key)
        .ok_or_else(|| anyhow!("No ticket with id {key:?}"))
}

fn find_iteration(store: &Store, id: IterationId) -> Result<&Iteration> {
    store
        .iteration(id)
        .ok_or_else(|| anyhow!("No iteration with id {id}"))
}

fn project_name(store: &Store, project: Option<ProjectId>) -> String {
    project
        .and_then(|id| store.project(id))
        .map(|p| p.name.clone())
        .unwrap_or_default()
}
