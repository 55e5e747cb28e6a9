use anyhow::Result;
use clap::Subcommand;

use crate::tracker::{
    entities::{IterationChanges, IterationId, IterationKind, NewIteration, ProjectId},
    store::Store,
};

use super::{
    dates::{parse_day, parse_optional_day, today, DATE_HELP},
    find_iteration, find_optional_project, project_name, Context,
};

#[derive(Debug, Subcommand)]
pub enum IterationCommand {
    #[command(about = "Create a sprint or a milestone")]
    Add {
        name: String,
        #[arg(short, long, value_enum, default_value_t = IterationKind::Sprint)]
        kind: IterationKind,
        #[arg(long, help = format!("First day. Defaults to today. {DATE_HELP}"))]
        start: Option<String>,
        #[arg(long, help = format!("Due day, must be after the first day. {DATE_HELP}"))]
        due: String,
        #[arg(short, long, help = "Name of the owning project")]
        project: Option<String>,
    },
    #[command(about = "List iterations")]
    List {
        #[arg(short, long, help = "Only iterations of this project")]
        project: Option<String>,
    },
    #[command(about = "Change an iteration")]
    Edit {
        id: IterationId,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, value_enum)]
        kind: Option<IterationKind>,
        #[arg(long, help = DATE_HELP)]
        start: Option<String>,
        #[arg(long, help = DATE_HELP)]
        due: Option<String>,
        #[arg(short, long, conflicts_with = "no_project")]
        project: Option<String>,
        #[arg(long, help = "Detach the iteration from its project")]
        no_project: bool,
    },
    #[command(about = "Remove an iteration. Its tickets stay, without an iteration")]
    Remove { id: IterationId },
}

pub async fn process_iteration_command(command: IterationCommand, context: &Context) -> Result<()> {
    let database = &context.database;
    let style = context.date_style;
    match command {
        IterationCommand::Add {
            name,
            kind,
            start,
            due,
            project,
        } => {
            let start_date = parse_optional_day(start.as_deref(), style)?.unwrap_or_else(today);
            let due_date = parse_day(&due, style)?;
            let id = database
                .update(|store| {
                    let project = find_optional_project(store, project.as_deref())?.map(|p| p.id);
                    Ok(store.add_iteration(NewIteration {
                        name,
                        kind,
                        start_date,
                        due_date,
                        project,
                    })?)
                })
                .await?;
            println!("Created {kind} {id}");
        }
        IterationCommand::List { project } => {
            let store = database.load().await?;
            let project = find_optional_project(&store, project.as_deref())?.map(|p| p.id);
            for line in iteration_lines(&store, project) {
                println!("{line}");
            }
        }
        IterationCommand::Edit {
            id,
            name,
            kind,
            start,
            due,
            project,
            no_project,
        } => {
            let start_date = parse_optional_day(start.as_deref(), style)?;
            let due_date = parse_optional_day(due.as_deref(), style)?;
            database
                .update(|store| {
                    find_iteration(store, id)?;
                    let project = if no_project {
                        Some(None)
                    } else {
                        find_optional_project(store, project.as_deref())?.map(|p| Some(p.id))
                    };
                    Ok(store.update_iteration(
                        id,
                        IterationChanges {
                            name,
                            kind,
                            start_date,
                            due_date,
                            project,
                        },
                    )?)
                })
                .await?;
            println!("Updated iteration {id}");
        }
        IterationCommand::Remove { id } => {
            let removed = database
                .update(|store| Ok(store.remove_iteration(id)?))
                .await?;
            println!(
                "Removed iteration {id}, {} tickets no longer have an iteration",
                removed.detached_tickets
            );
        }
    }
    Ok(())
}

fn iteration_lines(store: &Store, project: Option<ProjectId>) -> Vec<String> {
    store
        .iterations()
        .filter(|iteration| project.is_none() || iteration.project == project)
        .map(|iteration| {
            format!(
                "{}\t{}\t{}\t{} - {}\t{}\t{} tickets",
                iteration.id,
                iteration.kind,
                iteration.name,
                iteration.start_date,
                iteration.due_date,
                project_name(store, iteration.project),
                store.tickets_of_iteration(iteration.id).count()
            )
        })
        .collect()
}
