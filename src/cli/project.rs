use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    tracker::{entities::NewProject, store::Store},
    utils::time::format_hours,
};

use super::{find_project, Context};

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    #[command(about = "Create a project")]
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        detail: String,
    },
    #[command(about = "List projects with their logged time")]
    List,
    #[command(about = "Rename a project. The new name must not be taken")]
    Rename { name: String, new_name: String },
    #[command(about = "Change the detail of a project")]
    Edit { name: String, detail: String },
    #[command(
        about = "Remove a project together with its tickets, iterations and the time logged on them"
    )]
    Remove { name: String },
}

pub async fn process_project_command(command: ProjectCommand, context: &Context) -> Result<()> {
    let database = &context.database;
    match command {
        ProjectCommand::Add { name, detail } => {
            let id = database
                .update(|store| Ok(store.add_project(NewProject { name, detail })?))
                .await?;
            println!("Created project {id}");
        }
        ProjectCommand::List => {
            let store = database.load().await?;
            for line in project_lines(&store) {
                println!("{line}");
            }
        }
        ProjectCommand::Rename { name, new_name } => {
            database
                .update(|store| {
                    let id = find_project(store, &name)?.id;
                    Ok(store.rename_project(id, &new_name)?)
                })
                .await?;
            println!("Renamed {name:?}");
        }
        ProjectCommand::Edit { name, detail } => {
            database
                .update(|store| {
                    let id = find_project(store, &name)?.id;
                    Ok(store.set_project_detail(id, &detail)?)
                })
                .await?;
            println!("Updated {name:?}");
        }
        ProjectCommand::Remove { name } => {
            let removed = database
                .update(|store| {
                    let id = find_project(store, &name)?.id;
                    Ok(store.remove_project(id)?)
                })
                .await?;
            info!("Project {name:?} removed");
            println!(
                "Removed {name:?} with {} tickets, {} iterations and {} entries",
                removed.tickets, removed.iterations, removed.entries
            );
        }
    }
    Ok(())
}

fn project_lines(store: &Store) -> Vec<String> {
    store
        .projects()
        .map(|project| {
            let hours: f64 = store
                .tickets_of_project(project.id)
                .map(|ticket| store.ticket_hours(ticket.id))
                .sum();
            format!(
                "{}\t{}\t{}\t{}",
                project.id,
                project.name,
                format_hours(hours),
                project.detail
            )
        })
        .collect()
}
