use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use super::Context;

#[derive(Debug, Subcommand)]
pub enum DatabaseCommand {
    #[command(about = "Write a copy of the database to a file")]
    Export { path: PathBuf },
    #[command(
        about = "Replace the database with a previously exported file. The current database is kept as a backup"
    )]
    Import {
        path: PathBuf,
        #[arg(short, long, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(about = "Print where the database is stored")]
    Path,
}

pub async fn process_database_command(command: DatabaseCommand, context: &Context) -> Result<()> {
    let database = &context.database;
    match command {
        DatabaseCommand::Export { path } => {
            database.export_to(&path).await?;
            println!("Exported to {}", path.display());
        }
        DatabaseCommand::Import { path, yes } => {
            if !yes && !confirm(&format!(
                "Replace the database with {}? The current one is kept at {}",
                path.display(),
                database.backup_path().display()
            ))
            .await?
            {
                info!("Import of {path:?} cancelled");
                return Ok(());
            }
            let outcome = database.import_from(&path).await?;
            println!("Imported {}", path.display());
            if let Some(backup) = outcome.backup {
                println!("Previous database saved to {}", backup.display());
            }
        }
        DatabaseCommand::Path => {
            println!("{}", database.path().display());
        }
    }
    Ok(())
}

async fn confirm(question: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{question} [y/N] ").as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Failed to read the answer")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::is_yes;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yeah"));
    }
}
