use std::fmt::Write as _;

use anyhow::{Context, Result};
use tasklist_app::{CommitOutcome, CommitTrigger, DeleteOutcome, Prompt, SyncController};
use tasklist_core::{Task, timestamp};
use tasklist_remote::TaskGateway;
use tracing::debug;

use crate::{Command, LsFormat};

/// Load the list, then carry out one command against it.
#[allow(clippy::future_not_send)]
pub async fn run<G, P>(command: Command, controller: &SyncController<G, P>) -> Result<()>
where
    G: TaskGateway,
    P: Prompt,
{
    controller.load().await.context("failed to load tasks")?;

    match command {
        Command::Ls { filter, format } => {
            if let Some(mode) = filter {
                controller.set_filter(mode);
            }
            let tasks = controller.visible();
            match format {
                LsFormat::Table if tasks.is_empty() => println!("No tasks found"),
                LsFormat::Table => print!("{}", render_task_table(&tasks)?),
                LsFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
            }
        }
        Command::Add { name } => {
            let task = controller.add(&name).await?;
            println!("created task: {} ({})", task.id, task.name);
        }
        Command::Toggle { id } => {
            let task = controller.toggle(id).await?;
            println!("task {}: {}", task.id, status_label(&task));
        }
        Command::Rename { id, name } => {
            controller.begin_edit(id)?;
            controller.update_draft(&name);
            match controller.commit_edit(CommitTrigger::Enter).await? {
                CommitOutcome::Saved(task) => println!("renamed task: {} ({})", task.id, task.name),
                other => debug!(?other, "rename produced no change"),
            }
        }
        Command::Rm { id, .. } => {
            if controller.delete(id).await? == DeleteOutcome::Deleted {
                println!("deleted task: {id}");
            }
        }
    }

    Ok(())
}

const fn status_label(task: &Task) -> &'static str {
    if task.completed { "completed" } else { "active" }
}

fn render_task_table(tasks: &[Task]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "ID | Status | Name | Created")?;
    writeln!(out, "-- | ------ | ---- | -------")?;
    for task in tasks {
        let created = timestamp::format(task.created_at)?;
        writeln!(out, "{} | {} | {} | {}", task.id, status_label(task), task.name, created)?;
    }
    Ok(out)
}
