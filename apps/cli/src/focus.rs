use std::io::Write;

use anyhow::Result;
use tasklane_focus::{FocusController, FocusPhase, FocusTimer};
use tasklane_tasks::Task;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::focus_line;

/// Run an interactive focus session on `task` until the user quits.
pub async fn run(task: &Task, seconds: u32) -> Result<()> {
    let controller = FocusController::new(FocusTimer::with_duration(seconds));
    controller.enter_focus(task.id.clone()).await?;

    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Focus mode: {}", task.title);
    println!("[enter] start/pause  [r] reset  [q] quit");
    draw(&task.title, &updates.borrow_and_update())?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                draw(&task.title, &snapshot)?;
                if snapshot.phase == FocusPhase::Completed {
                    println!("\nFocus session complete. [r] to go again, [q] to quit");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "" | "t" | "toggle" => {
                        if let Err(error) = controller.toggle().await {
                            println!("{error}");
                        }
                    }
                    "r" | "reset" => {
                        if let Err(error) = controller.reset().await {
                            println!("{error}");
                        }
                    }
                    "q" | "quit" | "exit" => break,
                    other => println!("unknown command `{other}`"),
                }
            }
        }
    }

    if let Some(session) = controller.exit().await {
        tracing::debug!(task = %session.task_id, remaining = session.remaining, "left focus mode");
    }
    println!();
    Ok(())
}

fn draw(title: &str, snapshot: &tasklane_focus::FocusSnapshot) -> Result<()> {
    print!("\r{}   ", focus_line(title, snapshot));
    std::io::stdout().flush()?;
    Ok(())
}
