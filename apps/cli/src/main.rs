use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tasklane_client::{
    ApiClient, ClientState, NewTask, TaskPatch, TaskPriority, TaskStatus, Theme,
};
use tasklane_focus::DEFAULT_FOCUS_SECONDS;
use tasklane_tasks::view::{prepare_for_display, StatusFilter};
use tracing_subscriber::EnvFilter;

mod focus;
mod render;

use render::{task_line, Palette};

#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Manage your Tasklane tasks from the terminal")]
#[command(version)]
struct Cli {
    #[arg(long, env = "TASKLANE_API_URL", default_value = "http://127.0.0.1:5000")]
    api_url: String,

    /// Where the session token and theme are kept
    #[arg(long, env = "TASKLANE_CLIENT_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register(CredentialArgs),
    /// Log in and remember the session
    Login(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Set the colour theme, or flip it when no theme is given
    Theme { theme: Option<Theme> },
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List tasks, earliest due date first
    List {
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Change fields of a task
    Update(UpdateArgs),
    /// Mark a task as completed
    Done { id: String },
    /// Delete a task
    Delete { id: String },
    /// Run a focus timer for a task
    Focus {
        id: String,
        #[arg(long)]
        minutes: Option<u32>,
    },
}

#[derive(Args)]
struct CredentialArgs {
    email: String,
    #[arg(long, env = "TASKLANE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    #[arg(long)]
    status: Option<TaskStatus>,
    #[arg(long)]
    priority: Option<TaskPriority>,
    #[arg(long, conflicts_with = "clear_due")]
    due: Option<NaiveDate>,
    #[arg(long)]
    clear_due: bool,
}

impl UpdateArgs {
    fn patch(&self) -> TaskPatch {
        let description = match (&self.description, self.clear_description) {
            (_, true) => Some(None),
            (Some(text), false) => Some(Some(text.clone())),
            (None, false) => None,
        };
        let due_date = match (self.due, self.clear_due) {
            (_, true) => Some(None),
            (Some(date), false) => Some(Some(date)),
            (None, false) => None,
        };

        TaskPatch {
            title: self.title.clone(),
            description,
            status: self.status,
            priority: self.priority,
            due_date,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let state_path = cli.state.unwrap_or_else(ClientState::default_path);
    let mut state = ClientState::load(&state_path)
        .await
        .with_context(|| format!("failed to read {}", state_path.display()))?;
    let client = ApiClient::new(cli.api_url);
    let session = state.session();

    match cli.command {
        Commands::Register(args) => {
            let account = client.register(&args.email, &args.password).await?;
            println!("Registered {} ({})", account.email, account.id);
        }
        Commands::Login(args) => {
            let login = client.login(&args.email, &args.password).await?;
            state.sign_in(login.token);
            state.save(&state_path).await?;
            println!(
                "Logged in as {}, session valid until {}",
                args.email,
                login.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
        Commands::Logout => {
            state.sign_out();
            state.save(&state_path).await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let account = client.me(&session).await?;
            println!("{} ({})", account.email, account.id);
        }
        Commands::Theme { theme } => {
            state.theme = theme.unwrap_or_else(|| state.theme.toggled());
            state.save(&state_path).await?;
            println!("Theme set to {}", state.theme);
        }
        Commands::Add {
            title,
            description,
            priority,
            status,
            due,
        } => {
            let new_task = NewTask {
                title,
                description,
                status,
                priority,
                due_date: due,
            };
            let task = client.create_task(&session, &new_task).await?;
            println!("Created {}", task.id);
        }
        Commands::List { status } => {
            let tasks = prepare_for_display(client.list_tasks(&session).await?, status);
            if tasks.is_empty() {
                println!("No tasks");
                return Ok(());
            }

            let palette = Palette::new(state.theme);
            let today = Local::now().date_naive();
            for task in &tasks {
                println!("{}", task_line(task, today, &palette));
            }
        }
        Commands::Update(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                bail!("nothing to update");
            }
            let task = client.update_task(&session, &args.id, &patch).await?;
            println!("{}", task_line(&task, Local::now().date_naive(), &Palette::new(state.theme)));
        }
        Commands::Done { id } => {
            let patch = TaskPatch {
                status: Some(TaskStatus::Completed),
                ..TaskPatch::default()
            };
            let task = client.update_task(&session, &id, &patch).await?;
            println!("Completed {}", task.title);
        }
        Commands::Delete { id } => {
            client.delete_task(&session, &id).await?;
            println!("Deleted {id}");
        }
        Commands::Focus { id, minutes } => {
            let task = client
                .list_tasks(&session)
                .await?
                .into_iter()
                .find(|task| task.id == id)
                .context("task not found")?;
            let seconds = minutes
                .map(|minutes| minutes.saturating_mul(60))
                .unwrap_or(DEFAULT_FOCUS_SECONDS);
            focus::run(&task, seconds).await?;
        }
    }

    Ok(())
}
