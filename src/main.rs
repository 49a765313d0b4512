use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use todostore::filter::empty_hint;
use todostore::{Config, FileSlot, Priority, StatusFilter, Task, TaskId, TaskListStore};
use tracing::Level;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore CLI - A to-do list persisted to a local JSON slot")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the task list (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task text
        text: String,

        /// Priority: low, medium or high
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },

    /// List tasks
    List {
        /// Status filter: all, active or completed
        #[arg(short, long, default_value = "all", value_parser = parse_filter)]
        filter: StatusFilter,

        /// Only show tasks containing this text
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Replace the text of a task
    Edit {
        id: String,

        /// New task text
        text: String,
    },

    /// Mark a task done, or not done again
    Toggle { id: String },

    /// Delete a task
    Remove { id: String },

    /// Delete every completed task
    ClearDone,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.data_dir = path;
    }

    match cli.command {
        Commands::Add { text, priority } => {
            let mut store = open_store(&config)?;
            match store.add(&text, priority)? {
                Some(id) => println!("Added task {}", id.to_string().cyan()),
                None => println!("{}", "Nothing to add: task text is empty".yellow()),
            }
        }
        Commands::List { filter, search } => {
            let store = open_store(&config)?;
            let visible = store.visible_tasks(filter, &search);

            if visible.is_empty() {
                println!("{}", "No tasks found".bold());
                println!("{}", empty_hint(filter, &search).dimmed());
            } else {
                for task in visible {
                    println!("{}", render_task(task, store.options().priorities));
                }
            }

            println!();
            if store.is_empty() {
                println!("{}", "Your task list is empty".dimmed());
            } else {
                println!("{}", format!("{} task(s) left to complete", store.remaining()).dimmed());
            }
        }
        Commands::Edit { id, text } => {
            let mut store = open_store(&config)?;
            let id = existing_id(&store, &id)?;
            let current = store.get(id).map(|t| t.text.clone()).unwrap_or_default();
            store.begin_edit(id, &current);
            if store.commit_edit(&text)? {
                println!("Updated task {}", id.to_string().cyan());
            } else {
                store.cancel_edit();
                println!("{}", "Nothing to save: task text is empty".yellow());
            }
        }
        Commands::Toggle { id } => {
            let mut store = open_store(&config)?;
            let id = existing_id(&store, &id)?;
            store.toggle_complete(id)?;
            let state = match store.get(id) {
                Some(t) if t.completed => "done".green(),
                _ => "active".normal(),
            };
            println!("Task {} is now {}", id.to_string().cyan(), state);
        }
        Commands::Remove { id } => {
            let mut store = open_store(&config)?;
            let id = existing_id(&store, &id)?;
            store.remove(id)?;
            println!("Removed task {}", id.to_string().cyan());
        }
        Commands::ClearDone => {
            let mut store = open_store(&config)?;
            let removed = store.clear_completed()?;
            println!("Cleared {} completed task(s)", removed);
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

fn parse_priority(raw: &str) -> std::result::Result<Priority, String> {
    raw.parse().map_err(|e: eyre::Report| e.to_string())
}

fn parse_filter(raw: &str) -> std::result::Result<StatusFilter, String> {
    raw.parse().map_err(|e: eyre::Report| e.to_string())
}

fn open_store(config: &Config) -> Result<TaskListStore<FileSlot>> {
    let slot = FileSlot::open(&config.data_dir)?;
    TaskListStore::open(slot, config.store_options())
}

fn existing_id(store: &TaskListStore<FileSlot>, raw: &str) -> Result<TaskId> {
    let id: TaskId = raw.parse()?;
    if store.get(id).is_none() {
        return Err(eyre!("No task with id {}", id));
    }
    Ok(id)
}

fn render_task(task: &Task, priorities: bool) -> String {
    let mark = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let text = if task.completed {
        task.text.strikethrough().dimmed()
    } else {
        task.text.normal()
    };

    let mut line = format!(
        "{} {} {}  {}",
        mark,
        task.id.to_string().cyan(),
        text,
        format!("{} {}", task.date, task.time).dimmed()
    );

    if priorities {
        let priority = task.effective_priority();
        let badge = match priority {
            Priority::High => priority.to_string().red(),
            Priority::Medium => priority.to_string().yellow(),
            Priority::Low => priority.to_string().green(),
        };
        line.push_str(&format!("  {}", badge));
    }

    line
}
