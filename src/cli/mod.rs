//! Command-line interface for taskdeck
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::board::TaskBoard;
use crate::config::{resolve_data_dir, Config, DATA_DIR_ENV};
use crate::error::Result;
use crate::events::{EventDestination, EventSink};
use crate::output::OutputOptions;
use crate::repository::TaskRepository;
use crate::storage::FileMedium;
use crate::store::TaskStore;

mod init;
mod serve;
mod task;

/// taskdeck - a personal task board
///
/// Tracks tasks with a status, category, priority and optional due date,
/// and serves the web client that edits the same board.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the task data (defaults to the platform data dir)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Path to a taskdeck.toml (defaults to the one in the data dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write notifications as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default taskdeck.toml
    Init,

    /// Add a task
    Add {
        /// Task title (1-100 characters)
        title: String,

        /// Longer description (up to 500 characters)
        #[arg(short, long)]
        description: Option<String>,

        /// Status: todo, in-progress, done
        #[arg(short, long)]
        status: Option<String>,

        /// Category: work, personal, shopping, health, finance, other
        #[arg(short, long)]
        category: Option<String>,

        /// Priority: low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },

    /// Edit fields of a task
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,

        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Change the status of a task
    Status {
        /// Task ID
        id: String,

        /// New status: todo, in-progress, done
        status: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },

    /// List tasks, filtered and sorted
    List {
        /// Status filter (or "all")
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Category filter (or "all")
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Case-insensitive search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Sort key: created, due-date, priority, status, title
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Show task counts by status
    Summary,

    /// Show the most recently created tasks
    Activity,

    /// Serve the built web client
    Serve {
        /// Listen port
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Listen host
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Directory with the built client (default from config)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

/// Settings shared by every subcommand once global flags are resolved.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    fn resolve(cli: &Cli) -> Result<Self> {
        let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
        let config = match cli.config.as_deref() {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&data_dir),
        };
        tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");
        Ok(Self {
            data_dir,
            config,
            events: cli.events.clone(),
            json: cli.json,
            quiet: cli.quiet,
        })
    }

    pub fn medium(&self) -> FileMedium {
        FileMedium::new(&self.data_dir).with_quota(self.config.storage.quota())
    }

    /// Open and load the board. The returned flag is true when notifications
    /// go to stdout, in which case regular output is suppressed.
    pub fn open_board(&self) -> Result<(TaskBoard<FileMedium>, bool)> {
        let store = TaskStore::with_config(self.medium(), &self.config.storage);
        let mut board = TaskBoard::new(TaskRepository::new(store));

        let (sink, events_to_stdout) = open_event_sink(self.events.as_deref())?;
        if let Some(sink) = sink {
            board = board.with_event_sink(sink);
        }
        board.load();
        Ok((board, events_to_stdout))
    }

    pub fn output(&self, events_to_stdout: bool) -> OutputOptions {
        OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        }
    }
}

fn open_event_sink(events: Option<&str>) -> Result<(Option<EventSink>, bool)> {
    let destination = EventDestination::parse(events);
    let sink = destination.as_ref().map(|dest| dest.open()).transpose()?;
    let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));
    Ok((sink, events_to_stdout))
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = Context::resolve(&self)?;
        match self.command {
            Commands::Init => init::run(&ctx),
            Commands::Add {
                title,
                description,
                status,
                category,
                priority,
                due,
            } => task::run_add(
                &ctx,
                task::AddOptions {
                    title,
                    description,
                    status,
                    category,
                    priority,
                    due,
                },
            ),
            Commands::Edit {
                id,
                title,
                description,
                clear_description,
                status,
                category,
                priority,
                due,
                clear_due,
            } => task::run_edit(
                &ctx,
                task::EditOptions {
                    id,
                    title,
                    description,
                    clear_description,
                    status,
                    category,
                    priority,
                    due,
                    clear_due,
                },
            ),
            Commands::Status { id, status } => task::run_status(&ctx, &id, &status),
            Commands::Rm { id } => task::run_rm(&ctx, &id),
            Commands::List {
                status,
                category,
                search,
                sort,
            } => task::run_list(
                &ctx,
                task::ListOptions {
                    status,
                    category,
                    search,
                    sort,
                },
            ),
            Commands::Show { id } => task::run_show(&ctx, &id),
            Commands::Summary => task::run_summary(&ctx),
            Commands::Activity => task::run_activity(&ctx),
            Commands::Serve {
                port,
                host,
                static_dir,
            } => serve::run(
                &ctx,
                serve::ServeOptions {
                    port,
                    host,
                    static_dir,
                },
            ),
        }
    }
}
