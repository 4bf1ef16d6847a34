//! Main CLI application structure

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::output::{Output, OutputFormat};
use super::{query, task};
use crate::domain::TaskState;
use crate::logging;
use crate::storage::{Config, GlobalConfig, Project};

#[derive(Parser)]
#[command(name = "cascade")]
#[command(author, version, about = "Task tracking with dependency-aware states")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true, env = "CASCADE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cascade project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Add a task
    ///
    /// Examples:
    ///   cascade add "Design schema"
    ///   cascade add "Build API" --after t-1a2b3c4
    Add {
        /// Task title
        title: String,

        /// Task that must be done first (repeatable)
        #[arg(long = "after", value_name = "ID")]
        after: Vec<String>,
    },

    /// List tasks
    List {
        /// Only show tasks in this state
        #[arg(long)]
        state: Option<TaskState>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Request a state for a task (todo, in_progress, done)
    Set {
        /// Task ID
        id: String,

        /// Requested state
        state: TaskState,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Mark task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Move a task back to todo
    Reopen {
        /// Task ID
        id: String,
    },

    /// Add a dependency between tasks
    Dep {
        /// Task that will wait
        task: String,

        /// Task that must be done first
        depends_on: String,
    },

    /// Remove a dependency
    Undep {
        /// Task to detach
        task: String,

        /// Dependency to remove
        depends_on: String,
    },

    /// Delete a task and drop it from other tasks' dependencies
    Remove {
        /// Task ID
        id: String,
    },

    /// Re-derive blocked states from dependencies and save repairs
    Recompute,

    /// Show tasks ready to work on
    Ready,

    /// Show blocked tasks
    Blocked,

    /// Show task counts per state
    Status,
}

/// Main entry point for the CLI
///
/// Errors are printed in the selected format and turned into a failing exit
/// code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let global = Config::load_global();
    let configured_format = global.as_ref().ok().map(|g| g.default_format.into());
    let output = Output::new(cli.format.or(configured_format).unwrap_or_default());

    let result = global.and_then(|global| execute(cli, &global, &output));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli, global: &GlobalConfig, output: &Output) -> Result<()> {
    logging::init_logging(cli.verbose, global.log_level.as_deref())?;
    debug!("cascade starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized cascade project at {}",
                project.root().display()
            ));
        }

        Commands::Add { title, after } => task::add_task(output, &title, &after)?,
        Commands::List { state } => task::list_tasks(output, state)?,
        Commands::Show { id } => task::show_task(output, &id)?,
        Commands::Set { id, state } => task::set_state(output, &id, state)?,
        Commands::Start { id } => task::set_state(output, &id, TaskState::InProgress)?,
        Commands::Done { id } => task::set_state(output, &id, TaskState::Done)?,
        Commands::Reopen { id } => task::set_state(output, &id, TaskState::Todo)?,
        Commands::Dep { task, depends_on } => task::add_dependency(output, &task, &depends_on)?,
        Commands::Undep { task, depends_on } => {
            task::remove_dependency(output, &task, &depends_on)?
        }
        Commands::Remove { id } => task::remove_task(output, &id)?,

        Commands::Recompute => query::recompute(output)?,
        Commands::Ready => query::ready(output)?,
        Commands::Blocked => query::blocked(output)?,
        Commands::Status => query::status(output)?,
    }

    debug!("command completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_after_flags() {
        let cli = Cli::try_parse_from(["cascade", "add", "Ship", "--after", "a", "--after", "b"])
            .unwrap();
        match cli.command {
            Commands::Add { title, after } => {
                assert_eq!(title, "Ship");
                assert_eq!(after, vec!["a", "b"]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn parses_state_argument() {
        let cli = Cli::try_parse_from(["cascade", "set", "a", "in-progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Set {
                state: TaskState::InProgress,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["cascade", "set", "a", "finished"]).is_err());
    }

    #[test]
    fn format_is_optional() {
        let cli = Cli::try_parse_from(["cascade", "status"]).unwrap();
        assert_eq!(cli.format, None);

        let cli = Cli::try_parse_from(["cascade", "--format", "json", "status"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }
}
