use std::path::{Path, PathBuf};

mod diff;
mod list;
mod matrix;
mod next_id;
mod terminal;
mod validate;

use clap::ArgAction;
use diff::Diff;
use list::List;
use matrix::Matrix;
use next_id::NextId;
use reqgraph::{storage::repository, Config, ReqGraph};
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The root of the repository to load
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Validate every document and source file of the repository tree
    Validate(Validate),

    /// List the requirements of a document
    List(List),

    /// Print the next free requirement ID of a document
    NextId(NextId),

    /// Report requirements changed since an older checkout
    Diff(Diff),

    /// Print a trace matrix between two levels
    Matrix(Matrix),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run(root),
            Self::List(command) => command.run(root),
            Self::NextId(command) => command.run(root),
            Self::Diff(command) => command.run(root),
            Self::Matrix(command) => command.run(root),
        }
    }
}

/// Loads the repository tree at `root` and builds its graph.
fn load_graph(root: &Path) -> anyhow::Result<(Config, ReqGraph)> {
    let config = repository::load(root)?;
    let graph = reqgraph::build_graph(&config)?;
    Ok((config, graph))
}
