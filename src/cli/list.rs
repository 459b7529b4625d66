use std::path::{Path, PathBuf};

use clap::Parser;
use reqgraph::{domain::ReqFilter, storage::workspace::read_requirements, storage::repository};
use tracing::instrument;

use super::terminal::{terminal_width, truncate, Colorize};

const INDENT: &str = "    ";

#[derive(Debug, Parser)]
#[command(about = "List the requirements of a document")]
pub struct List {
    /// The document, by path relative to its repository or by file name
    document: PathBuf,

    /// Only requirements whose ID matches this pattern
    #[arg(long, value_name = "REGEX")]
    id: Option<String>,

    /// Only requirements whose title matches this pattern
    #[arg(long, value_name = "REGEX")]
    title: Option<String>,

    /// Only requirements whose body matches this pattern
    #[arg(long, value_name = "REGEX")]
    body: Option<String>,

    /// Only requirements with a matching attribute (`KEY=REGEX`, or `REGEX`
    /// to match any attribute)
    #[arg(long = "attribute", short, value_name = "FILTER")]
    attributes: Vec<String>,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let filter = ReqFilter::new(
            self.id.as_deref(),
            self.title.as_deref(),
            self.body.as_deref(),
            &self.attributes,
        )?;

        let config = repository::load(root)?;
        let (repo, document) = config.find_document(&self.document).ok_or_else(|| {
            anyhow::anyhow!("no document {} is configured", self.document.display())
        })?;
        let reqs = read_requirements(&config, repo, document)?;

        let width = terminal_width().unwrap_or(80).saturating_sub(INDENT.len());
        for req in reqs.iter().filter(|req| req.matches(&filter)) {
            println!("{} {}", req.id.to_string().info(), req.title);
            if let Some(first) = req.body.lines().find(|line| !line.trim().is_empty()) {
                println!("{INDENT}{}", truncate(first.trim(), width).dim());
            }
        }

        Ok(())
    }
}
