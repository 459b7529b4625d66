use std::path::{Path, PathBuf};

use clap::Parser;
use reqgraph::domain::diff::changed_since;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report requirements changed since an older checkout")]
pub struct Diff {
    /// The root of the older checkout
    #[arg(long, value_name = "DIR")]
    since: PathBuf,
}

impl Diff {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let (_, current) = super::load_graph(root)?;
        let (_, previous) = super::load_graph(&self.since)?;

        let Some(diffs) = changed_since(&current, &previous) else {
            println!("{}", "No requirements changed".success());
            return Ok(());
        };

        for (id, changes) in diffs {
            println!("{}", id.info());
            for change in changes {
                println!("  {change}");
            }
        }
        Ok(())
    }
}
