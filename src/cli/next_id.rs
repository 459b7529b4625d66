use std::path::{Path, PathBuf};

use clap::Parser;
use reqgraph::{
    domain::graph::next_id,
    storage::{repository, workspace::read_requirements},
};

#[derive(Debug, Parser)]
#[command(about = "Print the next free requirement ID of a document")]
pub struct NextId {
    /// The document, by path relative to its repository or by file name
    document: PathBuf,
}

impl NextId {
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = repository::load(root)?;
        let (repo, document) = config.find_document(&self.document).ok_or_else(|| {
            anyhow::anyhow!("no document {} is configured", self.document.display())
        })?;
        let reqs = read_requirements(&config, repo, document)?;

        print!("{}", next_id(reqs.iter().map(|req| &req.id), &document.req_spec));
        Ok(())
    }
}
