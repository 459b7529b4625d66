use std::path::Path;

use clap::Parser;
use reqgraph::Issue;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate every document and source file of the repository tree")]
pub struct Validate {
    /// Exit with status 2 if any issue is found
    #[arg(long)]
    strict: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let (_, graph) = super::load_graph(root)?;
        let issues = graph.issues();

        match self.output {
            OutputFormat::Table => output_table(issues),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(issues)?),
            OutputFormat::Summary => println!("issues={}", issues.len()),
        }

        if self.strict && !issues.is_empty() {
            std::process::exit(2);
        }

        Ok(())
    }
}

fn output_table(issues: &[Issue]) {
    for issue in issues {
        println!(
            "{}:{}:{} {} {}",
            issue.repo,
            issue.path.display(),
            issue.line,
            format!("[{}]", issue.issue_type).warning(),
            issue.error
        );
    }

    if issues.is_empty() {
        println!("{}", "Requirements are consistent (0 issues)".success());
    } else {
        println!("\n{}", format!("Summary: {} issues found", issues.len()).warning());
    }
}
