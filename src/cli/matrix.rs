use std::path::Path;

use clap::Parser;
use reqgraph::domain::{
    matrix::{trace_tables, MatrixEnd, TableRow},
    CodeType, ReqSpec,
};

/// Parse a `PREFIX-LEVEL` requirement spec, normalizing to uppercase.
fn parse_spec(s: &str) -> Result<ReqSpec, String> {
    let uppercase = s.to_uppercase();
    let spec = uppercase.strip_prefix("REQ-").unwrap_or(&uppercase);
    match spec.split_once('-') {
        Some((prefix, level)) if !prefix.is_empty() && !level.is_empty() && !level.contains('-') => {
            Ok(ReqSpec::new(prefix, level))
        }
        _ => Err(format!("expected PREFIX-LEVEL, got {s:?}")),
    }
}

fn parse_end(s: &str) -> Result<MatrixEnd, String> {
    match s {
        "code" => Ok(MatrixEnd::Code(CodeType::Implementation)),
        "tests" => Ok(MatrixEnd::Code(CodeType::Tests)),
        spec => parse_spec(spec).map(MatrixEnd::Requirements),
    }
}

#[derive(Debug, Parser)]
#[command(about = "Print a trace matrix between two levels")]
pub struct Matrix {
    /// The requirements to trace, as `PREFIX-LEVEL`
    #[arg(long, value_parser = parse_spec)]
    from: ReqSpec,

    /// What to trace them to: `PREFIX-LEVEL`, `code` or `tests`
    #[arg(long, value_parser = parse_end)]
    to: MatrixEnd,
}

impl Matrix {
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let (_, graph) = super::load_graph(root)?;
        let tables = trace_tables(&graph, &self.from, &self.to);

        println!("{}\t{}", self.from, self.to);
        print_rows(&tables.forward);
        println!();
        println!("{}\t{}", self.to, self.from);
        print_rows(&tables.backward);
        Ok(())
    }
}

fn print_rows(rows: &[TableRow]) {
    for TableRow(from, to) in rows {
        println!("{}\t{}", from.name, to.as_ref().map_or("-", |cell| cell.name.as_str()));
    }
}
