//! Trace matrices.
//!
//! A trace matrix pairs every item at one level (requirements of a document,
//! or functions in code or tests) with the items it is linked to at another
//! level. Items with no link get a single row with an empty second cell, so
//! gaps in the traceability stand out.

use std::{collections::BTreeMap, fmt};

use crate::domain::{
    code::{CodeFile, CodeRef, CodeType},
    document::ReqSpec,
    graph::ReqGraph,
    requirement::Req,
};

/// One end of a trace matrix.
#[derive(Debug, Clone)]
pub enum MatrixEnd {
    /// The requirements matching a spec.
    Requirements(ReqSpec),
    /// The functions in source files of a type.
    Code(CodeType),
}

impl fmt::Display for MatrixEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirements(spec) => spec.fmt(f),
            Self::Code(code_type) => code_type.fmt(f),
        }
    }
}

/// A requirement or a function in a trace matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// How the item is displayed.
    pub name: String,
    /// Sort key within its column.
    ///
    /// The ID number for a requirement. For a function, its line offset by
    /// the rank of its file, so functions sort by file and then by line.
    pub order_number: u64,
}

/// A pair of linked items. The second cell is `None` for an unlinked item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow(pub TableCell, pub Option<TableCell>);

impl TableRow {
    fn sort_key(&self) -> (u64, Option<u64>, &str, Option<&str>) {
        (
            self.0.order_number,
            self.1.as_ref().map(|cell| cell.order_number),
            &self.0.name,
            self.1.as_ref().map(|cell| cell.name.as_str()),
        )
    }
}

/// The matrices in both directions between two levels.
#[derive(Debug, Clone)]
pub struct TraceTables {
    /// From the first level to the second.
    pub forward: Vec<TableRow>,
    /// From the second level back to the first.
    pub backward: Vec<TableRow>,
}

/// Builds the matrices between the requirements matching `from` and `to`,
/// in both directions.
#[must_use]
pub fn trace_tables(graph: &ReqGraph, from: &ReqSpec, to: &MatrixEnd) -> TraceTables {
    let forward = build_matrix(graph, from, to);
    let backward = match to {
        MatrixEnd::Requirements(spec) => {
            build_matrix(graph, spec, &MatrixEnd::Requirements(from.clone()))
        }
        MatrixEnd::Code(code_type) => build_code_matrix(graph, *code_type, from),
    };
    TraceTables { forward, backward }
}

/// Pairs every requirement matching `from` with the items it is linked to.
///
/// Towards requirements, both parents and children are considered. Towards
/// code, the functions of the given type implementing the requirement.
#[must_use]
pub fn build_matrix(graph: &ReqGraph, from: &ReqSpec, to: &MatrixEnd) -> Vec<TableRow> {
    let order = CodeOrder::new(graph);
    let mut rows = Vec::new();

    for req in reqs_with_spec(graph, from) {
        let linked: Vec<TableCell> = match to {
            MatrixEnd::Requirements(spec) => req
                .parents
                .iter()
                .chain(&req.children)
                .filter_map(|id| graph.get(id))
                .filter(|other| matches_spec(other, spec))
                .map(req_cell)
                .collect(),
            MatrixEnd::Code(code_type) => req
                .tags
                .iter()
                .filter(|tag| tag.file.code_type == *code_type)
                .map(|tag| order.cell(tag))
                .collect(),
        };

        push_rows(&mut rows, req_cell(req), linked);
    }

    sort(&mut rows);
    rows
}

/// Pairs every function in files of `code_type` with the requirements
/// matching `to` that it implements.
///
/// Functions allowed to have no requirements are only listed when they have
/// some.
#[must_use]
pub fn build_code_matrix(graph: &ReqGraph, code_type: CodeType, to: &ReqSpec) -> Vec<TableRow> {
    let order = CodeOrder::new(graph);
    let mut rows = Vec::new();

    for code in graph
        .code_tags()
        .iter()
        .filter(|(file, _)| file.code_type == code_type)
        .flat_map(|(_, tags)| tags)
    {
        let linked: Vec<TableCell> = code
            .parents
            .iter()
            .filter_map(|id| graph.get(id))
            .filter(|req| matches_spec(req, to))
            .map(req_cell)
            .collect();

        if linked.is_empty() && code.optional {
            continue;
        }
        push_rows(&mut rows, order.cell(&code.to_ref()), linked);
    }

    sort(&mut rows);
    rows
}

fn push_rows(rows: &mut Vec<TableRow>, from: TableCell, linked: Vec<TableCell>) {
    if linked.is_empty() {
        rows.push(TableRow(from, None));
        return;
    }
    rows.extend(
        linked
            .into_iter()
            .map(|cell| TableRow(from.clone(), Some(cell))),
    );
}

fn sort(rows: &mut [TableRow]) {
    rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

fn req_cell(req: &Req) -> TableCell {
    TableCell {
        name: req.key(),
        order_number: req.id_number(),
    }
}

/// Whether a live requirement is one of those named by `spec`.
///
/// An absent attribute is matched as an empty value.
fn matches_spec(req: &Req, spec: &ReqSpec) -> bool {
    !req.is_deleted()
        && req.document.matches_spec(spec)
        && spec.matches_id(&req.id)
        && spec.attribute.as_ref().is_none_or(|filter| {
            filter
                .value
                .is_match(req.attributes.get(&filter.key).map_or("", String::as_str))
        })
}

fn reqs_with_spec<'a>(graph: &'a ReqGraph, spec: &ReqSpec) -> impl Iterator<Item = &'a Req> {
    graph
        .reqs()
        .values()
        .filter(move |req| matches_spec(req, spec))
}

/// What is needed to order functions by file path and then by line.
struct CodeOrder<'a> {
    file_index: BTreeMap<&'a CodeFile, u64>,
    factor: u64,
}

impl<'a> CodeOrder<'a> {
    fn new(graph: &'a ReqGraph) -> Self {
        let max_line = graph
            .code_tags()
            .values()
            .flatten()
            .filter(|code| {
                !code.optional || code.parent_ids.iter().any(|id| graph.get(id).is_some())
            })
            .map(|code| code.line)
            .max()
            .unwrap_or(0);

        let mut files: Vec<&CodeFile> = graph.code_tags().keys().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.cmp(b)));

        Self {
            file_index: files.into_iter().zip(0..).collect(),
            factor: max_line as u64 + 1,
        }
    }

    fn cell(&self, code: &CodeRef) -> TableCell {
        let index = self.file_index.get(&code.file).copied().unwrap_or_default();
        TableCell {
            name: format!("{}: {} - {}", code.file.repo, code.file.path.display(), code.tag),
            order_number: index * self.factor + code.line as u64,
        }
    }
}
