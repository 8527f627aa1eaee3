//! Emission order for spreadsheet formulas
//!
//! A formula must come after every formula whose variable it reads. The
//! order is a depth-first topological sort that keeps input order among
//! independent formulas. Cycles never abort the sort: the edge closing a
//! cycle is skipped and reported as a warning.

use super::cell_translator::referenced_cells;
use crate::types::{FormulaCell, Warnings};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::debug;

/// DFS marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyOrderer;

impl DependencyOrderer {
    pub fn new() -> Self {
        Self
    }

    /// Order `formulas` so each one follows the formulas it references.
    ///
    /// Every input formula appears exactly once in the output.
    pub fn order(&self, formulas: Vec<FormulaCell>) -> (Vec<FormulaCell>, Warnings) {
        let mut warnings = Warnings::new();
        let graph = self.build_dependency_graph(&formulas);

        for component in kosaraju_scc(&graph) {
            if component.len() < 2 {
                continue;
            }
            let mut members: Vec<usize> = component.iter().map(|idx| graph[*idx]).collect();
            members.sort_unstable();
            let names: Vec<&str> = members.iter().map(|&i| formulas[i].name.as_str()).collect();
            warnings.push(format!(
                "Circular reference between {}; cycle edge dropped",
                names.join(", ")
            ));
        }

        let mut marks = vec![Mark::Unvisited; formulas.len()];
        let mut order = Vec::with_capacity(formulas.len());
        for start in graph.node_indices() {
            visit(&graph, start, &mut marks, &mut order);
        }

        let mut slots: Vec<Option<FormulaCell>> = formulas.into_iter().map(Some).collect();
        let ordered = order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect();
        (ordered, warnings)
    }

    /// One node per formula (weight = input position), one edge from each
    /// dependency to the formula that reads it
    fn build_dependency_graph(&self, formulas: &[FormulaCell]) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..formulas.len()).map(|i| graph.add_node(i)).collect();

        let by_cell: HashMap<String, usize> = formulas
            .iter()
            .enumerate()
            .map(|(i, f)| (f.reference.key(), i))
            .collect();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (i, f) in formulas.iter().enumerate() {
            by_name.entry(f.name.as_str()).or_insert(i);
        }

        for (i, formula) in formulas.iter().enumerate() {
            for dep in self.extract_dependencies(&formula.raw_formula, &by_cell, &by_name) {
                if dep != i {
                    graph.update_edge(nodes[dep], nodes[i], ());
                }
            }
        }

        debug!(
            formulas = graph.node_count(),
            edges = graph.edge_count(),
            "built formula dependency graph"
        );
        graph
    }

    /// Positions of the formulas `raw` refers to, by cell address or by name
    fn extract_dependencies(
        &self,
        raw: &str,
        by_cell: &HashMap<String, usize>,
        by_name: &HashMap<&str, usize>,
    ) -> Vec<usize> {
        let mut deps = Vec::new();

        for cell in referenced_cells(raw) {
            if let Some(&i) = by_cell.get(&cell.key()) {
                if !deps.contains(&i) {
                    deps.push(i);
                }
            }
        }

        for word in raw.split(|c: char| !c.is_alphanumeric() && c != '_') {
            if word.is_empty() || word.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            if let Some(&i) = by_name.get(word) {
                if !deps.contains(&i) {
                    deps.push(i);
                }
            }
        }

        deps
    }
}

/// Depth-first emission from `start`, dependencies before dependents.
///
/// Uses an explicit stack of `(node, dependencies, next)` frames so a long
/// chain of formulas cannot exhaust the thread stack.
fn visit(graph: &DiGraph<usize, ()>, start: NodeIndex, marks: &mut [Mark], order: &mut Vec<usize>) {
    if marks[graph[start]] != Mark::Unvisited {
        return;
    }

    let enter = |node: NodeIndex, marks: &mut [Mark]| {
        marks[graph[node]] = Mark::Visiting;
        let mut deps: Vec<NodeIndex> = graph.neighbors_directed(node, Direction::Incoming).collect();
        deps.sort_unstable();
        (node, deps, 0usize)
    };

    let mut stack = vec![enter(start, marks)];
    while let Some((node, deps, next)) = stack.last_mut() {
        if let Some(&dep) = deps.get(*next) {
            *next += 1;
            // Visiting: already on the current path, this edge closes a cycle
            if marks[graph[dep]] == Mark::Unvisited {
                let frame = enter(dep, marks);
                stack.push(frame);
            }
            continue;
        }

        let i = graph[*node];
        marks[i] = Mark::Visited;
        order.push(i);
        stack.pop();
    }
}
