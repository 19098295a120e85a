//! Graph validation and compilation into an executable [`App`].

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::builder::GraphBuilder;
use crate::app::App;
use crate::types::StageKind;

/// Structural defects rejected at compile time.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no edges out of the start endpoint")]
    #[diagnostic(
        code(tribunal::graph::no_entry_edges),
        help("declare at least one edge from StageKind::Start")
    )]
    NoEntryEdges,

    #[error("edge references undeclared stage `{stage}`")]
    #[diagnostic(
        code(tribunal::graph::undeclared_stage),
        help("register the stage with add_stage before wiring edges to it")
    )]
    UndeclaredStage { stage: StageKind },

    #[error("cycle detected through stage `{stage}`")]
    #[diagnostic(
        code(tribunal::graph::cycle),
        help("the audit graph must be acyclic; remove the back edge")
    )]
    CycleDetected { stage: StageKind },

    #[error("stage `{stage}` is unreachable from the start endpoint")]
    #[diagnostic(
        code(tribunal::graph::unreachable),
        help("wire the stage into the graph or remove its registration")
    )]
    Unreachable { stage: StageKind },
}

impl GraphBuilder {
    /// Validate the topology and produce an executable [`App`].
    ///
    /// Rejects graphs with no entry edges, edges touching unregistered
    /// stages, cycles, and registered-but-unreachable stages. Conditional
    /// edges contribute every declared outcome's targets to validation.
    pub fn compile(self) -> Result<App, GraphError> {
        let entry = self.edges.get(&StageKind::Start);
        if entry.is_none_or(Vec::is_empty) {
            return Err(GraphError::NoEntryEdges);
        }

        let declared = |kind: StageKind| kind.is_virtual() || self.stages.contains_key(&kind);

        for (from, targets) in &self.edges {
            if !declared(*from) {
                return Err(GraphError::UndeclaredStage { stage: *from });
            }
            for to in targets {
                if !declared(*to) {
                    return Err(GraphError::UndeclaredStage { stage: *to });
                }
            }
        }
        for edge in &self.conditional_edges {
            if !declared(edge.from()) {
                return Err(GraphError::UndeclaredStage { stage: edge.from() });
            }
            for target in edge.targets() {
                if !declared(target) {
                    return Err(GraphError::UndeclaredStage { stage: target });
                }
            }
        }

        let adjacency = self.union_adjacency();
        detect_cycle(&adjacency)?;

        let reachable = reachable_from_start(&adjacency);
        for kind in self.stages.keys() {
            if !reachable.contains(kind) {
                return Err(GraphError::Unreachable { stage: *kind });
            }
        }

        Ok(App::from_parts(
            self.stages,
            self.edges,
            self.conditional_edges,
            self.concurrency_limit,
        ))
    }

    /// Successor map over unconditional edges plus every conditional
    /// outcome's targets.
    fn union_adjacency(&self) -> FxHashMap<StageKind, Vec<StageKind>> {
        let mut adjacency: FxHashMap<StageKind, Vec<StageKind>> = FxHashMap::default();
        for (from, targets) in &self.edges {
            adjacency.entry(*from).or_default().extend(targets.iter().copied());
        }
        for edge in &self.conditional_edges {
            adjacency.entry(edge.from()).or_default().extend(edge.targets());
        }
        adjacency
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Iterative three-colour DFS over the union adjacency.
fn detect_cycle(adjacency: &FxHashMap<StageKind, Vec<StageKind>>) -> Result<(), GraphError> {
    let mut marks: FxHashMap<StageKind, Mark> = FxHashMap::default();

    for &root in adjacency.keys() {
        if marks.contains_key(&root) {
            continue;
        }
        // Stack frames carry the node and its next-successor cursor.
        let mut stack: Vec<(StageKind, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);

        while let Some(&(node, cursor)) = stack.last() {
            let successors = adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]);
            if cursor < successors.len() {
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }
                let next = successors[cursor];
                match marks.get(&next) {
                    Some(Mark::InProgress) => {
                        return Err(GraphError::CycleDetected { stage: next });
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::InProgress);
                        stack.push((next, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }
    Ok(())
}

/// BFS over the union adjacency from the start endpoint.
fn reachable_from_start(adjacency: &FxHashMap<StageKind, Vec<StageKind>>) -> FxHashSet<StageKind> {
    let mut reachable = FxHashSet::default();
    let mut queue = std::collections::VecDeque::from([StageKind::Start]);
    reachable.insert(StageKind::Start);

    while let Some(node) = queue.pop_front() {
        for &next in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
            if reachable.insert(next) {
                queue.push_back(next);
            }
        }
    }
    reachable
}
