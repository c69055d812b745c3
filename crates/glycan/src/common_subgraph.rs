use ahash::{HashMap, HashMapExt};
use glycoletters::GlycoletterId;
use tracing::debug;

use crate::{Glycan, NodeId, ReferenceTable, Result};

// Public API ==========================================================================================================

impl<'r> Glycan<'r> {
    /// The notation of the largest connected structure shared by `self` and `other`, or an empty string when they
    /// share nothing (or when the largest shared structure is split into pieces)
    ///
    /// If that structure can't be written as notation, `fallback` is asked for a stored notation before giving up.
    pub fn largest_common_subgraph(
        &self,
        other: &Glycan<'_>,
        fallback: Option<&dyn ReferenceTable>,
    ) -> Result<String> {
        let Some(common) = self.largest_common_glycan(other).filter(Glycan::is_connected) else {
            return Ok(String::new());
        };

        match fallback {
            Some(table) => common.to_notation_or_lookup(table),
            None => common.to_notation(),
        }
    }

    /// The maximum common induced subgraph of `self` and `other`, built from the nodes of `self`
    ///
    /// When several are equally large, a connected one is preferred. Returns `None` if the two have no glycoletter
    /// in common.
    #[must_use]
    pub fn largest_common_glycan(&self, other: &Glycan<'_>) -> Option<Glycan<'r>> {
        let mut search = CommonSubgraphSearch::new(self, other);
        search.extend(0);

        debug!(
            common_nodes = search.best.len(),
            connected = search.best_connected,
            "found largest common subgraph"
        );
        (!search.best.is_empty()).then(|| self.induced_subgraph(&search.best))
    }
}

// Branch and Bound ====================================================================================================

struct CommonSubgraphSearch<'a, 'l, 'r> {
    left: &'a Glycan<'l>,
    right: &'a Glycan<'r>,
    left_nodes: Vec<NodeId>,
    mapping: Vec<(NodeId, NodeId)>,
    right_used: Vec<bool>,
    // NOTE: Per glycoletter, how many left nodes are still undecided and how many right nodes are still free
    left_remaining: HashMap<GlycoletterId, usize>,
    right_free: HashMap<GlycoletterId, usize>,
    best: Vec<NodeId>,
    best_connected: bool,
}

impl<'a, 'l, 'r> CommonSubgraphSearch<'a, 'l, 'r> {
    fn new(left: &'a Glycan<'l>, right: &'a Glycan<'r>) -> Self {
        Self {
            left,
            right,
            left_nodes: left.node_ids().collect(),
            mapping: Vec::new(),
            right_used: vec![false; right.node_bound()],
            left_remaining: label_counts(left),
            right_free: label_counts(right),
            best: Vec::new(),
            best_connected: false,
        }
    }

    fn extend(&mut self, depth: usize) {
        let bound = self.mapping.len() + self.remaining_bound();
        let best = self.best.len();
        if bound < best || (bound == best && self.best_connected) {
            return;
        }

        let Some(&left_node) = self.left_nodes.get(depth) else {
            self.record_mapping();
            return;
        };
        let label = self.left.graph[left_node].glycoletter.id();
        decrement(&mut self.left_remaining, label);

        let candidates: Vec<_> = self
            .right
            .node_ids()
            .filter(|&r| !self.right_used[r.index()] && self.right.graph[r].glycoletter.id() == label)
            .collect();
        for right_node in candidates {
            if !self.is_feasible(left_node, right_node) {
                continue;
            }

            self.mapping.push((left_node, right_node));
            self.right_used[right_node.index()] = true;
            decrement(&mut self.right_free, label);

            self.extend(depth + 1);

            self.mapping.pop();
            self.right_used[right_node.index()] = false;
            *self.right_free.entry(label).or_default() += 1;
        }

        // Leave `left_node` out of the common subgraph entirely
        self.extend(depth + 1);

        *self.left_remaining.entry(label).or_default() += 1;
    }

    fn remaining_bound(&self) -> usize {
        self.left_remaining
            .iter()
            .map(|(label, &left)| left.min(self.right_free.get(label).copied().unwrap_or_default()))
            .sum()
    }

    fn is_feasible(&self, left_node: NodeId, right_node: NodeId) -> bool {
        self.mapping.iter().all(|&(l, r)| {
            self.left.are_adjacent(left_node, l) == self.right.are_adjacent(right_node, r)
        })
    }

    fn record_mapping(&mut self) {
        let nodes: Vec<_> = self.mapping.iter().map(|&(l, _)| l).collect();
        let connected = self.left.is_connected_subset(&nodes);
        if nodes.len() > self.best.len() || (connected && !self.best_connected) {
            self.best = nodes;
            self.best_connected = connected;
        }
    }
}

fn label_counts(glycan: &Glycan<'_>) -> HashMap<GlycoletterId, usize> {
    let mut counts = HashMap::new();
    for glycoletter in glycan.labels() {
        *counts.entry(glycoletter.id()).or_default() += 1;
    }
    counts
}

fn decrement(counts: &mut HashMap<GlycoletterId, usize>, label: GlycoletterId) {
    if let Some(count) = counts.get_mut(&label) {
        *count = count.saturating_sub(1);
    }
}
