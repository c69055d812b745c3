use std::collections::VecDeque;

use ahash::{HashMap, HashMapExt};
use glycoletters::{Glycoletter, Registry};
use petgraph::stable_graph::StableUnGraph;

use crate::{Error, Glycan, Node, NodeId, Result, TerminalState};

// Public API ==========================================================================================================

impl<'r> Glycan<'r> {
    #[must_use]
    pub const fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Node ids in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<'r>)> + '_ {
        self.node_ids().map(|id| (id, &self.graph[id]))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node<'r>> {
        self.graph.node_weight(id)
    }

    /// The glycoletter of every node, in node id order
    pub fn labels(&self) -> impl Iterator<Item = Glycoletter<'r>> + '_ {
        self.graph.node_indices().map(|id| self.graph[id].glycoletter)
    }

    /// Neighbours of `id` in ascending order
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<_> = self.graph.neighbors(id).collect();
        neighbors.sort_unstable();
        neighbors
    }

    #[must_use]
    pub fn degree(&self, id: NodeId) -> usize {
        self.graph.neighbors(id).count()
    }

    #[must_use]
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    /// Every edge as a `(lower, higher)` pair of node ids, sorted
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.into_iter()
    }

    /// The node at the reducing end of the notation: the one written last, with the highest id
    #[must_use]
    pub fn anchor(&self) -> Option<NodeId> {
        self.graph.node_indices().max()
    }

    /// Connected components, each sorted, ordered by their lowest node id
    #[must_use]
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut seen = vec![false; self.node_bound()];
        let mut components = Vec::new();
        for start in self.node_ids() {
            if seen[start.index()] {
                continue;
            }
            seen[start.index()] = true;

            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for next in self.graph.neighbors(node) {
                    if !seen[next.index()] {
                        seen[next.index()] = true;
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.components().len() == 1
    }

    /// Fills in every [`TerminalState::Unset`] node from its degree: leaves are terminal, everything else internal
    pub fn annotate_termini(&mut self) {
        let ids: Vec<_> = self.node_ids().collect();
        for id in ids {
            let degree = self.degree(id);
            let node = &mut self.graph[id];
            if node.termini == TerminalState::Unset {
                node.termini = if degree <= 1 {
                    TerminalState::Terminal
                } else {
                    TerminalState::Internal
                };
            }
        }
    }

    /// Replaces the terminal state of every node, given in node id order
    pub fn with_termini(mut self, states: &[TerminalState]) -> Result<Self> {
        let nodes = self.node_count();
        if states.len() != nodes {
            return Err(Error::TerminiMismatch {
                provided: states.len(),
                nodes,
            });
        }

        let ids: Vec<_> = self.node_ids().collect();
        for (id, &state) in ids.into_iter().zip(states) {
            self.graph[id].termini = state;
        }
        Ok(self)
    }
}

impl<'r> Node<'r> {
    #[must_use]
    pub const fn glycoletter(&self) -> Glycoletter<'r> {
        self.glycoletter
    }

    #[must_use]
    pub const fn termini(&self) -> TerminalState {
        self.termini
    }
}

// Crate API ===========================================================================================================

impl<'r> Glycan<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            graph: StableUnGraph::default(),
        }
    }

    pub(crate) fn add_glycoletter(&mut self, glycoletter: Glycoletter<'r>) -> NodeId {
        self.graph.add_node(Node {
            glycoletter,
            termini: TerminalState::Unset,
        })
    }

    pub(crate) fn connect(&mut self, a: NodeId, b: NodeId) {
        self.graph.add_edge(a, b, ());
    }

    pub(crate) fn remove_nodes(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        for node in nodes {
            self.graph.remove_node(node);
        }
    }

    /// One more than the largest node id, suitable for sizing lookup tables
    pub(crate) fn node_bound(&self) -> usize {
        self.graph.node_indices().map(|id| id.index() + 1).max().unwrap_or(0)
    }

    /// Copies the nodes in `order` into a new glycan with dense ids that follow `order`. Only edges with both ends
    /// kept survive, along with any `extra_edges`.
    pub(crate) fn rebuild(&self, order: &[NodeId], extra_edges: &[(NodeId, NodeId)]) -> Self {
        let mut glycan = Self::new(self.registry);
        let mut renumbered = HashMap::with_capacity(order.len());
        for &old in order {
            let new = glycan.graph.add_node(self.graph[old]);
            renumbered.insert(old, new);
        }

        for (a, b) in self.edges().chain(extra_edges.iter().copied()) {
            if let (Some(&a), Some(&b)) = (renumbered.get(&a), renumbered.get(&b)) {
                glycan.connect(a, b);
            }
        }
        glycan
    }

    /// The subgraph induced by `nodes`, keeping their relative order
    pub(crate) fn induced_subgraph(&self, nodes: &[NodeId]) -> Self {
        let mut order = nodes.to_vec();
        order.sort_unstable();
        self.rebuild(&order, &[])
    }

    pub(crate) fn is_connected_subset(&self, nodes: &[NodeId]) -> bool {
        let Some(&start) = nodes.first() else {
            return false;
        };

        let mut member = vec![false; self.node_bound()];
        for node in nodes {
            member[node.index()] = true;
        }

        let mut reached = 1;
        member[start.index()] = false;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in self.graph.neighbors(node) {
                if member[next.index()] {
                    member[next.index()] = false;
                    reached += 1;
                    stack.push(next);
                }
            }
        }
        reached == nodes.len()
    }
}
