use std::{borrow::Cow, collections::VecDeque};

use ahash::HashSet;
use glycoletters::{GlycoletterId, Registry};
use itertools::Itertools;
use tracing::debug;

use crate::{Glycan, Node, NodeId, Result, TerminalState};

// Public API ==========================================================================================================

/// Decides when a host node may stand in for a motif node
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub enum MatchMode {
    /// Registry ids must be equal
    #[default]
    Exact,
    /// Nodes holding any of these glycoletters match anything, on either side
    Wildcard(Wildcards),
    /// Registry ids and terminal states must be equal, though [`TerminalState::Flexible`] matches any state
    Positional,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Wildcards(HashSet<GlycoletterId>);

impl Wildcards {
    pub fn new(registry: &Registry, tokens: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let ids = tokens
            .into_iter()
            .map(|t| registry.index_of(t.as_ref()))
            .collect::<glycoletters::Result<_>>()?;
        Ok(Self(ids))
    }

    /// Every glycoletter the registry flags as a wildcard
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        Self(registry.wildcards().map(|g| g.id()).collect())
    }

    #[must_use]
    pub fn contains(&self, id: GlycoletterId) -> bool {
        self.0.contains(&id)
    }
}

/// A correspondence from motif nodes (left) to the host nodes they were matched with (right)
pub type Embedding = Vec<(NodeId, NodeId)>;

impl Glycan<'_> {
    /// Graph isomorphism with exact glycoletter matching
    #[must_use]
    pub fn equals(&self, other: &Glycan<'_>) -> bool {
        self.equals_with(other, &MatchMode::Exact)
    }

    #[must_use]
    pub fn equals_with(&self, other: &Glycan<'_>, mode: &MatchMode) -> bool {
        if self.node_count() != other.node_count() || self.edge_count() != other.edge_count() {
            return false;
        }

        if *mode == MatchMode::Exact {
            if label_multiset(self) != label_multiset(other) {
                return false;
            }
        }

        let host = working_copy(self, mode);
        let motif = working_copy(other, mode);
        host.find_embedding(&motif, mode).is_some()
    }

    /// Is there a node-induced subgraph of `self` that matches `motif`?
    #[must_use]
    pub fn contains(&self, motif: &Glycan<'_>, mode: &MatchMode) -> bool {
        let host = working_copy(self, mode);
        passes_precheck(&host, motif, mode) && host.find_embedding(motif, mode).is_some()
    }

    /// Counts non-overlapping occurrences of `motif`, greedily: each match found is removed before searching again
    #[must_use]
    pub fn count(&self, motif: &Glycan<'_>, mode: &MatchMode) -> usize {
        let mut host = working_copy(self, mode).into_owned();
        let mut occurrences = 0;
        while passes_precheck(&host, motif, mode) {
            let Some(embedding) = host.find_embedding(motif, mode) else {
                break;
            };
            occurrences += 1;
            host.remove_nodes(embedding.into_iter().map(|(_, h)| h));
        }

        debug!(
            occurrences,
            host_nodes = self.node_count(),
            motif_nodes = motif.node_count(),
            "counted motif occurrences"
        );
        occurrences
    }

    /// The first node-induced embedding of `motif` in `self`, if there is one
    #[must_use]
    pub fn find_embedding(&self, motif: &Glycan<'_>, mode: &MatchMode) -> Option<Embedding> {
        Embedder::new(self, motif, mode).find()
    }
}

// Node Compatibility ==================================================================================================

impl MatchMode {
    fn nodes_match(&self, host: &Node<'_>, motif: &Node<'_>) -> bool {
        let same_glycoletter = host.glycoletter().id() == motif.glycoletter().id();
        match self {
            Self::Exact => same_glycoletter,
            Self::Wildcard(wildcards) => {
                same_glycoletter
                    || wildcards.contains(host.glycoletter().id())
                    || wildcards.contains(motif.glycoletter().id())
            }
            Self::Positional => same_glycoletter && states_match(host.termini(), motif.termini()),
        }
    }
}

// NOTE: An `Unset` state places no constraint, so motifs parsed without termini match like `Exact`
fn states_match(host: TerminalState, motif: TerminalState) -> bool {
    use TerminalState::{Flexible, Unset};
    matches!((host, motif), (Flexible | Unset, _) | (_, Flexible | Unset)) || host == motif
}

/// Positional matching needs every host node to know its terminal state
fn working_copy<'g, 'r>(glycan: &'g Glycan<'r>, mode: &MatchMode) -> Cow<'g, Glycan<'r>> {
    if *mode == MatchMode::Positional {
        let mut annotated = glycan.clone();
        annotated.annotate_termini();
        Cow::Owned(annotated)
    } else {
        Cow::Borrowed(glycan)
    }
}

fn label_multiset(glycan: &Glycan<'_>) -> Vec<GlycoletterId> {
    glycan.labels().map(|g| g.id()).sorted_unstable().collect()
}

// NOTE: Cheap necessary conditions, checked before committing to a full search
fn passes_precheck(host: &Glycan<'_>, motif: &Glycan<'_>, mode: &MatchMode) -> bool {
    if motif.is_empty() || host.node_count() < motif.node_count() {
        return false;
    }

    let host_labels: HashSet<_> = host.labels().map(|g| g.id()).collect();
    match mode {
        MatchMode::Wildcard(wildcards) => {
            host_labels.iter().any(|&id| wildcards.contains(id))
                || motif
                    .labels()
                    .all(|g| wildcards.contains(g.id()) || host_labels.contains(&g.id()))
        }
        MatchMode::Exact | MatchMode::Positional => motif.labels().all(|g| host_labels.contains(&g.id())),
    }
}

// Subgraph Search =====================================================================================================

struct Embedder<'a, 'h, 'm> {
    host: &'a Glycan<'h>,
    motif: &'a Glycan<'m>,
    mode: &'a MatchMode,
    motif_order: Vec<NodeId>,
    // NOTE: For each motif node in `motif_order`, a neighbour placed before it (if any), whose image in the host
    // limits where this node can go
    anchors: Vec<Option<NodeId>>,
    motif_map: Vec<Option<NodeId>>,
    host_used: Vec<bool>,
}

impl<'a, 'h, 'm> Embedder<'a, 'h, 'm> {
    fn new(host: &'a Glycan<'h>, motif: &'a Glycan<'m>, mode: &'a MatchMode) -> Self {
        let (motif_order, anchors) = search_order(motif);
        Self {
            host,
            motif,
            mode,
            motif_order,
            anchors,
            motif_map: vec![None; motif.node_bound()],
            host_used: vec![false; host.node_bound()],
        }
    }

    fn find(mut self) -> Option<Embedding> {
        if !self.extend(0) {
            return None;
        }

        let embedding = self
            .motif_order
            .iter()
            .filter_map(|&m| Some((m, self.motif_map[m.index()]?)))
            .sorted_unstable()
            .collect();
        Some(embedding)
    }

    fn extend(&mut self, depth: usize) -> bool {
        let Some(&motif_node) = self.motif_order.get(depth) else {
            return true;
        };

        let candidates = match self.anchors[depth] {
            Some(anchor) => self.motif_map[anchor.index()].map_or_else(Vec::new, |h| self.host.neighbors(h)),
            None => self.host.node_ids().collect(),
        };

        for host_node in candidates {
            if self.host_used[host_node.index()] || !self.is_feasible(depth, motif_node, host_node) {
                continue;
            }

            self.motif_map[motif_node.index()] = Some(host_node);
            self.host_used[host_node.index()] = true;

            if self.extend(depth + 1) {
                return true;
            }

            self.motif_map[motif_node.index()] = None;
            self.host_used[host_node.index()] = false;
        }

        false
    }

    // NOTE: Induced matching: adjacency *and* non-adjacency with every placed node must agree
    fn is_feasible(&self, depth: usize, motif_node: NodeId, host_node: NodeId) -> bool {
        let (Some(host_weight), Some(motif_weight)) = (self.host.node(host_node), self.motif.node(motif_node))
        else {
            return false;
        };
        if !self.mode.nodes_match(host_weight, motif_weight) {
            return false;
        }

        self.motif_order[..depth].iter().all(|&placed| {
            self.motif_map[placed.index()].is_some_and(|placed_host| {
                self.motif.are_adjacent(motif_node, placed) == self.host.are_adjacent(host_node, placed_host)
            })
        })
    }
}

/// Breadth-first over each motif component, starting from its best-connected node, so every node after the first
/// in a component has an already-placed neighbour
fn search_order(motif: &Glycan<'_>) -> (Vec<NodeId>, Vec<Option<NodeId>>) {
    let mut order = Vec::with_capacity(motif.node_count());
    let mut anchors = Vec::with_capacity(motif.node_count());
    let mut placed = vec![false; motif.node_bound()];

    for component in motif.components() {
        let Some(start) = component.iter().copied().rev().max_by_key(|&n| motif.degree(n)) else {
            continue;
        };
        placed[start.index()] = true;
        order.push(start);
        anchors.push(None);

        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in motif.neighbors(node) {
                if !placed[next.index()] {
                    placed[next.index()] = true;
                    order.push(next);
                    anchors.push(Some(node));
                    queue.push_back(next);
                }
            }
        }
    }

    (order, anchors)
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;
    use crate::{ParseOptions, Termini};

    static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

    static WILDCARDS: Lazy<MatchMode> = Lazy::new(|| MatchMode::Wildcard(Wildcards::from_registry(&REGISTRY)));

    const N_GLYCAN: &str =
        "Gal(b1-4)GlcNAc(b1-2)Man(a1-3)[Gal(b1-4)GlcNAc(b1-2)Man(a1-6)]Man(b1-4)GlcNAc(b1-4)GlcNAc";

    fn parse(notation: &str) -> Glycan<'static> {
        Glycan::parse(&REGISTRY, notation).unwrap()
    }

    fn motif(notation: &str) -> Glycan<'static> {
        let options = ParseOptions {
            allow_open_end: true,
            ..ParseOptions::default()
        };
        Glycan::parse_with(&REGISTRY, notation, &options).unwrap()
    }

    fn motif_with(notation: &str, termini: Termini) -> Glycan<'static> {
        let options = ParseOptions {
            allow_open_end: true,
            termini,
        };
        Glycan::parse_with(&REGISTRY, notation, &options).unwrap()
    }

    #[test]
    fn isomorphism() {
        macro_rules! assert_equals {
            ($a:literal, $b:literal, $expected:literal) => {
                assert_eq!(parse($a).equals(&parse($b)), $expected, "{} vs {}", $a, $b);
                assert_eq!(parse($b).equals(&parse($a)), $expected, "{} vs {}", $b, $a);
            };
        }
        // Same Glycans
        assert_equals!("Gal", "Gal", true);
        assert_equals!("Gal(b1-4)GlcNAc", "Gal(b1-4)GlcNAc", true);
        assert_equals!("Gal(b1-4)[Fuc(a1-3)]GlcNAc", "Fuc(a1-3)[Gal(b1-4)]GlcNAc", true);
        assert_equals!(
            "Man(a1-3)[Man(a1-6)]Man(b1-4)GlcNAc",
            "Man(a1-6)[Man(a1-3)]Man(b1-4)GlcNAc",
            true
        );
        // Different Glycans
        assert_equals!("Gal", "Glc", false);
        assert_equals!("Gal(b1-4)GlcNAc", "Gal(b1-3)GlcNAc", false);
        assert_equals!("Gal(b1-4)GlcNAc", "Gal(b1-4)GlcNAc(b1-3)Gal", false);
        assert_equals!("Gal(b1-4)[Fuc(a1-3)]GlcNAc", "Fuc(a1-3)Gal(b1-4)GlcNAc", false);
    }

    #[test]
    fn wildcard_isomorphism() {
        let generic = parse("Hex(?1-?)GlcNAc");
        assert!(!parse("Gal(b1-4)GlcNAc").equals(&generic));
        assert!(parse("Gal(b1-4)GlcNAc").equals_with(&generic, &WILDCARDS));
        assert!(!parse("Gal(b1-4)GlcNAc(b1-3)Gal").equals_with(&generic, &WILDCARDS));
    }

    #[test]
    fn exact_containment() {
        let host = parse(N_GLYCAN);
        assert!(host.contains(&parse("Gal(b1-4)GlcNAc"), &MatchMode::Exact));
        assert!(host.contains(&parse("Man(a1-3)[Man(a1-6)]Man"), &MatchMode::Exact));
        assert!(host.contains(&motif("Man(b1-4)"), &MatchMode::Exact));
        assert!(host.contains(&host, &MatchMode::Exact));
        // Missing labels fail the pre-check
        assert!(!host.contains(&parse("Neu5Ac(a2-6)Gal"), &MatchMode::Exact));
        // Present labels in the wrong arrangement
        assert!(!host.contains(&parse("Gal(b1-4)Man"), &MatchMode::Exact));
        assert!(!host.contains(&parse("GlcNAc(b1-2)Man(b1-4)GlcNAc"), &MatchMode::Exact));
        // Larger motifs never match
        assert!(!parse("Gal(b1-4)GlcNAc").contains(&host, &MatchMode::Exact));
        // Empty motifs never match
        assert!(!host.contains(&Glycan::new(&REGISTRY), &MatchMode::Exact));
    }

    #[test]
    fn counting_occurrences() {
        let host = parse(N_GLYCAN);
        assert_eq!(host.node_count(), 17);
        assert_eq!(host.count(&parse("Gal(b1-4)GlcNAc"), &MatchMode::Exact), 2);
        assert_eq!(host.count(&parse("GlcNAc(b1-4)GlcNAc"), &MatchMode::Exact), 1);
        assert_eq!(host.count(&parse("Man"), &MatchMode::Exact), 3);
        assert_eq!(host.count(&parse("Neu5Ac"), &MatchMode::Exact), 0);
        assert_eq!(host.count(&Glycan::new(&REGISTRY), &MatchMode::Exact), 0);
        // Overlapping occurrences are only counted once
        let host = parse("GlcNAc(b1-4)GlcNAc(b1-4)GlcNAc");
        assert_eq!(host.count(&parse("GlcNAc(b1-4)GlcNAc"), &MatchMode::Exact), 1);
    }

    #[test]
    fn wildcard_containment() {
        let host = parse("Gal(b1-4)GlcNAc");
        assert!(!host.contains(&parse("Hex(b1-4)GlcNAc"), &MatchMode::Exact));
        assert!(host.contains(&parse("Hex(b1-4)GlcNAc"), &WILDCARDS));
        assert!(host.contains(&parse("Gal(?1-?)GlcNAc"), &WILDCARDS));
        assert!(host.contains(&parse("Monosaccharide(?1-?)Monosaccharide"), &WILDCARDS));
        // Wildcards in the host match anything in the motif
        assert!(parse("Hex(b1-4)GlcNAc").contains(&parse("Gal(b1-4)GlcNAc"), &WILDCARDS));

        let hex_only = MatchMode::Wildcard(Wildcards::new(&REGISTRY, ["Hex"]).unwrap());
        assert!(host.contains(&parse("Hex(b1-4)GlcNAc"), &hex_only));
        assert!(!host.contains(&parse("Gal(?1-?)GlcNAc"), &hex_only));

        let host = parse(N_GLYCAN);
        assert_eq!(host.count(&parse("Hex(b1-4)GlcNAc"), &WILDCARDS), 3);
    }

    #[test]
    fn unknown_wildcards() {
        assert!(Wildcards::new(&REGISTRY, ["Hex", "Blob"]).is_err());
        assert!(Wildcards::new(&REGISTRY, Vec::<String>::new()).is_ok());
    }

    #[test]
    fn positional_containment() {
        use TerminalState::{Flexible, Internal, Terminal};

        let host = parse("Fuc(a1-2)Gal(b1-4)GlcNAc");
        let unconstrained = parse("Gal(b1-4)GlcNAc");
        let terminal_gal = motif_with("Gal(b1-4)GlcNAc", Termini::Calculate);
        let flexible_gal = motif_with("Gal(b1-4)GlcNAc", Termini::Provided(vec![Flexible, Internal, Terminal]));

        assert!(host.contains(&unconstrained, &MatchMode::Positional));
        assert!(host.contains(&terminal_gal, &MatchMode::Exact));
        assert!(!host.contains(&terminal_gal, &MatchMode::Positional));
        assert!(host.contains(&flexible_gal, &MatchMode::Positional));

        // States provided on the host are kept
        let host = motif_with("Gal(b1-4)GlcNAc", Termini::Provided(vec![Internal, Internal, Terminal]));
        assert!(!host.contains(&terminal_gal, &MatchMode::Positional));
        assert_eq!(host.count(&flexible_gal, &MatchMode::Positional), 1);
    }

    #[test]
    fn embeddings_are_induced() {
        // Fuc0 a1-2:1 Gal2 b1-4:3 GlcNAc4
        let host = parse("Fuc(a1-2)Gal(b1-4)GlcNAc");
        let embedding = host.find_embedding(&parse("Gal(b1-4)GlcNAc"), &MatchMode::Exact).unwrap();
        let pairs: Vec<_> = embedding.iter().map(|(m, h)| (m.index(), h.index())).collect();
        assert_eq!(pairs, [(0, 2), (1, 3), (2, 4)]);
    }
}
