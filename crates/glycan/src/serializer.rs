use std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
};

use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::{Glycan, NodeId, ParseOptions, ReferenceTable, Result};

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum TopologyError {
    #[error("an empty glycan has no notation")]
    Empty,

    #[error("the glycan is split into {0} disconnected components")]
    #[diagnostic(help("a notation can only describe fragments of unknown position when they're written in braces"))]
    Disconnected(usize),

    #[error("the glycan contains a cycle")]
    Cyclic,

    #[error("{parent} is bonded directly to {child}, but monosaccharides and linkages must alternate")]
    BrokenAlternation { parent: String, child: String },

    #[error("the linkage {0} has more than one monosaccharide on its non-reducing side")]
    OverloadedLinkage(String),

    #[error("the linkage {0} dangles from the non-reducing end of the glycan")]
    #[diagnostic(help("only the glycoletter at the reducing end of a motif may be a bare linkage"))]
    DanglingLinkage(String),
}

type TopologyResult<T> = std::result::Result<T, TopologyError>;

// Public API ==========================================================================================================

impl Glycan<'_> {
    /// Writes the glycan in IUPAC-condensed notation, rooted at its anchor
    pub fn to_notation(&self) -> Result<String> {
        let components = self.components();
        match components.as_slice() {
            [] => Err(TopologyError::Empty.into()),
            [component] => Ok(self.component_notation(component)?),
            _ => Err(TopologyError::Disconnected(components.len()).into()),
        }
    }

    /// Like [`Glycan::to_notation`], but asks `table` for a stored notation when the graph can't be written out
    pub fn to_notation_or_lookup(&self, table: &dyn ReferenceTable) -> Result<String> {
        match self.to_notation() {
            Err(crate::Error::NonSerializableTopology(error)) => {
                debug!(%error, "falling back to the reference table");
                table
                    .lookup(self.node_count(), self)
                    .ok_or_else(|| error.into())
            }
            result => result,
        }
    }

    /// Serializes, re-parses, and serializes again, only returning a notation that survives the trip unchanged
    #[must_use]
    pub fn try_string_conversion(&self) -> Option<String> {
        let notation = self.to_notation().ok()?;
        let options = ParseOptions {
            allow_open_end: true,
            ..ParseOptions::default()
        };
        let reparsed = Glycan::parse_with(self.registry(), &notation, &options).ok()?;
        (reparsed.to_notation().ok()? == notation).then_some(notation)
    }

    /// Every notation of this glycan that can be reached by reordering the branches at each branch point
    pub fn isomorphs(&self) -> Result<Vec<String>> {
        let components = self.components();
        let component = match components.as_slice() {
            [] => return Err(TopologyError::Empty.into()),
            [component] => component,
            _ => return Err(TopologyError::Disconnected(components.len()).into()),
        };

        let root = self.tree_root(component)?;
        let mut notations = self.notation_variants(root, None)?;
        notations.sort_unstable();
        notations.dedup();
        Ok(notations)
    }

    /// Every `Unit(linkage)Unit` fragment, oriented towards the reducing end of each component
    #[must_use]
    pub fn disaccharides(&self) -> Vec<String> {
        let parents = self.parents();
        self.nodes()
            .filter(|(_, node)| node.glycoletter().is_linkage())
            .filter_map(|(linkage, node)| {
                let parent = *parents.get(&linkage)?;
                let acceptor = self.node(parent)?.glycoletter();
                let donors = self.children(linkage, Some(parent));
                let fragments = donors.into_iter().filter_map(move |donor| {
                    let donor = self.node(donor)?.glycoletter();
                    (donor.is_unit() && acceptor.is_unit())
                        .then(|| format!("{donor}({})", node.glycoletter()) + acceptor.token())
                });
                Some(fragments)
            })
            .flatten()
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

/// Floating fragments are written in braces before the main chain. Glycans that can't be written at all show the
/// reason instead.
impl Display for Glycan<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let components = self.components();
        let anchor = self.anchor();
        let (main, floating): (Vec<_>, Vec<_>) = components
            .iter()
            .partition(|c| anchor.is_some_and(|a| c.contains(&a)));

        let notation: TopologyResult<String> = floating
            .into_iter()
            .map(|c| Ok(format!("{{{}}}", self.component_notation(c)?)))
            .chain(main.into_iter().map(|c| self.component_notation(c)))
            .collect();

        match notation {
            Ok(notation) => write!(f, "{notation}"),
            Err(error) => write!(f, "<{error}>"),
        }
    }
}

// Private Helper Functions ============================================================================================

impl Glycan<'_> {
    fn component_notation(&self, component: &[NodeId]) -> TopologyResult<String> {
        let root = self.tree_root(component)?;
        let mut notation = String::new();
        self.write_notation(root, None, &mut notation)?;
        Ok(notation)
    }

    fn tree_root(&self, component: &[NodeId]) -> TopologyResult<NodeId> {
        let root = component.iter().max().copied().ok_or(TopologyError::Empty)?;
        let edges: usize = component.iter().map(|&n| self.degree(n)).sum::<usize>() / 2;
        if edges == component.len() - 1 {
            Ok(root)
        } else {
            Err(TopologyError::Cyclic)
        }
    }

    fn children(&self, node: NodeId, parent: Option<NodeId>) -> Vec<NodeId> {
        let mut children = self.neighbors(node);
        children.retain(|&n| Some(n) != parent);
        children
    }

    // NOTE: Checks alternation and linkage fan-out, returning the children of `node` in ascending id order
    fn checked_children(&self, node: NodeId, parent: Option<NodeId>) -> TopologyResult<Vec<NodeId>> {
        let glycoletter = self.graph[node].glycoletter;
        let children = self.children(node, parent);

        for &child in &children {
            let child = self.graph[child].glycoletter;
            if child.kind() == glycoletter.kind() {
                return Err(TopologyError::BrokenAlternation {
                    parent: glycoletter.to_string(),
                    child: child.to_string(),
                });
            }
        }

        if glycoletter.is_linkage() {
            match children.len() {
                0 if parent.is_some() => return Err(TopologyError::DanglingLinkage(glycoletter.to_string())),
                0 | 1 => (),
                _ => return Err(TopologyError::OverloadedLinkage(glycoletter.to_string())),
            }
        }

        Ok(children)
    }

    fn write_notation(&self, node: NodeId, parent: Option<NodeId>, out: &mut String) -> TopologyResult<()> {
        let glycoletter = self.graph[node].glycoletter;
        let children = self.checked_children(node, parent)?;

        if glycoletter.is_linkage() {
            if let Some(&child) = children.first() {
                self.write_notation(child, Some(node), out)?;
            }
            out.push('(');
            out.push_str(glycoletter.token());
            out.push(')');
        } else {
            if let Some((&main_chain, branches)) = children.split_first() {
                self.write_notation(main_chain, Some(node), out)?;
                for &branch in branches {
                    out.push('[');
                    self.write_notation(branch, Some(node), out)?;
                    out.push(']');
                }
            }
            out.push_str(glycoletter.token());
        }

        Ok(())
    }

    fn notation_variants(&self, node: NodeId, parent: Option<NodeId>) -> TopologyResult<Vec<String>> {
        let glycoletter = self.graph[node].glycoletter;
        let children = self.checked_children(node, parent)?;
        let child_variants: Vec<Vec<String>> = children
            .iter()
            .map(|&child| self.notation_variants(child, Some(node)))
            .collect::<TopologyResult<_>>()?;

        if glycoletter.is_linkage() {
            let prefixes = child_variants.into_iter().next().unwrap_or_else(|| vec![String::new()]);
            return Ok(prefixes.into_iter().map(|p| format!("{p}({glycoletter})")).collect());
        }

        if child_variants.is_empty() {
            return Ok(vec![glycoletter.to_string()]);
        }

        let count = child_variants.len();
        let variants = (0..count)
            .permutations(count)
            .flat_map(|order| {
                order
                    .into_iter()
                    .map(|i| child_variants[i].iter())
                    .multi_cartesian_product()
                    .map(|parts| {
                        let mut variant = parts[0].clone();
                        for branch in &parts[1..] {
                            variant.push('[');
                            variant.push_str(branch);
                            variant.push(']');
                        }
                        variant + glycoletter.token()
                    })
            })
            .collect();
        Ok(variants)
    }

    // NOTE: Every node is mapped to its neighbour on the path towards the highest id of its component
    fn parents(&self) -> HashMap<NodeId, NodeId> {
        let mut parents = HashMap::new();
        for component in self.components() {
            let Some(&root) = component.last() else {
                continue;
            };
            let mut queue = VecDeque::from([root]);
            while let Some(node) = queue.pop_front() {
                for next in self.neighbors(node) {
                    if next != root && !parents.contains_key(&next) {
                        parents.insert(next, node);
                        queue.push_back(next);
                    }
                }
            }
        }
        parents
    }
}
