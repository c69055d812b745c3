use tracing::{debug, warn};

use crate::{Error, Glycan, Result};

// Public API ==========================================================================================================

impl<'r> Glycan<'r> {
    /// Checks that the glycan is made of a main component and exactly one floating component
    pub fn validate_floating(&self) -> Result<()> {
        let components = self.components().len();
        if components == 2 {
            Ok(())
        } else {
            Err(Error::PreconditionViolation {
                floating: components.saturating_sub(1),
            })
        }
    }

    /// Every glycan that could result from attaching the floating component to a non-reducing end of the main one
    ///
    /// The main component is the one holding the anchor. Without a floating component there is nothing to attach,
    /// and if there are several, only the first is attached while the rest are carried along unchanged.
    #[must_use]
    pub fn enumerate_topologies(&self) -> Vec<Self> {
        if let Err(error) = self.validate_floating() {
            warn!(%error, "enumerating topologies of a glycan with the wrong number of components");
        }

        let Some(anchor) = self.anchor() else {
            return Vec::new();
        };
        let components = self.components();
        let (Some(main), Some(floating)) = (
            components.iter().find(|c| c.contains(&anchor)),
            components.iter().find(|c| !c.contains(&anchor)),
        ) else {
            return Vec::new();
        };
        // NOTE: Components are sorted, so this is the highest id of the floating component
        let Some(&floating_root) = floating.last() else {
            return Vec::new();
        };

        let topologies: Vec<_> = main
            .iter()
            .copied()
            .filter(|&node| node != anchor && self.degree(node) == 1)
            .map(|attachment| {
                let order: Vec<_> = self
                    .node_ids()
                    .filter(|node| !floating.contains(node))
                    .flat_map(|node| {
                        let block = if node == attachment { floating.as_slice() } else { &[] };
                        block.iter().copied().chain([node])
                    })
                    .collect();
                self.rebuild(&order, &[(floating_root, attachment)])
            })
            .collect();

        debug!(candidates = topologies.len(), "enumerated floating topologies");
        topologies
    }

    /// The `references` isomorphic to at least one of this glycan's possible topologies
    #[must_use]
    pub fn topology_matches_any<'g, 'x>(&self, references: &'g [Glycan<'x>]) -> Vec<&'g Glycan<'x>> {
        let topologies = self.enumerate_topologies();
        references
            .iter()
            .filter(|reference| topologies.iter().any(|t| t.equals(reference)))
            .collect()
    }
}
