use crate::{
    Glycan, NodeId,
    parser::{Chain, Link, Notation, Residue},
};

// NOTE: Nodes are added in exactly the order their glycoletters were written, so node ids follow the notation from
// left to right. Branches are built before the residue they hang from for the same reason.
pub trait Build<'r> {
    type Into;

    fn build(self, glycan: &mut Glycan<'r>) -> Self::Into;
}

impl<'r> Build<'r> for Notation<'r> {
    type Into = ();

    fn build(self, glycan: &mut Glycan<'r>) {
        for fragment in self.floating {
            fragment.build(glycan);
        }
        self.main.build(glycan);
    }
}

impl<'r> Build<'r> for Chain<'r> {
    /// The rightmost node of the chain
    type Into = NodeId;

    fn build(self, glycan: &mut Glycan<'r>) -> NodeId {
        let mut pending_linkage = None;
        for link in self.links {
            let (unit, linkage) = link.build(glycan);
            if let Some(previous) = pending_linkage.replace(linkage) {
                glycan.connect(previous, unit);
            }
        }

        match (self.reducing_end, pending_linkage) {
            (Some(residue), previous) => {
                let unit = residue.build(glycan);
                if let Some(previous) = previous {
                    glycan.connect(previous, unit);
                }
                unit
            }
            (None, Some(linkage)) => linkage,
            // NOTE: The grammar never produces a chain without any glycoletters
            (None, None) => unreachable!("tried to build an empty chain"),
        }
    }
}

impl<'r> Build<'r> for Link<'r> {
    type Into = (NodeId, NodeId);

    fn build(self, glycan: &mut Glycan<'r>) -> Self::Into {
        let unit = self.residue.build(glycan);
        let linkage = glycan.add_glycoletter(self.linkage);
        glycan.connect(unit, linkage);
        (unit, linkage)
    }
}

impl<'r> Build<'r> for Residue<'r> {
    type Into = NodeId;

    fn build(self, glycan: &mut Glycan<'r>) -> NodeId {
        let branch_ends: Vec<_> = self.branches.into_iter().map(|b| b.build(glycan)).collect();
        let unit = glycan.add_glycoletter(self.unit);
        for branch_end in branch_ends {
            glycan.connect(branch_end, unit);
        }
        unit
    }
}
