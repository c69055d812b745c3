//! Responsible for parsing IUPAC-condensed glycan notation into graphs, and for comparing, matching, and writing those
//! graphs back out as notation

mod builder;
mod common_subgraph;
mod errors;
mod graph;
mod matcher;
mod parser;
mod reference;
mod serializer;
#[cfg(test)]
mod testing_tools;
mod topology;

// External Crate Imports
use miette::Diagnostic;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use thiserror::Error;

// Local Crate Imports
use builder::Build;
use errors::final_parser;
use parser::glycan;

pub use errors::{GlycanErrorKind, LabeledError};
pub use glycoletters::{Glycoletter, GlycoletterId, LookupError, Registry, TokenKind};
pub use matcher::{Embedding, MatchMode, Wildcards};
pub use reference::{GlycanTable, ReferenceTable};
pub use serializer::TopologyError;

/// Node ids follow the order glycoletters appear in the notation, so node 0 is always the leftmost token
pub type NodeId = NodeIndex;

/// An undirected graph of alternating monosaccharides and linkages
#[derive(Clone, Debug)]
pub struct Glycan<'r> {
    registry: &'r Registry,
    graph: StableUnGraph<Node<'r>, ()>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node<'r> {
    glycoletter: Glycoletter<'r>,
    termini: TerminalState,
}

/// Where a node sits in its glycan, used by positional matching
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum TerminalState {
    #[default]
    Unset,
    Terminal,
    Internal,
    Flexible,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ParseOptions {
    /// Accept notations whose last token is a linkage, like the motif `Fuc(a1-2)`
    pub allow_open_end: bool,
    pub termini: Termini,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub enum Termini {
    #[default]
    Ignore,
    /// Derive each node's state from its degree
    Calculate,
    /// One state per node, in node id order
    Provided(Vec<TerminalState>),
}

// ===

#[derive(Clone, Debug, Error, Diagnostic)]
pub enum Error {
    #[diagnostic(transparent)]
    #[error(transparent)]
    ParseError(#[from] LabeledError),

    #[diagnostic(transparent)]
    #[error(transparent)]
    LookupError(#[from] LookupError),

    #[diagnostic(transparent)]
    #[error(transparent)]
    NonSerializableTopology(#[from] TopologyError),

    #[error("expected a glycan with exactly one floating component, but found {floating}")]
    #[diagnostic(help(
        "wrap a single open-ended fragment in braces before the main chain, like {{Fuc(a1-2)}}Gal(b1-4)GlcNAc"
    ))]
    PreconditionViolation { floating: usize },

    #[error("{provided} terminal states were provided, but the glycan has {nodes} glycoletters")]
    TerminiMismatch { provided: usize, nodes: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl<'r> Glycan<'r> {
    pub fn parse(registry: &'r Registry, notation: impl AsRef<str>) -> Result<Self> {
        Self::parse_with(registry, notation, &ParseOptions::default())
    }

    pub fn parse_with(
        registry: &'r Registry,
        notation: impl AsRef<str>,
        options: &ParseOptions,
    ) -> Result<Self> {
        let parsed = final_parser(glycan(registry, options.allow_open_end))(notation.as_ref())?;

        let mut glycan = Self::new(registry);
        parsed.build(&mut glycan);

        match &options.termini {
            Termini::Ignore => Ok(glycan),
            Termini::Calculate => {
                glycan.annotate_termini();
                Ok(glycan)
            }
            Termini::Provided(states) => glycan.with_termini(states),
        }
    }
}

/// Splits a notation into its glycoletters, in the order they were written
pub fn tokenize<'r>(registry: &'r Registry, notation: impl AsRef<str>) -> Result<Vec<Glycoletter<'r>>> {
    let options = ParseOptions {
        allow_open_end: true,
        ..ParseOptions::default()
    };
    let glycan = Glycan::parse_with(registry, notation, &options)?;
    Ok(glycan.labels().collect())
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use once_cell::sync::Lazy;

    use super::*;
    use crate::testing_tools::assert_error_renders;

    static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

    #[test]
    fn tokenize_in_written_order() {
        let tokens = tokenize(&REGISTRY, "Fuc(a1-2)[GalNAc(a1-3)]Gal(b1-4)GlcNAc").unwrap();
        let tokens = tokens.iter().map(Glycoletter::token).join(" ");
        assert_eq!(tokens, "Fuc a1-2 GalNAc a1-3 Gal b1-4 GlcNAc");
    }

    #[test]
    fn tokenize_open_ended_motifs() {
        let tokens = tokenize(&REGISTRY, "Neu5Ac(a2-3)").unwrap();
        let kinds: Vec<_> = tokens.iter().map(Glycoletter::kind).collect();
        assert_eq!(kinds, [TokenKind::Unit, TokenKind::Linkage]);
    }

    #[test]
    fn tokenize_unknown_token() {
        let error = tokenize(&REGISTRY, "Gal(b1-4)Blob").unwrap_err();
        assert!(matches!(error, Error::ParseError(_)));
    }

    #[test]
    fn rendered_parse_errors() {
        assert_error_renders!(
            Glycan::parse(&REGISTRY, "Gal(b1-4)Blob"),
            "Gal(b1-4)Blob",
            "unknown glycoletter",
            "\"Blob\" could not be found",
            "add a new entry to the glycoletter registry"
        );
        assert_error_renders!(
            Glycan::parse(&REGISTRY, "Gal(b1-4)[Fuc(a1-3)GlcNAc"),
            "expected ']'",
            "forgotten to close an earlier '[' bracket"
        );
        assert_error_renders!(
            Glycan::parse(&REGISTRY, "Gal(b1-4)[Fuc(a1-3)]"),
            "expected a monosaccharide, like Gal or GlcNAc"
        );
        assert_error_renders!(
            Glycan::parse(&REGISTRY, "Fuc(a1-2)"),
            "missing monosaccharide",
            "can only be parsed when open ends are allowed"
        );
    }

    #[test]
    fn calculated_termini() {
        let options = ParseOptions {
            termini: Termini::Calculate,
            ..ParseOptions::default()
        };
        let glycan = Glycan::parse_with(&REGISTRY, "Fuc(a1-2)Gal(b1-4)GlcNAc", &options).unwrap();
        let states: Vec<_> = glycan.nodes().map(|(_, n)| n.termini()).collect();
        assert_eq!(
            states,
            [
                TerminalState::Terminal,
                TerminalState::Internal,
                TerminalState::Internal,
                TerminalState::Internal,
                TerminalState::Terminal
            ]
        );
    }

    #[test]
    fn provided_termini() {
        use TerminalState::{Flexible, Internal, Terminal};

        let options = ParseOptions {
            termini: Termini::Provided(vec![Flexible, Internal, Terminal]),
            ..ParseOptions::default()
        };
        let glycan = Glycan::parse_with(&REGISTRY, "Gal(b1-4)GlcNAc", &options).unwrap();
        let states: Vec<_> = glycan.nodes().map(|(_, n)| n.termini()).collect();
        assert_eq!(states, [Flexible, Internal, Terminal]);

        let options = ParseOptions {
            termini: Termini::Provided(vec![Flexible, Internal]),
            ..ParseOptions::default()
        };
        let error = Glycan::parse_with(&REGISTRY, "Gal(b1-4)GlcNAc", &options).unwrap_err();
        assert!(matches!(
            error,
            Error::TerminiMismatch {
                provided: 2,
                nodes: 3
            }
        ));
    }

    #[test]
    fn ignored_termini_stay_unset() {
        let glycan = Glycan::parse(&REGISTRY, "Gal(b1-4)GlcNAc").unwrap();
        assert!(glycan.nodes().all(|(_, n)| n.termini() == TerminalState::Unset));
    }
}
