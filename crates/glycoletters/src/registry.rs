// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use knus::{Decode, span::Span};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use thiserror::Error;

// Local Crate Imports
use crate::{Glycoletter, GlycoletterId, LookupError, TokenKind, errors, is_token_char};

// Public API ==========================================================================================================

pub const DEFAULT_KDL: &str = include_str!("../data/glycoletter_database.kdl");

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, GlycoletterId>,
}

impl Registry {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_registry: RegistryKdl = knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_registry
            .validate()
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    pub fn index_of(&self, token: &str) -> errors::Result<GlycoletterId> {
        self.index
            .get(token)
            .copied()
            .ok_or_else(|| LookupError::unknown_token(token))
    }

    pub fn lookup(&self, token: &str) -> errors::Result<Glycoletter<'_>> {
        let id = self.index_of(token)?;
        // NOTE: Every id in the index points at an existing entry
        Ok(self.view(id, &self.entries[id.index()]))
    }

    pub fn unit(&self, token: &str) -> errors::Result<Glycoletter<'_>> {
        self.lookup_kind(token, TokenKind::Unit)
    }

    pub fn linkage(&self, token: &str) -> errors::Result<Glycoletter<'_>> {
        self.lookup_kind(token, TokenKind::Linkage)
    }

    #[must_use]
    pub fn get(&self, id: GlycoletterId) -> Option<Glycoletter<'_>> {
        self.entries.get(id.index()).map(|entry| self.view(id, entry))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Glycoletter<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| self.view(GlycoletterId(Self::id_from(i)), entry))
    }

    pub fn wildcards(&self) -> impl Iterator<Item = Glycoletter<'_>> {
        self.iter().filter(Glycoletter::is_wildcard)
    }
}

// NOTE: The bundled registry is checked by the test-suite, so failing to parse it is a bug in this crate
impl Default for Registry {
    fn default() -> Self {
        Self::new("glycoletter_database.kdl", DEFAULT_KDL).unwrap()
    }
}

// Private Types =======================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
struct RegistryEntry {
    token: String,
    name: String,
    kind: TokenKind,
    wildcard: bool,
}

impl Registry {
    fn lookup_kind(&self, token: &str, expected: TokenKind) -> errors::Result<Glycoletter<'_>> {
        let glycoletter = self.lookup(token)?;
        if glycoletter.kind == expected {
            Ok(glycoletter)
        } else {
            Err(LookupError::wrong_kind(token, expected, glycoletter.kind))
        }
    }

    fn view<'r>(&'r self, id: GlycoletterId, entry: &'r RegistryEntry) -> Glycoletter<'r> {
        Glycoletter {
            id,
            token: &entry.token,
            name: &entry.name,
            kind: entry.kind,
            wildcard: entry.wildcard,
        }
    }

    // NOTE: Registries are small, hand-written files; anything that overflows a `u32` isn't worth a recoverable error
    #[allow(clippy::cast_possible_truncation)]
    const fn id_from(index: usize) -> u32 {
        index as u32
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct RegistryKdl {
    #[knus(child, unwrap(children))]
    units: Vec<GlycoletterKdl>,
    #[knus(child, unwrap(children))]
    linkages: Vec<GlycoletterKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct GlycoletterKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    token: String,
    #[knus(argument)]
    name: Option<String>,
    #[knus(property, default)]
    wildcard: bool,
}

// Registry Validation =================================================================================================

type RegistryResult<T> = std::result::Result<T, RegistryErrorKind>;

trait ValidateInto<T> {
    fn validate(self) -> RegistryResult<T>;
}

impl ValidateInto<Registry> for RegistryKdl {
    fn validate(self) -> RegistryResult<Registry> {
        let tagged_units = self.units.into_iter().map(|u| (TokenKind::Unit, u));
        let tagged_linkages = self.linkages.into_iter().map(|l| (TokenKind::Linkage, l));

        let mut seen_tokens = HashMap::new();
        let mut entries = Vec::new();
        for (kind, glycoletter) in tagged_units.chain(tagged_linkages) {
            let span = glycoletter.span;
            let entry = glycoletter.validate()?;
            let entry = RegistryEntry { kind, ..entry };

            match seen_tokens.entry(entry.token.clone()) {
                Entry::Occupied(e) => {
                    let (token, (first_defined_at, _)) = e.remove_entry();
                    return Err(RegistryErrorKind::DuplicateToken(first_defined_at, span, token));
                }
                Entry::Vacant(e) => e.insert((span, GlycoletterId(Registry::id_from(entries.len())))),
            };
            entries.push(entry);
        }

        let index = seen_tokens.into_iter().map(|(token, (_, id))| (token, id)).collect();
        Ok(Registry { entries, index })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<RegistryEntry> for GlycoletterKdl {
    fn validate(self) -> RegistryResult<RegistryEntry> {
        let invalid_chars: String = self.token.chars().filter(|&c| !is_token_char(c)).unique().collect();
        if !invalid_chars.is_empty() {
            return Err(RegistryErrorKind::InvalidToken(self.span, self.token, invalid_chars));
        }

        let name = self.name.unwrap_or_else(|| self.token.clone());
        Ok(RegistryEntry {
            token: self.token,
            name,
            // NOTE: Overwritten by the caller, which knows which section this node came from
            kind: TokenKind::Unit,
            wildcard: self.wildcard,
        })
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate glycoletter registry")]
struct RegistryError {
    kdl: NamedSource<String>,
    #[source]
    kind: RegistryErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for RegistryError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(
            self.kind
                .labels()
                .into_iter()
                .map(|(s, l)| LabeledSpan::new_with_span(Some(l.to_owned()), *s)),
        ))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum RegistryErrorKind {
    #[error("the glycoletter {2:?} has already been defined")]
    #[diagnostic(help(
        "every token must be unique across both the units and linkages sections"
    ))]
    DuplicateToken(Span, Span, String),

    #[error("the glycoletter {1:?} contains characters that can't appear in a notation: {2:?}")]
    #[diagnostic(help("tokens may only contain ASCII letters, digits, and the characters ?-,/_"))]
    InvalidToken(Span, String, String),
}

impl RegistryErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateToken(s1, s2, _) => vec![(s1, "first defined here"), (s2, "then again here")],
            Self::InvalidToken(s, _, _) => vec![(s, "invalid token")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> RegistryError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        RegistryError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================
