//! A registry of glycoletters: the monosaccharide and linkage tokens of IUPAC-condensed glycan notation

mod errors;
pub mod registry;
#[cfg(test)]
mod testing_tools;

// External Crate Imports
use derive_more::Display;

pub use errors::{LookupError, Result};
pub use registry::Registry;

// NOTE: Ids are handed out in the order glycoletters appear in the registry file (units first, then linkages), so
// the same file always produces the same ids
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct GlycoletterId(u32);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum TokenKind {
    #[display("monosaccharide")]
    Unit,
    #[display("linkage")]
    Linkage,
}

/// A borrowed view of a single registry entry
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display("{token}")]
pub struct Glycoletter<'r> {
    id: GlycoletterId,
    token: &'r str,
    name: &'r str,
    kind: TokenKind,
    wildcard: bool,
}

impl GlycoletterId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl<'r> Glycoletter<'r> {
    #[must_use]
    pub const fn id(&self) -> GlycoletterId {
        self.id
    }

    #[must_use]
    pub const fn token(&self) -> &'r str {
        self.token
    }

    #[must_use]
    pub const fn name(&self) -> &'r str {
        self.name
    }

    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self.kind, TokenKind::Unit)
    }

    #[must_use]
    pub const fn is_linkage(&self) -> bool {
        matches!(self.kind, TokenKind::Linkage)
    }

    /// Wildcards (like `Hex` or `?1-?`) stand in for a whole family of more specific glycoletters
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

/// Characters that may appear inside a single notation token
#[must_use]
pub const fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '?' | '-' | ',' | '/' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_chars() {
        for c in ['G', 'a', '4', '?', '-', ',', '/', '_'] {
            assert!(is_token_char(c), "{c:?}");
        }
        for c in ['(', ')', '[', ']', '{', '}', ' ', 'é', '\n'] {
            assert!(!is_token_char(c), "{c:?}");
        }
    }

    #[test]
    fn display_kinds() {
        assert_eq!(TokenKind::Unit.to_string(), "monosaccharide");
        assert_eq!(TokenKind::Linkage.to_string(), "linkage");
        assert_eq!(GlycoletterId(7).to_string(), "7");
    }
}
