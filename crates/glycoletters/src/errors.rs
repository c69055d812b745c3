use miette::Diagnostic;
use thiserror::Error;

use crate::TokenKind;

pub type Result<T, E = LookupError> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum LookupError {
    #[error("the glycoletter {token:?} could not be found in the supplied registry")]
    #[diagnostic(help("double-check for typos, or add a new entry to the glycoletter registry"))]
    UnknownToken { token: String },

    #[error("expected a {expected}, but {token:?} is registered as a {found}")]
    #[diagnostic(help(
        "monosaccharides and linkages must alternate, like Gal(b1-4)GlcNAc"
    ))]
    WrongKind {
        token: String,
        expected: TokenKind,
        found: TokenKind,
    },
}

impl LookupError {
    pub(crate) fn unknown_token(token: &str) -> Self {
        let token = token.to_owned();

        Self::UnknownToken { token }
    }

    pub(crate) fn wrong_kind(token: &str, expected: TokenKind, found: TokenKind) -> Self {
        let token = token.to_owned();

        Self::WrongKind {
            token,
            expected,
            found,
        }
    }
}
