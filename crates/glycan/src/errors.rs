use std::fmt;

use glycoletters::LookupError;
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::{
    Err, Finish, IResult, Parser,
    combinator::all_consuming,
    error::{self, ErrorKind},
};
use thiserror::Error;

pub type ParseResult<'s, O> = IResult<&'s str, O, ParseError<'s>>;

// Final Errors ========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{kind}")]
pub struct LabeledError {
    notation: String,
    span: SourceSpan,
    kind: GlycanErrorKind,
}

impl LabeledError {
    #[must_use]
    pub const fn kind(&self) -> &GlycanErrorKind {
        &self.kind
    }

    #[must_use]
    pub const fn span(&self) -> SourceSpan {
        self.span
    }
}

impl Diagnostic for LabeledError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.notation)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.kind.label()?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label.to_owned()),
            self.span,
        ))))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum GlycanErrorKind {
    #[error("expected a monosaccharide, like Gal or GlcNAc")]
    ExpectedUnit,

    #[error("expected a linkage, like b1-4 or a2-6")]
    ExpectedLinkage,

    #[diagnostic(help("linkages are written between parentheses, like Gal(b1-4)GlcNAc"))]
    #[error("expected a ')' to close the linkage")]
    ExpectedLinkageEnd,

    #[diagnostic(help("you've probably forgotten to close an earlier '[' bracket"))]
    #[error("expected a ']' to close the branch")]
    ExpectedBranchEnd,

    #[diagnostic(help("you've probably forgotten to close an earlier '{{' brace"))]
    #[error("expected a '}}' to close the floating fragment")]
    ExpectedFloatingEnd,

    #[diagnostic(help(
        "branches must end with the linkage that attaches them, like Gal(b1-4)[Fuc(a1-3)]GlcNAc"
    ))]
    #[error("branch does not end with a linkage")]
    ClosedBranch,

    #[diagnostic(help("remove the bracket, or add its opening partner earlier in the notation"))]
    #[error("found a closing bracket without a matching opening one")]
    UnmatchedClosing,

    #[diagnostic(help(
        "notations ending in a linkage describe motifs, and can only be parsed when open ends are allowed"
    ))]
    #[error("the glycan ends with a linkage instead of a monosaccharide")]
    UnexpectedOpenEnd,

    #[diagnostic(transparent)]
    #[error(transparent)]
    LookupError(LookupError),

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help(
        "check the unparsed region for errors, or remove it from the rest of the glycan"
    ))]
    #[error("could not interpret the full input as a valid glycan")]
    Incomplete,
}

impl GlycanErrorKind {
    const fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::ExpectedUnit => "expected a monosaccharide",
            Self::ExpectedLinkage => "expected a linkage",
            Self::ExpectedLinkageEnd => "expected ')'",
            Self::ExpectedBranchEnd => "expected ']'",
            Self::ExpectedFloatingEnd => "expected '}'",
            Self::ClosedBranch => "this branch",
            Self::UnmatchedClosing => "unmatched bracket",
            Self::UnexpectedOpenEnd => "missing monosaccharide",
            Self::LookupError(LookupError::UnknownToken { .. }) => "unknown glycoletter",
            Self::LookupError(LookupError::WrongKind { .. }) => "wrong kind of glycoletter",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        })
    }
}

impl From<ErrorKind> for GlycanErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}

// Intermediate Errors =================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseError<'s> {
    input: &'s str,
    length: usize,
    kind: GlycanErrorKind,
}

impl<'s> ParseError<'s> {
    pub const fn new(input: &'s str, kind: GlycanErrorKind) -> Self {
        Self::with_length(input, 0, kind)
    }

    pub const fn with_length(input: &'s str, length: usize, kind: GlycanErrorKind) -> Self {
        Self {
            input,
            length,
            kind,
        }
    }

    #[cfg(test)]
    pub const fn kind(&self) -> &GlycanErrorKind {
        &self.kind
    }

    // NOTE: Every parser only ever hands on suffixes of the original input, so the start of the span is just the
    // difference in length between the two
    fn into_labeled(self, notation: &str) -> LabeledError {
        let start = notation.len() - self.input.len();
        // NOTE: The additional space is added so that Diagnostic labels can point to the end of an input
        LabeledError {
            notation: format!("{notation} "),
            span: SourceSpan::from(start..start + self.length),
            kind: self.kind,
        }
    }
}

impl<'s> error::ParseError<&'s str> for ParseError<'s> {
    fn from_error_kind(input: &'s str, kind: ErrorKind) -> Self {
        Self::new(input, kind.into())
    }

    fn append(_input: &'s str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // NOTE: Between alternatives, report whichever got furthest into the input
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

// Combinators =========================================================================================================

pub fn final_parser<'s, O, P>(mut parser: P) -> impl FnMut(&'s str) -> Result<O, LabeledError>
where
    P: Parser<&'s str, O, ParseError<'s>>,
{
    move |input| {
        all_consuming(|i| parser.parse(i))(input)
            .finish()
            .map(|(_, o)| o)
            .map_err(|e| e.into_labeled(input))
    }
}

/// Replaces any recoverable error from `parser` with one of `kind`, pointing at the start of the input
pub fn expect<'s, O, P>(mut parser: P, kind: GlycanErrorKind) -> impl FnMut(&'s str) -> ParseResult<'s, O>
where
    P: Parser<&'s str, O, ParseError<'s>>,
{
    move |input| match parser.parse(input) {
        Err(Err::Error(_)) => Err(Err::Error(ParseError::new(input, kind.clone()))),
        result => result,
    }
}

/// Looks up the output of `parser`; failed lookups are fatal and label everything `parser` consumed
pub fn map_res<'s, O1, O2, P, F>(mut parser: P, mut f: F) -> impl FnMut(&'s str) -> ParseResult<'s, O2>
where
    P: Parser<&'s str, O1, ParseError<'s>>,
    F: FnMut(O1) -> Result<O2, LookupError>,
{
    move |input| {
        let (rest, o1) = parser.parse(input)?;
        let length = input.len() - rest.len();
        match f(o1) {
            Ok(o2) => Ok((rest, o2)),
            Err(e) => Err(Err::Failure(ParseError::with_length(
                input,
                length,
                GlycanErrorKind::LookupError(e),
            ))),
        }
    }
}
