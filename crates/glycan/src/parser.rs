use glycoletters::{Glycoletter, Registry, is_token_char};
use nom::{
    Err,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{cut, map, opt},
    multi::many0,
    sequence::{pair, preceded, terminated},
};

use crate::errors::{GlycanErrorKind, ParseError, ParseResult, expect, map_res};

// Syntax Tree =========================================================================================================

#[derive(Clone, Debug)]
pub struct Notation<'r> {
    pub floating: Vec<Chain<'r>>,
    pub main: Chain<'r>,
}

/// A run of glycoletters, written from the non-reducing end towards the reducing end
#[derive(Clone, Debug)]
pub struct Chain<'r> {
    pub links: Vec<Link<'r>>,
    // NOTE: `None` when the chain ends with a linkage
    pub reducing_end: Option<Residue<'r>>,
}

#[derive(Clone, Debug)]
pub struct Link<'r> {
    pub residue: Residue<'r>,
    pub linkage: Glycoletter<'r>,
}

#[derive(Clone, Debug)]
pub struct Residue<'r> {
    pub branches: Vec<Chain<'r>>,
    pub unit: Glycoletter<'r>,
}

// Grammar =============================================================================================================

/// Glycan = { Floating } , Chain ;
pub fn glycan<'r, 's>(
    registry: &'r Registry,
    allow_open_end: bool,
) -> impl FnMut(&'s str) -> ParseResult<'s, Notation<'r>> {
    move |i| {
        let fragments = many0(|i: &'s str| floating(registry, i));
        let (rest, (floating, main)) = pair(fragments, |i: &'s str| chain(registry, i))(i)?;

        if let Some(c) = rest.chars().next().filter(|c| matches!(c, ')' | ']' | '}')) {
            let error = ParseError::with_length(rest, c.len_utf8(), GlycanErrorKind::UnmatchedClosing);
            return Err(Err::Failure(error));
        }

        // NOTE: Branches are only parsed as part of a residue, so trailing ones are left behind when their unit is
        // missing
        if rest.starts_with('[') {
            let (after, _) = many0(|i: &'s str| branch(registry, i))(rest)?;
            return Err(Err::Failure(ParseError::new(after, GlycanErrorKind::ExpectedUnit)));
        }

        if main.reducing_end.is_none() && !allow_open_end && rest.is_empty() {
            return Err(Err::Failure(ParseError::new(rest, GlycanErrorKind::UnexpectedOpenEnd)));
        }

        Ok((rest, Notation { floating, main }))
    }
}

// NOTE: The functions below take their input directly (rather than returning a parser) so that the recursion
// between branches and residues has a nameable type

/// Floating = "{" , Chain , "}" ;
fn floating<'r, 's>(registry: &'r Registry, i: &'s str) -> ParseResult<'s, Chain<'r>> {
    let closing = expect(char('}'), GlycanErrorKind::ExpectedFloatingEnd);
    let body = terminated(|i: &'s str| chain(registry, i), closing);
    preceded(char('{'), cut(body))(i)
}

/// Chain = { Link } , [ Residue ] ;
fn chain<'r, 's>(registry: &'r Registry, i: &'s str) -> ParseResult<'s, Chain<'r>> {
    let links = many0(|i: &'s str| link(registry, i));
    let reducing_end = opt(|i: &'s str| residue(registry, i));
    let (rest, (links, reducing_end)) = pair(links, reducing_end)(i)?;

    if links.is_empty() && reducing_end.is_none() {
        return Err(Err::Error(ParseError::new(i, GlycanErrorKind::ExpectedUnit)));
    }

    Ok((rest, Chain { links, reducing_end }))
}

/// Link = Residue , Linkage ;
fn link<'r, 's>(registry: &'r Registry, i: &'s str) -> ParseResult<'s, Link<'r>> {
    let parser = pair(|i: &'s str| residue(registry, i), linkage(registry));
    map(parser, |(residue, linkage)| Link { residue, linkage })(i)
}

/// Residue = { Branch } , Unit ;
fn residue<'r, 's>(registry: &'r Registry, i: &'s str) -> ParseResult<'s, Residue<'r>> {
    let branches = many0(|i: &'s str| branch(registry, i));
    let parser = pair(branches, unit(registry));
    map(parser, |(branches, unit)| Residue { branches, unit })(i)
}

/// Branch = "[" , Chain (* ending in a Linkage *) , "]" ;
fn branch<'r, 's>(registry: &'r Registry, i: &'s str) -> ParseResult<'s, Chain<'r>> {
    let closing = expect(char(']'), GlycanErrorKind::ExpectedBranchEnd);
    let body = terminated(|i: &'s str| chain(registry, i), closing);
    let (rest, chain) = preceded(char('['), cut(body))(i)?;

    if chain.reducing_end.is_some() {
        let length = i.len() - rest.len();
        let error = ParseError::with_length(i, length, GlycanErrorKind::ClosedBranch);
        return Err(Err::Failure(error));
    }

    Ok((rest, chain))
}

// =

/// Unit = Token (* registered as a monosaccharide *) ;
fn unit<'r, 's>(registry: &'r Registry) -> impl FnMut(&'s str) -> ParseResult<'s, Glycoletter<'r>> {
    let parser = expect(token, GlycanErrorKind::ExpectedUnit);
    map_res(parser, |t| registry.unit(t))
}

/// Linkage = "(" , Token (* registered as a linkage *) , ")" ;
fn linkage<'r, 's>(registry: &'r Registry) -> impl FnMut(&'s str) -> ParseResult<'s, Glycoletter<'r>> {
    let token = map_res(expect(token, GlycanErrorKind::ExpectedLinkage), |t| registry.linkage(t));
    let closing = expect(char(')'), GlycanErrorKind::ExpectedLinkageEnd);
    preceded(char('('), cut(terminated(token, closing)))
}

/// Token = { letter | digit | "?" | "-" | "," | "/" | "_" }- ;
fn token(i: &str) -> ParseResult<&str> {
    take_while1(is_token_char)(i)
}
