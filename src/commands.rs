use glycan::{Glycan, MatchMode, ParseOptions, Registry, Termini, Wildcards};
use miette::Diagnostic;
use thiserror::Error;

const HELP: &str = "\
<glycan>                   show the glycoletters, bonds, and canonical notation of a glycan
:eq A ; B                  are A and B the same glycan?
:has HOST ; MOTIF          does HOST contain MOTIF?
:count HOST ; MOTIF        how many non-overlapping copies of MOTIF are in HOST?
:lcs A ; B                 the largest connected structure shared by A and B
:topologies G              every way the floating fragment of G could be attached
:isomorphs G               every way of writing G by reordering its branches
:help                      show this message

:eq, :has, and :count match glycoletters exactly, but accept a mode suffix: `.wild` lets wildcards like Hex or ?1-?
match anything, and `.pos` only matches motif ends against glycan ends (like :has.pos HOST ; MOTIF)
";

#[derive(Debug, Error, Diagnostic)]
pub enum CommandError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Glycan(#[from] glycan::Error),

    #[error("unknown command :{0}")]
    #[diagnostic(help("run :help for a list of commands"))]
    UnknownCommand(String),

    #[error(":{0} expects two glycans separated by a ';'")]
    #[diagnostic(help("for example, :{0} Gal(b1-4)GlcNAc ; Gal(b1-4)Glc"))]
    ExpectedPair(String),
}

pub type Result<T, E = CommandError> = std::result::Result<T, E>;

pub fn run(registry: &Registry, line: &str) -> Result<String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(describe(&parse(registry, line)?));
    };

    let (command, argument) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let (name, mode) = match command.split_once('.') {
        Some((name, "wild")) => (name, MatchMode::Wildcard(Wildcards::from_registry(registry))),
        Some((name, "pos")) => (name, MatchMode::Positional),
        Some(_) => return Err(CommandError::UnknownCommand(command.to_owned())),
        None => (command, MatchMode::Exact),
    };
    let argument = argument.trim();

    match name {
        "eq" => {
            let (a, b) = pair(registry, command, argument, &mode)?;
            Ok(format!("{}\n", a.equals_with(&b, &mode)))
        }
        "has" => {
            let (host, motif) = pair(registry, command, argument, &mode)?;
            Ok(format!("{}\n", host.contains(&motif, &mode)))
        }
        "count" => {
            let (host, motif) = pair(registry, command, argument, &mode)?;
            Ok(format!("{}\n", host.count(&motif, &mode)))
        }
        "lcs" if mode == MatchMode::Exact => {
            let (a, b) = pair(registry, command, argument, &mode)?;
            let common = a.largest_common_subgraph(&b, None)?;
            if common.is_empty() {
                Ok("nothing in common\n".to_owned())
            } else {
                Ok(format!("{common}\n"))
            }
        }
        "topologies" if mode == MatchMode::Exact => {
            let glycan = parse(registry, argument)?;
            glycan.validate_floating()?;
            Ok(lines(glycan.enumerate_topologies()))
        }
        "isomorphs" if mode == MatchMode::Exact => {
            let glycan = parse(registry, argument)?;
            Ok(lines(glycan.isomorphs()?))
        }
        "help" if argument.is_empty() => Ok(HELP.to_owned()),
        _ => Err(CommandError::UnknownCommand(command.to_owned())),
    }
}

fn parse<'r>(registry: &'r Registry, notation: &str) -> Result<Glycan<'r>> {
    parse_with_termini(registry, notation, Termini::Ignore)
}

fn parse_with_termini<'r>(registry: &'r Registry, notation: &str, termini: Termini) -> Result<Glycan<'r>> {
    let options = ParseOptions {
        allow_open_end: true,
        termini,
    };
    Ok(Glycan::parse_with(registry, notation.trim(), &options)?)
}

// NOTE: With positional matching, the second glycan is a motif whose ends must line up with the first's
fn pair<'r>(
    registry: &'r Registry,
    command: &str,
    argument: &str,
    mode: &MatchMode,
) -> Result<(Glycan<'r>, Glycan<'r>)> {
    let Some((first, second)) = argument.split_once(';') else {
        return Err(CommandError::ExpectedPair(command.to_owned()));
    };

    let termini = if *mode == MatchMode::Positional {
        Termini::Calculate
    } else {
        Termini::Ignore
    };
    Ok((parse(registry, first)?, parse_with_termini(registry, second, termini)?))
}

fn describe(glycan: &Glycan<'_>) -> String {
    let nodes: Vec<_> = glycan
        .nodes()
        .map(|(id, node)| format!("{}:{}", id.index(), node.glycoletter()))
        .collect();
    let edges: Vec<_> = glycan.edges().map(|(a, b)| format!("{}-{}", a.index(), b.index())).collect();
    format!(
        "Glycoletters: {}\nBonds: {}\nNotation: {glycan}\n",
        nodes.join(" "),
        edges.join(" ")
    )
}

fn lines(items: impl IntoIterator<Item = impl ToString>) -> String {
    items.into_iter().map(|item| item.to_string() + "\n").collect()
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;

    use super::*;

    static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

    fn run(line: &str) -> String {
        super::run(&REGISTRY, line).unwrap()
    }

    #[test]
    fn describe_glycans() {
        assert_snapshot!(run("Fuc(a1-2)[GalNAc(a1-3)]Gal"), @r"
        Glycoletters: 0:Fuc 1:a1-2 2:GalNAc 3:a1-3 4:Gal
        Bonds: 0-1 1-4 2-3 3-4
        Notation: Fuc(a1-2)[GalNAc(a1-3)]Gal
        ");
        assert_snapshot!(run("  {Fuc(a1-2)}Gal "), @r"
        Glycoletters: 0:Fuc 1:a1-2 2:Gal
        Bonds: 0-1
        Notation: {Fuc(a1-2)}Gal
        ");
    }

    #[test]
    fn comparisons() {
        assert_eq!(run(":eq Gal(b1-4)[Fuc(a1-3)]GlcNAc ; Fuc(a1-3)[Gal(b1-4)]GlcNAc"), "true\n");
        assert_eq!(run(":eq Gal(b1-4)GlcNAc ; Hex(b1-4)GlcNAc"), "false\n");
        assert_eq!(run(":eq.wild Gal(b1-4)GlcNAc ; Hex(b1-4)GlcNAc"), "true\n");
    }

    #[test]
    fn motif_searches() {
        let n_glycan = "Gal(b1-4)GlcNAc(b1-2)Man(a1-3)[Gal(b1-4)GlcNAc(b1-2)Man(a1-6)]Man(b1-4)GlcNAc(b1-4)GlcNAc";
        assert_eq!(run(&format!(":count {n_glycan} ; Gal(b1-4)GlcNAc")), "2\n");
        assert_eq!(run(&format!(":has {n_glycan} ; Neu5Ac(a2-3)Gal")), "false\n");
        assert_eq!(run(&format!(":has.wild {n_glycan} ; Hex(?1-?)HexNAc")), "true\n");
        // Gal ends the motif, but sits in the middle of the glycan
        assert_eq!(run(":has Fuc(a1-2)Gal(b1-4)GlcNAc ; Fuc(a1-2)Gal"), "true\n");
        assert_eq!(run(":has.pos Fuc(a1-2)Gal(b1-4)GlcNAc ; Fuc(a1-2)Gal"), "false\n");
        assert_eq!(run(":has.pos Fuc(a1-2)Gal(b1-4)GlcNAc ; Fuc(a1-2)Gal(b1-4)GlcNAc"), "true\n");
    }

    #[test]
    fn common_structures() {
        assert_eq!(run(":lcs Gal(b1-4)Glc ; Gal(b1-4)GlcNAc"), "Gal(b1-4)\n");
        assert_eq!(run(":lcs Gal ; Glc"), "nothing in common\n");
    }

    #[test]
    fn topologies_and_isomorphs() {
        assert_snapshot!(run(":topologies {Neu5Ac(a2-3)}Gal(b1-4)[Fuc(a1-3)]GlcNAc"), @r"
        Neu5Ac(a2-3)Gal(b1-4)[Fuc(a1-3)]GlcNAc
        Gal(b1-4)[Neu5Ac(a2-3)Fuc(a1-3)]GlcNAc
        ");
        assert_snapshot!(run(":isomorphs Fuc(a1-2)[GalNAc(a1-3)]Gal"), @r"
        Fuc(a1-2)[GalNAc(a1-3)]Gal
        GalNAc(a1-3)[Fuc(a1-2)]Gal
        ");
        assert!(run(":help").contains(":count HOST ; MOTIF"));
    }

    #[test]
    fn command_errors() {
        macro_rules! assert_error {
            ($line:literal, $pattern:pat) => {
                let error = super::run(&REGISTRY, $line).unwrap_err();
                assert!(matches!(error, $pattern), "{}: {error:?}", $line);
            };
        }
        assert_error!(":frobnicate Gal", CommandError::UnknownCommand(_));
        assert_error!(":lcs.wild Gal ; Gal", CommandError::UnknownCommand(_));
        assert_error!(":has.fast Gal ; Gal", CommandError::UnknownCommand(_));
        assert_error!(":has Gal(b1-4)GlcNAc", CommandError::ExpectedPair(_));
        assert_error!("Gal(b1-4)Blob", CommandError::Glycan(glycan::Error::ParseError(_)));
        assert_error!(
            ":topologies Gal(b1-4)GlcNAc",
            CommandError::Glycan(glycan::Error::PreconditionViolation { floating: 0 })
        );
    }
}
