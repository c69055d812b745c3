use crate::{Glycan, ParseOptions, Registry, Result};

/// A source of known notations, consulted when a graph cannot be written out as notation directly
pub trait ReferenceTable {
    /// The notation of a reference glycan with `node_count` nodes that is isomorphic to `candidate`
    fn lookup(&self, node_count: usize, candidate: &Glycan<'_>) -> Option<String>;
}

/// A [`ReferenceTable`] over a list of notations, parsed once up front. Open-ended motifs, like `Fuc(a1-2)`, are
/// accepted.
#[derive(Clone, Debug)]
pub struct GlycanTable<'r> {
    entries: Vec<(String, Glycan<'r>)>,
}

impl<'r> GlycanTable<'r> {
    pub fn new(registry: &'r Registry, notations: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let options = ParseOptions {
            allow_open_end: true,
            ..ParseOptions::default()
        };
        let entries = notations
            .into_iter()
            .map(|notation| {
                let notation: String = notation.into();
                let glycan = Glycan::parse_with(registry, &notation, &options)?;
                Ok((notation, glycan))
            })
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceTable for GlycanTable<'_> {
    fn lookup(&self, node_count: usize, candidate: &Glycan<'_>) -> Option<String> {
        self.entries
            .iter()
            .filter(|(_, glycan)| glycan.node_count() == node_count)
            .find(|(_, glycan)| glycan.equals(candidate))
            .map(|(notation, _)| notation.clone())
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;
    use crate::Error;

    static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

    #[test]
    fn lookup_by_isomorphism() {
        let table = GlycanTable::new(&REGISTRY, ["Gal(b1-4)GlcNAc", "Fuc(a1-2)Gal(b1-4)GlcNAc"]).unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());

        let candidate = Glycan::parse(&REGISTRY, "Gal(b1-4)GlcNAc").unwrap();
        assert_eq!(table.lookup(3, &candidate).as_deref(), Some("Gal(b1-4)GlcNAc"));
        // The node count must agree too
        assert_eq!(table.lookup(5, &candidate), None);

        let unknown = Glycan::parse(&REGISTRY, "Gal(b1-3)GlcNAc").unwrap();
        assert_eq!(table.lookup(3, &unknown), None);

        let table = GlycanTable::new(&REGISTRY, ["Fuc(a1-2)"]).unwrap();
        let options = ParseOptions {
            allow_open_end: true,
            ..ParseOptions::default()
        };
        let candidate = Glycan::parse_with(&REGISTRY, "Fuc(a1-2)", &options).unwrap();
        assert_eq!(table.lookup(2, &candidate).as_deref(), Some("Fuc(a1-2)"));
    }

    #[test]
    fn invalid_references() {
        let error = GlycanTable::new(&REGISTRY, ["Gal(b1-4)GlcNAc", "Gal(b1-4"]).unwrap_err();
        assert!(matches!(error, Error::ParseError(_)));
        assert!(GlycanTable::new(&REGISTRY, Vec::<String>::new()).unwrap().is_empty());
    }
}
