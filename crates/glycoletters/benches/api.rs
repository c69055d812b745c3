use divan::{AllocProfiler, black_box};
use glycoletters::{Registry, registry::DEFAULT_KDL};
use once_cell::sync::Lazy;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const TOKENS: [&str; 6] = ["Gal", "GlcNAc", "b1-4", "Neu5Ac", "a2-6", "?1-?"];

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

fn main() {
    Lazy::force(&REGISTRY);
    divan::main();
}

#[divan::bench]
fn build_registry() -> Registry {
    Registry::new("glycoletter_database.kdl", DEFAULT_KDL).unwrap()
}

#[divan::bench]
fn lookup_tokens() {
    for token in TOKENS {
        black_box(REGISTRY.lookup(token).unwrap());
    }
}

#[divan::bench]
fn collect_wildcards() -> usize {
    REGISTRY.wildcards().count()
}
