use log::{info, warn};
use markov_core::model::exclusions::{ExclusionKind, Exclusions};
use markov_core::model::scope::IngestScopes;
use markov_core::{ChainConfig, GenerationError, MarkovEngine, Scope};

const COMMUNITY: u64 = 1;
const AUTHOR: u64 = 42;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Keep the chain in memory; use `MarkovEngine::open(path, config)` to persist it
    let engine = MarkovEngine::in_memory(ChainConfig::default());

    // Exclusion lists are owned by the caller and passed on every ingest
    let mut exclusions = Exclusions::default();

    // Messages containing a blacklisted string are skipped entirely
    exclusions.list_mut(ExclusionKind::Blacklist).add("password")?;

    // Ignored strings are cut out before tokenization
    exclusions.list_mut(ExclusionKind::Ignore).add("!quote ")?;

    // Empty strings are rejected
    match exclusions.list_mut(ExclusionKind::Ignore).add("") {
        Ok(_) => warn!("Should not happen"),
        Err(e) => info!("Rejected exclusion: {e}"),
    }

    // Import every line of the corpus as a message of one author
    let scopes = IngestScopes::new(COMMUNITY, AUTHOR);
    let imported = engine.import_corpus("./data/corpus.txt", scopes, &exclusions)?;
    info!("Imported {imported} lines");

    // Single messages go through `ingest`, which reports whether they were used
    for message in ["!quote hello there, friend!", "my password is hunter2"] {
        let processed = engine.ingest(message, COMMUNITY, 7, &exclusions)?;
        info!("Processed {message:?}: {processed}");
    }

    // An author without data yields an empty corpus, not a failure
    match engine.generate(Scope::Author(COMMUNITY, 1234)) {
        Err(e @ GenerationError::EmptyCorpus(_)) => println!("{}", e.user_message()),
        other => warn!("Unexpected: {other:?}"),
    }

    // Generate 10 lines for the community, then 10 for the author
    for scope in [scopes.community_scope(), scopes.author_scope()] {
        for i in 0..10 {
            println!("Generated line {} ({scope}): {}", i + 1, engine.generate(scope)?);
        }
    }

    // Drop everything recorded for the community
    engine.erase_scope_data(COMMUNITY)?;
    let empty = engine.store().scope_is_empty(&scopes.community_scope())?;
    info!("Empty after erase: {empty}");

    Ok(())
}
