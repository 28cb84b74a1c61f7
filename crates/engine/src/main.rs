//! Sheetkeeper - Main entry point.
//!
//! Loads the save file, recalculates every character and prints a summary.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetkeeper_domain::{
    Character, ReferenceCatalog, ResourceKind, StandardRules, StaticCatalog,
};
use sheetkeeper_engine::infrastructure::{
    catalog_file::load_catalog, clock::SystemClock, file_store::JsonFileStore,
};
use sheetkeeper_engine::{EditorConfig, EditorSession, SessionError};

fn main() -> anyhow::Result<()> {
    EditorConfig::load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetkeeper_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EditorConfig::from_env();

    tracing::info!(
        data_path = %config.data_path.display(),
        history_limit = config.history_limit,
        "Starting Sheetkeeper"
    );

    let catalog: Arc<dyn ReferenceCatalog> = match &config.catalog_path {
        Some(path) => Arc::new(
            load_catalog(path)
                .with_context(|| format!("loading catalog from {}", path.display()))?,
        ),
        None => Arc::new(StaticCatalog::builtin()),
    };

    let mut session = EditorSession::new(
        catalog,
        Arc::new(StandardRules::new()),
        Arc::new(JsonFileStore::new(&config.data_path)),
        Arc::new(SystemClock::new()),
        config.history_limit,
    );

    match session.load_from_store() {
        Ok(_) => {}
        Err(SessionError::Store(e)) if e.is_not_found() => {
            tracing::info!(path = %config.data_path.display(), "No save file yet, nothing to show");
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("loading {}", config.data_path.display()));
        }
    }

    for index in 0..session.characters().len() {
        session.select(index)?;
        print_summary(&session)?;
    }
    Ok(())
}

fn print_summary(session: &EditorSession) -> anyhow::Result<()> {
    let Some(character) = session.active() else {
        return Ok(());
    };
    println!("{}", headline(character));

    let stats: Vec<String> = character
        .stats()
        .iter()
        .map(|(name, stat)| format!("{} {}", name.abbreviation(), stat.total()))
        .collect();
    println!("  {}", stats.join("  "));

    let pools: Vec<String> = ResourceKind::ALL
        .iter()
        .map(|kind| {
            let pool = character.resource(*kind);
            format!("{} {}/{}", kind, pool.current(), pool.max())
        })
        .collect();
    println!("  {}  AC {}", pools.join("  "), character.armor_class());

    for (index, weapon) in character.weapons().iter().enumerate() {
        println!("  {}: {}", weapon.name, session.weapon_damage(index)?);
    }
    for warning in session.level_warnings() {
        println!("  ! {}", warning);
    }
    Ok(())
}

fn headline(character: &Character) -> String {
    let race = if character.race().is_empty() {
        "no race"
    } else {
        character.race()
    };
    let classes = if character.classes().is_empty() {
        "no class".to_string()
    } else {
        character.classes().join("/")
    };
    format!(
        "{} - level {} {} {}",
        character.name(),
        character.level(),
        race,
        classes
    )
}
