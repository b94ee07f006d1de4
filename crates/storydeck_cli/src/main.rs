//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `storydeck_core` linkage without the host UI.
//! - Print a one-line summary per competency from the persisted store.
//!
//! Reads the database path from the first argument, then `STORYDECK_DB_PATH`,
//! then `<temp_dir>/storydeck.sqlite3`.

use std::path::PathBuf;
use storydeck_core::{SqliteBlobStorage, Store, StoreOptions};

const DB_PATH_ENV: &str = "STORYDECK_DB_PATH";
const DB_FILE_NAME: &str = "storydeck.sqlite3";

fn main() {
    println!("storydeck_core ping={}", storydeck_core::ping());
    println!("storydeck_core version={}", storydeck_core::core_version());

    let path = resolve_db_path(std::env::args().nth(1), std::env::var(DB_PATH_ENV).ok());
    println!("storydeck_db path={}", path.display());

    let storage = match SqliteBlobStorage::open(&path) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("failed to open {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    let store = Store::open(Some(storage), StoreOptions::default());
    let state = store.state();

    println!(
        "auto_save={} competencies={} cards={}",
        state.settings.auto_save,
        state.competencies.len(),
        state.card_count()
    );
    for competency in &state.competencies {
        println!(
            "{:<32} {:>10}  {}",
            competency.id.as_str(),
            competency.card_count_label(),
            competency.name
        );
    }
}

fn resolve_db_path(explicit: Option<String>, from_env: Option<String>) -> PathBuf {
    explicit
        .filter(|raw| !raw.trim().is_empty())
        .or(from_env)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path, DB_FILE_NAME};
    use std::path::PathBuf;

    #[test]
    fn argument_path_wins_over_env() {
        assert_eq!(
            resolve_db_path(
                Some(" /data/deck.db ".to_string()),
                Some("/env/deck.db".to_string())
            ),
            PathBuf::from("/data/deck.db")
        );
    }

    #[test]
    fn blank_argument_uses_env_path() {
        assert_eq!(
            resolve_db_path(Some("  ".to_string()), Some("/env/deck.db".to_string())),
            PathBuf::from("/env/deck.db")
        );
    }

    #[test]
    fn missing_paths_fall_back_to_temp_dir() {
        assert_eq!(
            resolve_db_path(None, None),
            std::env::temp_dir().join(DB_FILE_NAME)
        );
        assert_eq!(
            resolve_db_path(None, Some(String::new())),
            std::env::temp_dir().join(DB_FILE_NAME)
        );
    }
}
