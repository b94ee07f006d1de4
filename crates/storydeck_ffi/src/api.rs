//! FFI use-case API for the host UI.
//!
//! # Responsibility
//! - Expose the store operations to Dart via FRB as one opaque handle per
//!   app instance.
//! - Translate string ids and plain draft structs into core types.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Unknown ids and unparseable formats are no-ops, mirroring the store.
//! - Snapshots cross the boundary as the persisted JSON shape.

use log::{error, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use storydeck_core::service::persistence::encode_snapshot;
use storydeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Card, CardContent, CardFormat, CardId, CompetencyId, Settings, SqliteBlobStorage, Store,
    StoreOptions, StoryField,
};

const DB_PATH_ENV: &str = "STORYDECK_DB_PATH";
const DB_FILE_NAME: &str = "storydeck.sqlite3";

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is idempotent.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One field of the format guide shown next to the card editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatGuideEntry {
    /// Key inside the card `content` object.
    pub key: String,
    pub label: String,
    pub prompt: String,
}

impl From<StoryField> for FormatGuideEntry {
    fn from(field: StoryField) -> Self {
        Self {
            key: field.key().to_owned(),
            label: field.label().to_owned(),
            prompt: field.prompt().to_owned(),
        }
    }
}

/// Returns the ordered fields of `format` (`STAR` or `CURL`).
///
/// An unknown format yields an empty list.
#[flutter_rust_bridge::frb(sync)]
pub fn format_guide(format: String) -> Vec<FormatGuideEntry> {
    match CardFormat::parse(&format) {
        Some(format) => format
            .fields()
            .iter()
            .map(|field| FormatGuideEntry::from(*field))
            .collect(),
        None => {
            warn!("event=ffi_format_guide module=ffi status=skip reason=invalid_format");
            Vec::new()
        }
    }
}

/// Editor output for one card, as submitted by the host UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub id: String,
    pub title: String,
    /// `STAR` or `CURL`, case-insensitive.
    pub format: String,
    pub situation: Option<String>,
    pub task: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    pub challenge: Option<String>,
    pub understanding: Option<String>,
    pub response: Option<String>,
    pub lesson: Option<String>,
}

impl CardDraft {
    fn into_card(self) -> Option<Card> {
        let format = CardFormat::parse(&self.format)?;
        Some(Card {
            id: CardId::from(self.id),
            title: self.title,
            format,
            content: CardContent {
                situation: self.situation,
                task: self.task,
                action: self.action,
                result: self.result,
                challenge: self.challenge,
                understanding: self.understanding,
                response: self.response,
                lesson: self.lesson,
            },
            // Timestamps are owned by the store.
            created_at: 0,
            updated_at: 0,
        })
    }
}

/// Opaque store handle owned by the host app.
///
/// # FFI contract
/// - Construct once per app instance and keep it for the app lifetime.
/// - All methods are sync and short; storage writes happen inline.
#[flutter_rust_bridge::frb(opaque)]
pub struct StoreHandle {
    store: Mutex<Store<SqliteBlobStorage>>,
}

impl StoreHandle {
    /// Opens the store backed by a SQLite file.
    ///
    /// `db_path = None` resolves `STORYDECK_DB_PATH`, then the temp dir.
    /// If the database cannot be opened the handle runs memory-only.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(db_path: Option<String>) -> StoreHandle {
        let path = resolve_db_path(db_path);
        let storage = match SqliteBlobStorage::open(&path) {
            Ok(storage) => Some(storage),
            Err(err) => {
                error!(
                    "event=ffi_store_open module=ffi status=error error_code=storage_open_failed path={} error={}",
                    path.display(),
                    err
                );
                None
            }
        };
        Self::wrap(Store::open(storage, StoreOptions::default()))
    }

    /// Memory-only handle with no persistence.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open_in_memory() -> StoreHandle {
        Self::wrap(Store::in_memory())
    }

    /// Current state as persisted JSON.
    #[flutter_rust_bridge::frb(sync)]
    pub fn snapshot_json(&self) -> String {
        let snapshot = self.lock().snapshot();
        encode_snapshot(&snapshot).unwrap_or_else(|err| {
            error!("event=ffi_snapshot module=ffi status=error error={err}");
            String::new()
        })
    }

    /// Whether writes are currently mirrored to storage.
    #[flutter_rust_bridge::frb(sync)]
    pub fn persistent(&self) -> bool {
        self.lock().storage().is_some()
    }

    /// Returns the new card id, or `None` for unknown competency/format.
    #[flutter_rust_bridge::frb(sync)]
    pub fn add_card(&self, competency_id: String, title: String, format: String) -> Option<String> {
        let Some(format) = CardFormat::parse(&format) else {
            warn!("event=ffi_add_card module=ffi status=skip reason=invalid_format");
            return None;
        };
        self.lock()
            .add_card(&CompetencyId::from(competency_id), title, format)
            .map(|card| card.id.to_string())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn update_card(&self, competency_id: String, draft: CardDraft) -> bool {
        let Some(card) = draft.into_card() else {
            warn!("event=ffi_update_card module=ffi status=skip reason=invalid_format");
            return false;
        };
        self.lock()
            .update_card(&CompetencyId::from(competency_id), card)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete_card(&self, competency_id: String, card_id: String) -> bool {
        self.lock()
            .delete_card(&CompetencyId::from(competency_id), &CardId::from(card_id))
    }

    /// Returns the generated competency id.
    #[flutter_rust_bridge::frb(sync)]
    pub fn add_competency(&self, name: String, description: String) -> String {
        self.lock().add_competency(name, description).to_string()
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn update_competency(&self, id: String, name: String, description: String) -> bool {
        self.lock()
            .update_competency(&CompetencyId::from(id), name, description)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete_competency(&self, id: String) -> bool {
        self.lock().delete_competency(&CompetencyId::from(id))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_auto_save(&self, auto_save: bool) {
        self.lock().update_settings(Settings { auto_save });
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn reset_data(&self) {
        self.lock().reset_data();
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn reset_to_default_competencies(&self) {
        self.lock().reset_to_default_competencies();
    }

    fn wrap(store: Store<SqliteBlobStorage>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store<SqliteBlobStorage>> {
        // Every store mutation swaps a whole snapshot, so a poisoned guard
        // still holds a consistent state.
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    let from_env = || std::env::var(DB_PATH_ENV).ok();
    explicit
        .or_else(from_env)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, format_guide, init_logging, ping, resolve_db_path, CardDraft, StoreHandle,
    };
    use serde_json::Value;

    fn snapshot(handle: &StoreHandle) -> Value {
        serde_json::from_str(&handle.snapshot_json()).expect("snapshot should be JSON")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn format_guide_lists_fields_in_order() {
        let star = format_guide("star".to_string());
        let keys = star.iter().map(|entry| entry.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["situation", "task", "action", "result"]);
        assert_eq!(star[0].label, "Situation");
        assert_eq!(star[0].prompt, "Set the scene and context");

        let curl = format_guide("CURL".to_string());
        assert_eq!(curl.len(), 4);
        assert_eq!(curl[3].key, "lesson");
        assert_eq!(curl[3].label, "Lesson");
        assert_eq!(curl[3].prompt, "What you learned");

        assert!(format_guide("SOAR".to_string()).is_empty());
    }

    #[test]
    fn explicit_db_path_wins() {
        assert_eq!(
            resolve_db_path(Some(" /data/deck.db ".to_string())),
            std::path::PathBuf::from("/data/deck.db")
        );
    }

    #[test]
    fn card_lifecycle_through_handle() {
        let handle = StoreHandle::open_in_memory();
        assert!(!handle.persistent());

        let card_id = handle
            .add_card("leadership".to_string(), "Offsite".to_string(), "star".to_string())
            .expect("card should be created");
        assert!(handle
            .add_card("leadership".to_string(), "x".to_string(), "SOAR".to_string())
            .is_none());

        let updated = handle.update_card(
            "leadership".to_string(),
            CardDraft {
                id: card_id.clone(),
                title: "Offsite".to_string(),
                format: "STAR".to_string(),
                situation: Some("remote team".to_string()),
                ..CardDraft::default()
            },
        );
        assert!(updated);

        let state = snapshot(&handle);
        let card = &state["competencies"][0]["cards"][0];
        assert_eq!(card["id"], card_id.as_str());
        assert_eq!(card["content"]["situation"], "remote team");

        assert!(handle.delete_card("leadership".to_string(), card_id.clone()));
        assert!(!handle.delete_card("leadership".to_string(), card_id));
    }

    #[test]
    fn file_backed_handle_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffi.db").to_string_lossy().into_owned();

        let first = StoreHandle::open(Some(path.clone()));
        assert!(first.persistent());
        let id = first.add_competency("Mentoring".to_string(), "Helping others grow".to_string());
        drop(first);

        let second = StoreHandle::open(Some(path));
        let state = snapshot(&second);
        let ids = state["competencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|competency| competency["id"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert!(ids.contains(&id));

        second.set_auto_save(false);
        second.reset_data();
        assert_eq!(snapshot(&second)["settings"]["autoSave"], true);
    }
}
