//! Application state store.
//!
//! # Responsibility
//! - Own the current `AppState` snapshot and every mutation on it.
//! - Load the initial snapshot from blob storage and mirror applied
//!   mutations back when auto-save is on.
//! - Notify subscribers after each applied mutation.
//!
//! # Invariants
//! - Each applied mutation swaps in a whole new snapshot; a snapshot handed
//!   out by `snapshot()` never changes afterwards.
//! - Operations never fail the caller. Unknown ids are no-ops that neither
//!   notify nor persist; storage failures are logged and swallowed.
//! - `update_settings` never writes by itself. Re-enabling auto-save takes
//!   effect on the next mutation.
//! - Competency ids stay unique for the lifetime of the store.

use crate::model::card::{Card, CardFormat, CardId};
use crate::model::competency::{default_competencies, Competency, CompetencyId};
use crate::model::state::{AppState, Settings};
use crate::service::persistence::{load_snapshot, save_snapshot, STORAGE_KEY};
use crate::storage::BlobStorage;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond time source used for card timestamps.
pub trait Clock: Send {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Store construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Blob key the snapshot is read from and written to.
    pub storage_key: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

/// Handle returned by [`Store::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&AppState) + Send>;

/// Single-writer state container for competencies, cards and settings.
pub struct Store<S: BlobStorage> {
    state: Arc<AppState>,
    storage: Option<S>,
    options: StoreOptions,
    clock: Box<dyn Clock>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: BlobStorage> Store<S> {
    /// Creates a store and loads its initial snapshot.
    ///
    /// `storage = None` means no persistent backend exists in this host;
    /// the store then runs memory-only. A missing, unreadable or invalid
    /// blob falls back to `AppState::default()`. Opening never writes.
    pub fn open(storage: Option<S>, options: StoreOptions) -> Self {
        let state = match storage.as_ref() {
            None => {
                info!("event=store_open module=store status=skip reason=no_storage");
                AppState::default()
            }
            Some(backend) => match load_snapshot(backend, &options.storage_key) {
                Ok(Some(state)) => {
                    info!(
                        "event=store_open module=store status=ok source=storage competencies={} cards={}",
                        state.competencies.len(),
                        state.card_count()
                    );
                    state
                }
                Ok(None) => {
                    info!("event=store_open module=store status=ok source=defaults");
                    AppState::default()
                }
                Err(err) => {
                    warn!(
                        "event=store_open module=store status=error source=defaults error_code={} error={}",
                        err.code(),
                        err
                    );
                    AppState::default()
                }
            },
        };

        Self {
            state: Arc::new(state),
            storage,
            options,
            clock: Box::new(SystemClock),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Creates a store with no persistent backend.
    pub fn in_memory() -> Self {
        Self::open(None, StoreOptions::default())
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current immutable snapshot.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> Settings {
        self.state.settings
    }

    pub fn competency(&self, id: &CompetencyId) -> Option<&Competency> {
        self.state.competency(id)
    }

    pub fn card(&self, competency_id: &CompetencyId, card_id: &CardId) -> Option<&Card> {
        self.competency(competency_id)?.card(card_id)
    }

    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Registers a listener called with the new snapshot after each applied mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + Send + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Appends a new empty card to a competency.
    ///
    /// Returns the created card, or `None` when `competency_id` is unknown.
    /// `title` is stored as given; callers validate it.
    pub fn add_card(
        &mut self,
        competency_id: &CompetencyId,
        title: impl Into<String>,
        format: CardFormat,
    ) -> Option<Card> {
        let Some(index) = self.competency_index(competency_id) else {
            debug!(
                "event=card_add module=store status=skip reason=competency_not_found competency_id={competency_id}"
            );
            return None;
        };

        let card = Card::new(title, format, self.clock.now_ms());
        let mut next = self.draft();
        next.competencies[index].cards.push(card.clone());
        debug!(
            "event=card_add module=store status=ok competency_id={competency_id} card_id={} format={}",
            card.id,
            format.as_str()
        );
        self.commit(next, Persist::IfAutoSave);
        Some(card)
    }

    /// Replaces a card with `card`, matched by `card.id`.
    ///
    /// `created_at` is kept from the stored card and `updated_at` is set to
    /// now, strictly later than its previous value. Returns `false` when the
    /// competency or card is unknown.
    pub fn update_card(&mut self, competency_id: &CompetencyId, card: Card) -> bool {
        let Some((comp_index, card_index)) = self.card_index(competency_id, &card.id) else {
            debug!(
                "event=card_update module=store status=skip reason=card_not_found competency_id={competency_id} card_id={}",
                card.id
            );
            return false;
        };

        let mut next = self.draft();
        let slot = &mut next.competencies[comp_index].cards[card_index];
        let created_at = slot.created_at;
        let updated_at = self.clock.now_ms().max(slot.updated_at + 1);
        *slot = Card {
            created_at,
            updated_at,
            ..card
        };
        debug!(
            "event=card_update module=store status=ok competency_id={competency_id} card_id={}",
            slot.id
        );
        self.commit(next, Persist::IfAutoSave);
        true
    }

    /// Removes a card. Returns `false` when nothing matched.
    pub fn delete_card(&mut self, competency_id: &CompetencyId, card_id: &CardId) -> bool {
        let Some((comp_index, card_index)) = self.card_index(competency_id, card_id) else {
            debug!(
                "event=card_delete module=store status=skip reason=card_not_found competency_id={competency_id} card_id={card_id}"
            );
            return false;
        };

        let mut next = self.draft();
        next.competencies[comp_index].cards.remove(card_index);
        debug!(
            "event=card_delete module=store status=ok competency_id={competency_id} card_id={card_id}"
        );
        self.commit(next, Persist::IfAutoSave);
        true
    }

    /// Appends a new competency without cards and returns its generated id.
    pub fn add_competency(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> CompetencyId {
        let name = name.into();
        let id = loop {
            let candidate = CompetencyId::derive(&name);
            if !self.state.contains_competency(&candidate) {
                break candidate;
            }
        };

        let mut next = self.draft();
        next.competencies
            .push(Competency::new(id.clone(), name, description));
        debug!("event=competency_add module=store status=ok competency_id={id}");
        self.commit(next, Persist::IfAutoSave);
        id
    }

    /// Renames/redescribes a competency, keeping its id and cards.
    pub fn update_competency(
        &mut self,
        id: &CompetencyId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> bool {
        let Some(index) = self.competency_index(id) else {
            debug!(
                "event=competency_update module=store status=skip reason=competency_not_found competency_id={id}"
            );
            return false;
        };

        let mut next = self.draft();
        let competency = &mut next.competencies[index];
        competency.name = name.into();
        competency.description = description.into();
        debug!("event=competency_update module=store status=ok competency_id={id}");
        self.commit(next, Persist::IfAutoSave);
        true
    }

    /// Removes a competency together with all of its cards.
    pub fn delete_competency(&mut self, id: &CompetencyId) -> bool {
        let Some(index) = self.competency_index(id) else {
            debug!(
                "event=competency_delete module=store status=skip reason=competency_not_found competency_id={id}"
            );
            return false;
        };

        let mut next = self.draft();
        let removed = next.competencies.remove(index);
        debug!(
            "event=competency_delete module=store status=ok competency_id={id} cards_removed={}",
            removed.cards.len()
        );
        self.commit(next, Persist::IfAutoSave);
        true
    }

    /// Replaces settings wholesale.
    ///
    /// Never writes to storage, including when `auto_save` is already on
    /// and stays on. New settings reach storage with the next mutation
    /// that saves.
    pub fn update_settings(&mut self, settings: Settings) {
        let mut next = self.draft();
        next.settings = settings;
        debug!(
            "event=settings_update module=store status=ok auto_save={}",
            settings.auto_save
        );
        self.commit(next, Persist::Never);
    }

    /// Replaces the whole state with the built-in defaults.
    pub fn reset_data(&mut self) {
        info!("event=reset_data module=store status=ok");
        self.commit(AppState::default(), Persist::IfAutoSave);
    }

    /// Replaces competencies with the seeded set, keeping settings.
    pub fn reset_to_default_competencies(&mut self) {
        let next = AppState {
            competencies: default_competencies(),
            settings: self.state.settings,
        };
        info!("event=reset_competencies module=store status=ok");
        self.commit(next, Persist::IfAutoSave);
    }

    fn draft(&self) -> AppState {
        AppState::clone(&self.state)
    }

    fn competency_index(&self, id: &CompetencyId) -> Option<usize> {
        self.state
            .competencies
            .iter()
            .position(|competency| &competency.id == id)
    }

    fn card_index(&self, competency_id: &CompetencyId, card_id: &CardId) -> Option<(usize, usize)> {
        let comp_index = self.competency_index(competency_id)?;
        let card_index = self.state.competencies[comp_index]
            .cards
            .iter()
            .position(|card| &card.id == card_id)?;
        Some((comp_index, card_index))
    }

    fn commit(&mut self, next: AppState, persist: Persist) {
        self.state = Arc::new(next);
        let snapshot = Arc::clone(&self.state);
        for (_, listener) in self.listeners.iter_mut() {
            listener(snapshot.as_ref());
        }
        if persist == Persist::IfAutoSave {
            self.persist();
        }
    }

    fn persist(&self) {
        if !self.state.settings.auto_save {
            debug!("event=snapshot_save module=store status=skip reason=auto_save_off");
            return;
        }
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        match save_snapshot(storage, &self.options.storage_key, &self.state) {
            Ok(bytes) => debug!("event=snapshot_save module=store status=ok bytes={bytes}"),
            Err(err) => error!(
                "event=snapshot_save module=store status=error error_code={} error={}",
                err.code(),
                err
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    IfAutoSave,
    Never,
}

#[cfg(test)]
mod tests {
    use super::{Clock, Store, StoreOptions, SystemClock};
    use crate::model::card::CardFormat;
    use crate::service::persistence::STORAGE_KEY;
    use crate::storage::{BlobStorage, MemoryBlobStorage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn listeners_fire_only_for_applied_mutations() {
        let mut store: Store<MemoryBlobStorage> = Store::in_memory();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let subscription = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.add_card(&"leadership".into(), "Ran offsite", CardFormat::Star);
        store.add_card(&"unknown".into(), "Lost", CardFormat::Star);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(store.unsubscribe(subscription));
        assert!(!store.unsubscribe(subscription));
        store.reset_data();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn old_snapshots_are_not_mutated() {
        let mut store: Store<MemoryBlobStorage> = Store::in_memory();
        let before = store.snapshot();
        store.add_competency("Mentoring", "Helping others grow");
        assert_eq!(before.competencies.len(), 5);
        assert_eq!(store.snapshot().competencies.len(), 6);
    }

    #[test]
    fn custom_storage_key_is_used_for_writes() {
        let storage = MemoryBlobStorage::new();
        let options = StoreOptions {
            storage_key: "custom-key".to_string(),
        };
        let mut store = Store::open(Some(storage.clone()), options);
        store.reset_data();
        assert!(storage.get_item("custom-key").unwrap().is_some());
        assert!(storage.get_item(STORAGE_KEY).unwrap().is_none());
    }
}
