//! Identifier minting.
//!
//! A [`Minter`] walks its template's sequence, skipping every candidate the
//! object store already knows about (live or tombstoned), and persists its
//! position before handing an identifier out. A crash can therefore lose
//! an identifier but never issue one twice.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::config::{MinterConfig, Settings};
use crate::domain::{Advance, MinterState, Template};
use crate::error::{NoidError, Result, StorageError};
use crate::storage::file::FileStateStore;
use crate::storage::traits::{ObjectStore, StateStore};
use crate::storage::create_state_store;

/// Mints identifiers from one template and one state store.
pub struct Minter {
    /// Template every identifier is rendered from.
    template: Template,
    /// Where the sequence position is kept.
    states: Arc<dyn StateStore>,
    /// Existence and tombstone predicates.
    objects: Arc<dyn ObjectStore>,
    /// Serializes callers of this minter ahead of the store transaction.
    lock: Mutex<()>,
}

impl Minter {
    /// Create a minter.
    pub fn new(
        template: Template,
        states: Arc<dyn StateStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            template,
            states,
            objects,
            lock: Mutex::new(()),
        }
    }

    /// Create a minter using the template and state file of `settings`.
    pub fn from_settings(settings: &Settings, objects: Arc<dyn ObjectStore>) -> Self {
        Self::new(
            settings.template().clone(),
            Arc::new(FileStateStore::new(settings.statefile())),
            objects,
        )
    }

    /// Create a minter from the `minter` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the configured template does not parse.
    pub fn from_config(config: &MinterConfig, objects: Arc<dyn ObjectStore>) -> Result<Self> {
        let template = Template::parse(&config.template)?;
        Ok(Self::new(template, create_state_store(config), objects))
    }

    /// Template this minter renders.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// Mint a new identifier.
    ///
    /// Blocks other mints on this minter, and on any minter sharing its state
    /// medium, until it returns. The returned
    /// identifier is neither live nor tombstoned in the object store at the
    /// time of the check, and the state that moves past it has been written.
    ///
    /// # Errors
    ///
    /// - `StateUnavailable` if the state cannot be read
    /// - `TemplateMismatch` if the state belongs to another template
    /// - `SequenceExhausted` if a bounded template has no free identifier left
    /// - `Persistence` if the new state cannot be written; the candidate is
    ///   discarded and will be offered again by the next call
    pub fn mint(&self) -> Result<String> {
        let _guard = self.lock.lock();
        let mut tx = self
            .states
            .begin(&self.template)
            .map_err(NoidError::StateUnavailable)?;
        let mut state = tx.state().clone();
        self.check_state(&state)?;

        if state.exhausted {
            warn!(template = %self.template, "Sequence exhausted");
            return Err(NoidError::SequenceExhausted(self.template.to_string()));
        }

        let mut skipped = 0u64;
        loop {
            let candidate = self.template.render(&state.counters, state.seed)?;
            let advance = self.template.next_position(&state.counters);

            if self.objects.is_reserved(&candidate) {
                skipped += 1;
                debug!(id = %candidate, "Skipping identifier already in use");
                match advance {
                    Advance::Next(next) => {
                        state.counters = next;
                        continue;
                    }
                    Advance::Exhausted => {
                        warn!(template = %self.template, skipped, "Sequence exhausted while skipping");
                        return Err(NoidError::SequenceExhausted(self.template.to_string()));
                    }
                }
            }

            match advance {
                Advance::Next(next) => state.counters = next,
                Advance::Exhausted => state.exhausted = true,
            }
            state.sequence += 1;
            state.touch();

            if let Err(e) = tx.commit(&state) {
                let err = NoidError::Persistence(e);
                error!(
                    error_code = err.error_code().as_i32(),
                    backend = self.states.backend_name(),
                    message = %err,
                    "Discarding minted identifier"
                );
                return Err(err);
            }

            debug!(id = %candidate, sequence = state.sequence, skipped, "Minted identifier");
            return Ok(candidate);
        }
    }

    /// Mint `count` identifiers, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::mint`]. Identifiers minted before the failure stay
    /// minted.
    pub fn mint_many(&self, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.mint()).collect()
    }

    /// Current state, or the initial state if none has been persisted.
    ///
    /// # Errors
    ///
    /// Returns `StateUnavailable` or `TemplateMismatch` like [`Self::mint`].
    pub fn read_state(&self) -> Result<MinterState> {
        let _guard = self.lock.lock();
        self.load_state()
    }

    /// Replace the persisted state, e.g. when moving a minter to another
    /// store.
    ///
    /// # Errors
    ///
    /// Returns `TemplateMismatch` if `state` belongs to another template,
    /// `StateUnavailable` if its counters are unusable, and `Persistence` if
    /// the write fails.
    pub fn restore(&self, state: &MinterState) -> Result<()> {
        self.check_state(state)?;
        let _guard = self.lock.lock();
        self.states.write(state).map_err(NoidError::Persistence)
    }

    /// Start the sequence over.
    ///
    /// Identifiers minted before the reset are still skipped as long as the
    /// object store reports them.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the write fails.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock();
        warn!(template = %self.template, "Resetting minter state");
        self.states
            .write(&MinterState::new(self.template.clone()))
            .map_err(NoidError::Persistence)
    }

    /// Whether `id` has the shape and check character of this template.
    #[must_use]
    pub fn validate(&self, id: &str) -> bool {
        self.template.validate(id)
    }

    fn load_state(&self) -> Result<MinterState> {
        let state = self
            .states
            .read(&self.template)
            .map_err(NoidError::StateUnavailable)?;
        self.check_state(&state)?;
        Ok(state)
    }

    fn check_state(&self, state: &MinterState) -> Result<()> {
        if state.template != self.template {
            return Err(NoidError::TemplateMismatch {
                expected: self.template.to_string(),
                found: state.template.to_string(),
            });
        }

        if !state.is_consistent() {
            return Err(NoidError::StateUnavailable(StorageError::Serialization(
                format!(
                    "counters {:?} (alphabet v{}) do not fit template {}",
                    state.counters, state.alphabet_version, self.template
                ),
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check_digit;
    use crate::storage::memory::{MemoryObjectStore, MemoryStateStore};

    fn create_test_minter(template: &str) -> (Minter, Arc<MemoryStateStore>, Arc<MemoryObjectStore>) {
        let states = Arc::new(MemoryStateStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let minter = Minter::new(
            Template::parse(template).unwrap(),
            states.clone(),
            objects.clone(),
        );
        (minter, states, objects)
    }

    #[test]
    fn test_sequential_mint() {
        let (minter, _, _) = create_test_minter(".sdd");
        assert_eq!(minter.mint_many(3).unwrap(), vec!["00", "01", "02"]);
        assert_eq!(minter.read_state().unwrap().sequence, 3);
    }

    #[test]
    fn test_check_digit_appended() {
        let (minter, _, _) = create_test_minter("bb.sddk");
        let id = minter.mint().unwrap();
        assert_eq!(id, format!("bb00{}", check_digit("bb00")));
        assert!(minter.validate(&id));
    }

    #[test]
    fn test_skips_live_and_tombstoned() {
        let (minter, _, objects) = create_test_minter(".sdd");
        objects.insert("00");
        objects.insert("01");
        objects.tombstone("02");

        assert_eq!(minter.mint().unwrap(), "03");
        let state = minter.read_state().unwrap();
        assert_eq!(state.counters, vec![0, 4]);
        assert_eq!(state.sequence, 1);
    }

    #[test]
    fn test_exhausts_after_full_space() {
        let (minter, _, _) = create_test_minter(".sdd");
        let ids = minter.mint_many(100).unwrap();
        assert_eq!(ids.last().map(String::as_str), Some("99"));

        let err = minter.mint().unwrap_err();
        assert!(matches!(err, NoidError::SequenceExhausted(_)));
        assert!(minter.read_state().unwrap().exhausted);
    }

    #[test]
    fn test_exhausts_while_skipping() {
        let (minter, states, objects) = create_test_minter(".sd");
        for i in 5..10 {
            objects.insert(i.to_string());
        }
        minter.mint_many(5).unwrap();

        let before = states.snapshot().unwrap();
        assert!(matches!(minter.mint(), Err(NoidError::SequenceExhausted(_))));
        assert_eq!(states.snapshot().unwrap(), before);
    }

    #[test]
    fn test_extendable_never_exhausts() {
        let (minter, _, _) = create_test_minter(".zd");
        let ids = minter.mint_many(12).unwrap();
        assert_eq!(ids[9], "9");
        assert_eq!(ids[10], "10");
        assert_eq!(ids[11], "11");
    }

    #[test]
    fn test_persistence_failure_discards_candidate() {
        let (minter, states, _) = create_test_minter(".sdd");
        assert_eq!(minter.mint().unwrap(), "00");

        states.set_read_only(true);
        assert!(matches!(minter.mint(), Err(NoidError::Persistence(_))));

        states.set_read_only(false);
        assert_eq!(minter.mint().unwrap(), "01");
    }

    #[test]
    fn test_minters_sharing_a_store_never_repeat() {
        let states = Arc::new(MemoryStateStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let template = Template::parse(".sddd").unwrap();
        let a = Minter::new(template.clone(), states.clone(), objects.clone());
        let b = Minter::new(template, states, objects);

        let ids: Vec<String> = std::thread::scope(|scope| {
            let left = scope.spawn(|| a.mint_many(300).unwrap());
            let right = scope.spawn(|| b.mint_many(300).unwrap());
            let mut ids = left.join().unwrap();
            ids.extend(right.join().unwrap());
            ids
        });

        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 600);
        assert_eq!(a.read_state().unwrap().sequence, 600);
    }

    #[test]
    fn test_state_unavailable() {
        let (minter, states, _) = create_test_minter(".sdd");
        states.set_unavailable(true);
        assert!(matches!(minter.mint(), Err(NoidError::StateUnavailable(_))));
    }

    #[test]
    fn test_template_mismatch() {
        let other = MinterState::with_seed(Template::parse(".sde").unwrap(), 0);
        let states = Arc::new(MemoryStateStore::with_state(other.clone()));
        let minter = Minter::new(
            Template::parse(".sdd").unwrap(),
            states,
            Arc::new(MemoryObjectStore::new()),
        );

        assert!(matches!(
            minter.mint(),
            Err(NoidError::TemplateMismatch { .. })
        ));
        assert!(matches!(
            minter.restore(&other),
            Err(NoidError::TemplateMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupt_counters() {
        let template = Template::parse(".sdd").unwrap();
        let mut state = MinterState::with_seed(template.clone(), 0);
        state.counters = vec![0, 0, 0];
        let minter = Minter::new(
            template,
            Arc::new(MemoryStateStore::with_state(state)),
            Arc::new(MemoryObjectStore::new()),
        );

        assert!(matches!(minter.mint(), Err(NoidError::StateUnavailable(_))));
    }

    #[test]
    fn test_restore_and_reset() {
        let (minter, _, _) = create_test_minter(".sdd");
        minter.mint_many(3).unwrap();

        let mut state = minter.read_state().unwrap();
        state.counters = vec![5, 0];
        minter.restore(&state).unwrap();
        assert_eq!(minter.mint().unwrap(), "50");

        minter.reset().unwrap();
        assert_eq!(minter.mint().unwrap(), "00");
    }

    #[test]
    fn test_from_config() {
        let config = MinterConfig {
            template: "x.sd".to_string(),
            backend: crate::config::StateBackend::Memory,
            ..Default::default()
        };
        let minter = Minter::from_config(&config, Arc::new(MemoryObjectStore::new())).unwrap();
        assert_eq!(minter.mint().unwrap(), "x0");
    }
}
