//! Persistent minter state.

use serde::{Deserialize, Serialize};

use super::alphabet::ALPHABET_VERSION;
use super::template::{Position, Template};

/// Persistent state of a minter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterState {
    /// Template the counters belong to.
    pub template: Template,

    /// Position of the next candidate, most significant digit first.
    pub counters: Position,

    /// Set once the last position of a bounded template has been minted.
    pub exhausted: bool,

    /// Permutation key for random templates.
    pub seed: u64,

    /// Number of identifiers minted so far.
    pub sequence: u64,

    /// Alphabet version the identifiers were rendered with.
    #[serde(default = "default_alphabet_version")]
    pub alphabet_version: u32,

    /// Last update timestamp (milliseconds since epoch).
    pub updated_at: i64,
}

const fn default_alphabet_version() -> u32 {
    ALPHABET_VERSION
}

impl MinterState {
    /// Create the initial state for a template.
    ///
    /// Random templates get a fresh permutation key.
    #[must_use]
    pub fn new(template: Template) -> Self {
        let seed = rand::random();
        Self::with_seed(template, seed)
    }

    /// Create the initial state with a fixed permutation key.
    #[must_use]
    pub fn with_seed(template: Template, seed: u64) -> Self {
        Self {
            counters: template.min_position(),
            template,
            exhausted: false,
            seed,
            sequence: 0,
            alphabet_version: ALPHABET_VERSION,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether the counters and alphabet version are usable with the
    /// recorded template.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.alphabet_version == ALPHABET_VERSION && self.template.accepts(&self.counters)
    }

    /// Mark this state as updated now.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}
