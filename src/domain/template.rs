//! NOID template parsing and the sequence odometer.
//!
//! A template has the shape `<prefix>.<generator><mask>[k]`, for example
//! `.reeddeeddk` or `bb.sddd`:
//!
//! - `prefix`: literal text copied into every identifier (no `.` or `/`)
//! - `generator`: `r` random order, `s` sequential, `z` sequential and
//!   extendable once the mask runs out
//! - `mask`: one digit class per character, `d` or `e` (see
//!   [`DigitClass`](super::alphabet::DigitClass))
//! - `k`: append a check character

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::alphabet::{DigitClass, check_digit};
use crate::error::{NoidError, Result};

/// Digit values, most significant first.
pub type Position = Vec<u32>;

/// Order in which the sequence space is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    /// `r`: keyed permutation of the bounded space.
    Random,
    /// `s`: bounded, in order.
    Sequential,
    /// `z`: in order, grows a digit when the mask is used up.
    Extendable,
}

impl Generator {
    const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'r' => Some(Self::Random),
            's' => Some(Self::Sequential),
            'z' => Some(Self::Extendable),
            _ => None,
        }
    }
}

/// Result of advancing a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The following position.
    Next(Position),
    /// The most significant digit would carry past its alphabet.
    Exhausted,
}

/// Parsed NOID template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    prefix: String,
    generator: Generator,
    mask: Vec<DigitClass>,
    check: bool,
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the separator is missing, the prefix
    /// has a character other than ASCII alphanumerics and `-_~`, the generator or a mask character is unknown, the mask
    /// is empty, `k` is not the final character, or a random template's
    /// space does not fit in 64 bits.
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: String| NoidError::InvalidTemplate(format!("{source:?}: {reason}"));

        let (prefix, spec) = source
            .split_once('.')
            .ok_or_else(|| invalid("missing '.' separator".to_string()))?;

        // Identifiers travel as URI path segments verbatim.
        if let Some(c) = prefix.chars().find(|&c| !is_path_safe(c)) {
            return Err(invalid(format!("prefix character {c:?} is not URI path safe")));
        }

        let mut chars = spec.chars();
        let generator = match chars.next() {
            Some(c) => Generator::from_marker(c)
                .ok_or_else(|| invalid(format!("unknown generator '{c}'")))?,
            None => return Err(invalid("missing generator".to_string())),
        };

        let mut mask = Vec::new();
        let mut check = false;
        for c in chars {
            if check {
                return Err(invalid("check digit marker 'k' must be last".to_string()));
            }
            if c == 'k' {
                check = true;
                continue;
            }
            let class =
                DigitClass::from_marker(c).ok_or_else(|| invalid(format!("unknown digit class '{c}'")))?;
            mask.push(class);
        }

        if mask.is_empty() {
            return Err(invalid("mask has no digits".to_string()));
        }

        let template = Self {
            source: source.to_string(),
            prefix: prefix.to_string(),
            generator,
            mask,
            check,
        };

        if generator == Generator::Random
            && template.size().is_none_or(|n| n > u128::from(u64::MAX))
        {
            return Err(invalid("random sequence space too large".to_string()));
        }

        Ok(template)
    }

    /// The template string this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Literal identifier prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generator kind.
    #[must_use]
    pub const fn generator(&self) -> Generator {
        self.generator
    }

    /// Digit classes of the mask, most significant first.
    #[must_use]
    pub fn mask(&self) -> &[DigitClass] {
        &self.mask
    }

    /// Whether identifiers carry a check character.
    #[must_use]
    pub const fn has_check_digit(&self) -> bool {
        self.check
    }

    /// Whether the sequence space is unbounded.
    #[must_use]
    pub fn is_extendable(&self) -> bool {
        self.generator == Generator::Extendable
    }

    /// Number of identifiers in the space, `None` when extendable or when
    /// the count overflows `u128`.
    #[must_use]
    pub fn size(&self) -> Option<u128> {
        if self.is_extendable() {
            return None;
        }
        self.mask
            .iter()
            .try_fold(1u128, |acc, class| acc.checked_mul(u128::from(class.radix())))
    }

    /// The first position of the sequence.
    #[must_use]
    pub fn min_position(&self) -> Position {
        vec![0; self.mask.len()]
    }

    /// Digit class at `digit` of a position `len` digits long.
    ///
    /// Extra leading digits of an extended position repeat the first mask
    /// class.
    fn class_at(&self, len: usize, digit: usize) -> DigitClass {
        let extra = len.saturating_sub(self.mask.len());
        if digit < extra {
            self.mask[0]
        } else {
            self.mask[digit - extra]
        }
    }

    /// Whether `position` has a valid shape and digit values for this template.
    #[must_use]
    pub fn accepts(&self, position: &[u32]) -> bool {
        let len = position.len();
        let shape_ok = if self.is_extendable() {
            len == self.mask.len() || (len > self.mask.len() && position[0] != 0)
        } else {
            len == self.mask.len()
        };
        shape_ok
            && position
                .iter()
                .enumerate()
                .all(|(i, &v)| v < self.class_at(len, i).radix())
    }

    /// Advance `position` by one, odometer style.
    #[must_use]
    pub fn next_position(&self, position: &[u32]) -> Advance {
        let mut next = position.to_vec();
        let len = next.len();

        for i in (0..len).rev() {
            if next[i] + 1 < self.class_at(len, i).radix() {
                next[i] += 1;
                return Advance::Next(next);
            }
            next[i] = 0;
        }

        if self.is_extendable() {
            next.insert(0, 1);
            Advance::Next(next)
        } else {
            Advance::Exhausted
        }
    }

    /// Sequence index of `position`, `None` on overflow.
    #[must_use]
    pub fn index_of(&self, position: &[u32]) -> Option<u128> {
        let len = position.len();
        position.iter().enumerate().try_fold(0u128, |acc, (i, &v)| {
            acc.checked_mul(u128::from(self.class_at(len, i).radix()))?
                .checked_add(u128::from(v))
        })
    }

    /// Position at sequence `index`, `None` when past the end of a bounded
    /// space.
    #[must_use]
    pub fn position_at(&self, index: u128) -> Option<Position> {
        if self.size().is_some_and(|size| index >= size) {
            return None;
        }

        let mut rest = index;
        let mut digits = Vec::with_capacity(self.mask.len());
        for class in self.mask.iter().rev() {
            let radix = u128::from(class.radix());
            digits.push(digit_of(rest % radix));
            rest /= radix;
        }

        let lead = u128::from(self.mask[0].radix());
        while rest > 0 {
            digits.push(digit_of(rest % lead));
            rest /= lead;
        }

        digits.reverse();
        Some(digits)
    }

    /// Render the identifier for `position`.
    ///
    /// `seed` keys the permutation of random templates and is ignored by the
    /// others.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if `position` does not fit this template.
    pub fn render(&self, position: &[u32], seed: u64) -> Result<String> {
        if !self.accepts(position) {
            return Err(NoidError::InvalidTemplate(format!(
                "position {position:?} does not fit template {:?}",
                self.source
            )));
        }

        let digits = match self.generator {
            Generator::Random => self.shuffled(position, seed)?,
            Generator::Sequential | Generator::Extendable => position.to_vec(),
        };

        let len = digits.len();
        let mut id = String::with_capacity(self.prefix.len() + len + 1);
        id.push_str(&self.prefix);
        for (i, &value) in digits.iter().enumerate() {
            id.push(self.class_at(len, i).symbol(value));
        }

        if self.check {
            id.push(check_digit(&id));
        }

        Ok(id)
    }

    /// Map a random template's position through its keyed permutation.
    fn shuffled(&self, position: &[u32], seed: u64) -> Result<Position> {
        let out_of_range = || {
            NoidError::InvalidTemplate(format!(
                "position {position:?} out of range for template {:?}",
                self.source
            ))
        };
        let size = self.size().ok_or_else(out_of_range)?;
        let index = self.index_of(position).ok_or_else(out_of_range)?;
        let permuted = Permutation::new(seed, size).apply(index);
        self.position_at(permuted).ok_or_else(out_of_range)
    }

    /// Check that `id` could have been minted from this template.
    #[must_use]
    pub fn validate(&self, id: &str) -> bool {
        let Some(rest) = id.strip_prefix(self.prefix.as_str()) else {
            return false;
        };

        let core: Vec<char> = if self.check {
            let mut chars: Vec<char> = rest.chars().collect();
            match chars.pop() {
                Some(check) if check == check_digit(&id[..id.len() - check.len_utf8()]) => chars,
                _ => return false,
            }
        } else {
            rest.chars().collect()
        };

        let len = core.len();
        let len_ok = if self.is_extendable() {
            len == self.mask.len()
                || (len > self.mask.len() && self.mask[0].value_of(core[0]) != Some(0))
        } else {
            len == self.mask.len()
        };

        len_ok
            && core
                .iter()
                .enumerate()
                .all(|(i, &c)| self.class_at(len, i).value_of(c).is_some())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Default for Template {
    /// `.reeddeeddk`
    fn default() -> Self {
        use DigitClass::{Extended as E, Numeric as D};
        Self {
            source: ".reeddeeddk".to_string(),
            prefix: String::new(),
            generator: Generator::Random,
            mask: vec![E, E, D, D, E, E, D, D],
            check: true,
        }
    }
}

impl std::str::FromStr for Template {
    type Err = NoidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Template {
    type Error = NoidError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

const fn is_path_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '~')
}

#[allow(clippy::cast_possible_truncation)]
const fn digit_of(value: u128) -> u32 {
    value as u32
}

/// Affine bijection `i -> (a * i + c) mod n` keyed by a seed.
///
/// `a` is coprime with `n`, so every index maps to a distinct index.
/// `n` never exceeds `u64::MAX`, keeping `a * i` inside `u128`.
struct Permutation {
    multiplier: u128,
    offset: u128,
    size: u128,
}

impl Permutation {
    fn new(seed: u64, size: u128) -> Self {
        if size <= 1 {
            return Self {
                multiplier: 1,
                offset: 0,
                size: size.max(1),
            };
        }

        #[allow(clippy::cast_possible_truncation)]
        let n = size as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        let multiplier = loop {
            let candidate = rng.random_range(1..n);
            if gcd(candidate, n) == 1 {
                break candidate;
            }
        };
        let offset = rng.random_range(0..n);

        Self {
            multiplier: u128::from(multiplier),
            offset: u128::from(offset),
            size,
        }
    }

    const fn apply(&self, index: u128) -> u128 {
        (self.multiplier * index % self.size + self.offset) % self.size
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
