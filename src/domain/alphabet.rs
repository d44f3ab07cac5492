//! Digit alphabets and the check character.
//!
//! These alphabets are part of the identifier format: identifiers end up
//! literally in storage URIs, so changing a symbol or its position breaks
//! every identifier already minted. Any change must bump
//! [`ALPHABET_VERSION`].

/// Version of the alphabet set below. Recorded in every persisted state.
pub const ALPHABET_VERSION: u32 = 1;

/// Numeric digit class (`d`): radix 10.
pub const NUMERIC: &[u8] = b"0123456789";

/// Extended digit class (`e`): radix 29.
///
/// Digits plus consonants, without `l` (looks like `1`) and without vowels
/// or `y`, so no words are spelled by accident.
pub const EXTENDED: &[u8] = b"0123456789bcdfghjkmnpqrstvwxz";

/// A digit class of a template mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitClass {
    /// `d`: 0-9.
    Numeric,
    /// `e`: [`EXTENDED`].
    Extended,
}

impl DigitClass {
    /// Parse a mask marker character.
    #[must_use]
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'd' => Some(Self::Numeric),
            'e' => Some(Self::Extended),
            _ => None,
        }
    }

    /// Mask marker character for this class.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Numeric => 'd',
            Self::Extended => 'e',
        }
    }

    /// Symbols of this class, in digit-value order.
    #[must_use]
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Numeric => NUMERIC,
            Self::Extended => EXTENDED,
        }
    }

    /// Number of symbols in this class.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn radix(self) -> u32 {
        self.alphabet().len() as u32
    }

    /// Symbol for a digit value. `value` must be below [`Self::radix`].
    #[must_use]
    pub fn symbol(self, value: u32) -> char {
        char::from(self.alphabet()[value as usize])
    }

    /// Digit value of a symbol, if the symbol belongs to this class.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_of(self, symbol: char) -> Option<u32> {
        let byte = u8::try_from(symbol).ok()?;
        self.alphabet()
            .iter()
            .position(|&b| b == byte)
            .map(|p| p as u32)
    }
}

/// Compute the check character for `text`.
///
/// Each character contributes its ordinal in [`EXTENDED`] (zero for
/// characters outside it) multiplied by its 1-based position; the sum modulo
/// 29 indexes back into [`EXTENDED`]. Catches any single-character
/// substitution and any transposition of two adjacent characters.
#[must_use]
pub fn check_digit(text: &str) -> char {
    let radix = u64::from(DigitClass::Extended.radix());
    let sum = text
        .chars()
        .zip(1u64..)
        .map(|(c, position)| {
            let ordinal = DigitClass::Extended.value_of(c).map_or(0, u64::from);
            ordinal * position
        })
        .fold(0u64, |acc, n| (acc + n) % radix);

    #[allow(clippy::cast_possible_truncation)]
    let value = sum as u32;
    DigitClass::Extended.symbol(value)
}
