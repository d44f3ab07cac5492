//! Domain models for NOID minting.
//!
//! This module contains the template engine, its alphabets, and the
//! persistent minter state.

pub mod alphabet;
pub mod state;
pub mod template;

pub use alphabet::{ALPHABET_VERSION, DigitClass, check_digit};
pub use state::MinterState;
pub use template::{Advance, Generator, Position, Template};
