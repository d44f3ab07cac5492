//! Service layer module.
//!
//! Contains identifier minting and path resolution.

pub mod minter;
pub mod resolver;

pub use minter::Minter;
pub use resolver::{PathResolver, treeify};
