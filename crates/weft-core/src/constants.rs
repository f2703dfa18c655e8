//! Canonical digests and constants used across the engine.
use once_cell::sync::Lazy;

use crate::ident::Hash;

/// BLAKE3 digest of an empty byte slice.
///
/// Serves as the parent link of the genesis snapshot in the timeline hash
/// chain, so every chain hash is defined without an `Option` in the
/// encoding.
pub static BLAKE3_EMPTY: Lazy<Hash> = Lazy::new(|| blake3::hash(&[]).into());
