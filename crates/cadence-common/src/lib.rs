//! # Cadence Common
//!
//! Common types shared by the Cadence audio crates:
//! - Case-insensitive clip identifiers
//! - The audio error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        let err: AudioResult<()> = Err(AudioError::ClipNotFound {
            kind: ClipKind::Sfx,
            id: ClipId::from("missing"),
        });
        assert!(err.is_err());
    }
}
