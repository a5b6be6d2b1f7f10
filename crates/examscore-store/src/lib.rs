//! Persistence collaborators for examscore.
//!
//! [`MemoryStore`] implements [`examscore_core::traits::AttemptStore`] over
//! process memory; [`Fixture`] moves its contents to and from JSON files.

pub mod error;
pub mod fixture;
pub mod memory;

pub use error::StoreError;
pub use fixture::{validate_fixture, Fixture, ValidationWarning};
pub use memory::{MemoryStore, StoredComment, StoredSubmission};
