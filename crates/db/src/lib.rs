//! Storage abstraction for the invite service.
//!
//! The store traits keep the domain crates independent of the database
//! engine; `PgStore` implements them over the platform's Postgres, and
//! `MemStore` (behind the `test-support` feature) backs the test
//! suites.

mod error;
mod postgres;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod mem;

pub use error::StoreError;
pub use postgres::PgStore;
pub use store::{
    CreateInviteParams, InviteStore, InviteUseCounts, MembershipStore, RecordUseParams, TeamStore,
    UsageStore, UserStore,
};
