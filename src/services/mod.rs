// Service exports
pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PostgresClient;
pub use store::{LocationStore, MatchStore, ProfileStore, StoreError, WingmanStore};
