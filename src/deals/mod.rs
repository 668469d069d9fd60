pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryDealStore;
pub use models::{DealState, DealStatus, ProposedDealKey, TrackingState};
pub use postgres::PgDealStore;
pub use repository::{DealStateStore, WatchListStore};
