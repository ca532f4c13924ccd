pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    Page, Pagination, RecordFilter, RecordOrder, RecordStore, SortDirection, SortField, Store,
    UserStore,
};
