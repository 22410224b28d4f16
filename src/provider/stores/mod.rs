//! Page store backends

pub mod fs;
pub mod sqlite;

pub use fs::FsPageStore;
pub use sqlite::SqlitePageStore;
