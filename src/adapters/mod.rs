// Adapters layer: file formats, local storage and the processing history.

pub mod export;
pub mod history;
pub mod spreadsheet;
pub mod storage;

pub use export::{bundle, to_csv, to_json, to_xlsx};
pub use history::{DashboardStats, HistoryStore};
pub use storage::LocalStorage;
