pub mod batch;
pub mod collaborators;
pub mod config;
mod controller;
pub mod error;
pub mod events;
pub mod paginator;
pub mod query;
pub mod selection;
pub mod transport;

pub use batch::{BatchAction, BatchOutcome, BatchReport, RowOutcome};
pub use collaborators::{
    AuthSession, ConfirmDialog, ConfirmPrompt, DeleteScope, LogNotifier, Navigator, Notifier,
    UserDirectory,
};
pub use config::{load_settings, Settings, TableSettings};
pub use controller::{DeleteOutcome, InitParams, TableSnapshot, UserTableController};
pub use error::{ServiceError, ServiceResult};
pub use events::TableEvent;
pub use paginator::PageWindow;
pub use query::SearchKey;
pub use transport::HttpUserDirectory;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
