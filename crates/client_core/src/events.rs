use shared::domain::UserRow;

use crate::query::SearchKey;

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    SelectionChanged(Vec<UserRow>),
    LoadingChanged(bool),
    FocusRequested(Option<SearchKey>),
    PageLoaded { total: u64, rows: usize },
}
