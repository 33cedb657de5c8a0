use std::collections::BTreeMap;

use shared::domain::{UserId, UserRow};

/// Set of selected rows. Rows are compared by id, never by position.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    rows: BTreeMap<UserId, UserRow>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn toggle(&mut self, row: &UserRow) {
        if self.rows.remove(&row.id).is_none() {
            self.rows.insert(row.id.clone(), row.clone());
        }
    }

    pub fn select_all<'a>(&mut self, rows: impl IntoIterator<Item = &'a UserRow>) -> bool {
        let mut changed = false;
        for row in rows {
            if !self.rows.contains_key(&row.id) {
                self.rows.insert(row.id.clone(), row.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.rows.is_empty();
        self.rows.clear();
        changed
    }

    pub fn is_all_selected(&self, displayed: usize) -> bool {
        self.rows.len() == displayed
    }

    pub fn master_toggle(&mut self, displayed: &[UserRow]) -> bool {
        if self.is_all_selected(displayed.len()) {
            self.clear()
        } else {
            self.select_all(displayed)
        }
    }

    pub fn refresh_from(&mut self, rows: &[UserRow]) {
        for row in rows {
            if let Some(stored) = self.rows.get_mut(&row.id) {
                *stored = row.clone();
            }
        }
    }

    pub fn selected(&self) -> Vec<UserRow> {
        self.rows.values().cloned().collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &UserId> {
        self.rows.keys()
    }
}
