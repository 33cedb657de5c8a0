use futures::future::join_all;
use shared::domain::{UserId, UserRow, UserState};
use tracing::debug;

use crate::{collaborators::UserDirectory, error::ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAction {
    Deactivate,
    Reactivate,
}

impl BatchAction {
    pub fn eligible_state(self) -> UserState {
        match self {
            Self::Deactivate => UserState::Active,
            Self::Reactivate => UserState::Inactive,
        }
    }

    pub fn applies_to(self, row: &UserRow) -> bool {
        row.state == self.eligible_state()
    }

    pub fn success_key(self) -> &'static str {
        match self {
            Self::Deactivate => "USER.TOAST.SELECTEDDEACTIVATED",
            Self::Reactivate => "USER.TOAST.SELECTEDREACTIVATED",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Deactivate => "deactivate",
            Self::Reactivate => "reactivate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub id: UserId,
    pub result: Result<(), ServiceError>,
}

// Rows that succeeded stay mutated even when the batch as a whole failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub action: BatchAction,
    pub outcomes: Vec<RowOutcome>,
    pub skipped: Vec<UserId>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn first_error(&self) -> Option<&ServiceError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &UserId> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| &o.id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Succeeded(BatchReport),
    Failed(BatchReport),
    AlreadyRunning,
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            Self::Succeeded(report) | Self::Failed(report) => Some(report),
            Self::AlreadyRunning => None,
        }
    }
}

pub async fn dispatch(
    directory: &dyn UserDirectory,
    action: BatchAction,
    rows: &[UserRow],
) -> BatchReport {
    let (eligible, skipped): (Vec<&UserRow>, Vec<&UserRow>) =
        rows.iter().partition(|row| action.applies_to(row));

    debug!(
        action = action.name(),
        eligible = eligible.len(),
        skipped = skipped.len(),
        "dispatching batch"
    );

    let calls = eligible.iter().map(|row| async move {
        let result = match action {
            BatchAction::Deactivate => directory.deactivate_user(&row.id).await,
            BatchAction::Reactivate => directory.reactivate_user(&row.id).await,
        };
        RowOutcome {
            id: row.id.clone(),
            result,
        }
    });

    BatchReport {
        action,
        outcomes: join_all(calls).await,
        skipped: skipped.into_iter().map(|row| row.id.clone()).collect(),
    }
}
