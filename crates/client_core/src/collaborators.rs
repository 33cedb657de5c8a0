use async_trait::async_trait;
use shared::{
    domain::{UserId, UserRow},
    protocol::{ListUsersResponse, SearchQuery},
};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};

/// Remote user management calls. Every call fails independently; there is no batch endpoint.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(
        &self,
        limit: u32,
        offset: u64,
        queries: &[SearchQuery],
    ) -> ServiceResult<ListUsersResponse>;
    async fn deactivate_user(&self, id: &UserId) -> ServiceResult<()>;
    async fn reactivate_user(&self, id: &UserId) -> ServiceResult<()>;
    async fn remove_user(&self, id: &UserId) -> ServiceResult<()>;
}

#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn current_user_id(&self) -> Option<UserId>;
}

pub trait Notifier: Send + Sync {
    fn show_info(&self, key: &str, translate: bool);
    fn show_error(&self, error: &ServiceError);
}

#[async_trait]
pub trait ConfirmDialog: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

pub trait Navigator: Send + Sync {
    fn set_query_param(&self, key: &str, value: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    OwnAccount,
    OtherAccount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub scope: DeleteScope,
    pub confirm_key: &'static str,
    pub cancel_key: &'static str,
    pub title_key: &'static str,
    pub description_key: &'static str,
    pub confirmation_key: &'static str,
    pub confirmation: String,
}

impl ConfirmPrompt {
    pub fn delete_self(target: &UserRow) -> Self {
        Self {
            scope: DeleteScope::OwnAccount,
            confirm_key: "ACTIONS.DELETE",
            cancel_key: "ACTIONS.CANCEL",
            title_key: "USER.DIALOG.DELETE_SELF_TITLE",
            description_key: "USER.DIALOG.DELETE_SELF_DESCRIPTION",
            confirmation_key: "USER.DIALOG.TYPEUSERNAME",
            confirmation: target.preferred_login_name.clone(),
        }
    }

    pub fn delete_other(target: &UserRow) -> Self {
        Self {
            scope: DeleteScope::OtherAccount,
            title_key: "USER.DIALOG.DELETE_TITLE",
            description_key: "USER.DIALOG.DELETE_DESCRIPTION",
            ..Self::delete_self(target)
        }
    }
}

pub struct MissingAuthSession;

#[async_trait]
impl AuthSession for MissingAuthSession {
    async fn current_user_id(&self) -> Option<UserId> {
        None
    }
}

pub struct DeclineAll;

#[async_trait]
impl ConfirmDialog for DeclineAll {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        debug!(title = prompt.title_key, "confirmation declined without a dialog");
        false
    }
}

pub struct DetachedNavigator;

impl Navigator for DetachedNavigator {
    fn set_query_param(&self, key: &str, value: &str) {
        debug!(key, value, "navigation ignored");
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_info(&self, key: &str, _translate: bool) {
        info!(message = key, "notification");
    }

    fn show_error(&self, error: &ServiceError) {
        warn!(%error, "notification");
    }
}
