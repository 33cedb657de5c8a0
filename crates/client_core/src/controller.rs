use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::{
    domain::{UserId, UserKind, UserRow},
    protocol::SearchQuery,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinSet,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    batch::{self, BatchAction, BatchOutcome},
    collaborators::{
        AuthSession, ConfirmDialog, ConfirmPrompt, DeclineAll, DetachedNavigator,
        MissingAuthSession, Navigator, Notifier, UserDirectory,
    },
    config::TableSettings,
    error::ServiceError,
    events::TableEvent,
    paginator::PageWindow,
    query::{self, SearchKey},
    selection::Selection,
};

const DELETED_KEY: &str = "USER.TOAST.DELETED";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitParams {
    pub kind: Option<UserKind>,
    pub deferred_reload: bool,
}

impl InitParams {
    pub fn from_query<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let params: HashMap<&str, &str> = params.into_iter().collect();
        Self {
            kind: params.get("type").map(|v| UserKind::from_query_value(v)),
            deferred_reload: params
                .get("deferredReload")
                .is_some_and(|v| !matches!(v.trim(), "" | "0" | "false")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    Failed(ServiceError),
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub window: PageWindow,
    pub kind: UserKind,
    pub active_queries: Vec<SearchQuery>,
    pub search_key: Option<SearchKey>,
    pub rows: Vec<UserRow>,
    pub total_result: u64,
    pub view_timestamp: Option<DateTime<Utc>>,
    pub selected: Vec<UserRow>,
    pub loading: bool,
}

struct TableState {
    window: PageWindow,
    kind: UserKind,
    active_queries: Vec<SearchQuery>,
    search_key: Option<SearchKey>,
    rows: Vec<UserRow>,
    total_result: u64,
    view_timestamp: Option<DateTime<Utc>>,
    selection: Selection,
    issued_loads: u64,
    loading: bool,
}

pub struct UserTableController {
    directory: Arc<dyn UserDirectory>,
    session: Arc<dyn AuthSession>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn ConfirmDialog>,
    navigator: Arc<dyn Navigator>,
    settings: TableSettings,
    inner: Mutex<TableState>,
    in_flight: StdMutex<HashSet<BatchAction>>,
    reloads: StdMutex<JoinSet<()>>,
    torn_down: AtomicBool,
    events: broadcast::Sender<TableEvent>,
}

struct InFlightGuard<'a> {
    actions: &'a StdMutex<HashSet<BatchAction>>,
    action: BatchAction,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock_std(self.actions).remove(&self.action);
    }
}

fn lock_std<T>(mutex: &StdMutex<T>) -> StdMutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UserTableController {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        settings: TableSettings,
    ) -> Arc<Self> {
        Self::new_with_dependencies(
            directory,
            Arc::new(MissingAuthSession),
            notifier,
            Arc::new(DeclineAll),
            Arc::new(DetachedNavigator),
            settings,
        )
    }

    pub fn new_with_dependencies(
        directory: Arc<dyn UserDirectory>,
        session: Arc<dyn AuthSession>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn ConfirmDialog>,
        navigator: Arc<dyn Navigator>,
        settings: TableSettings,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Arc::new(Self {
            directory,
            session,
            notifier,
            confirm,
            navigator,
            settings,
            inner: Mutex::new(TableState {
                window: PageWindow::first(settings.page_size),
                kind: UserKind::Human,
                active_queries: Vec::new(),
                search_key: None,
                rows: Vec::new(),
                total_result: 0,
                view_timestamp: None,
                selection: Selection::new(),
                issued_loads: 0,
                loading: false,
            }),
            in_flight: StdMutex::new(HashSet::new()),
            reloads: StdMutex::new(JoinSet::new()),
            torn_down: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> TableSettings {
        self.settings
    }

    pub async fn snapshot(&self) -> TableSnapshot {
        let guard = self.inner.lock().await;
        TableSnapshot {
            window: guard.window,
            kind: guard.kind,
            active_queries: guard.active_queries.clone(),
            search_key: guard.search_key,
            rows: guard.rows.clone(),
            total_result: guard.total_result,
            view_timestamp: guard.view_timestamp,
            selected: guard.selection.selected(),
            loading: guard.loading,
        }
    }

    pub async fn init(self: &Arc<Self>, params: InitParams) {
        {
            let mut guard = self.inner.lock().await;
            if let Some(kind) = params.kind {
                guard.kind = kind;
            }
            guard.window = guard.window.with_index(0);
        }

        if params.deferred_reload {
            self.schedule_reload(self.settings.deferred_reload_delay);
        }
        self.fetch().await;
    }

    pub async fn load(&self, window: PageWindow, kind: UserKind, extra: Vec<SearchQuery>) {
        {
            let mut guard = self.inner.lock().await;
            guard.window = window;
            guard.kind = kind;
            guard.active_queries = extra;
        }
        self.fetch().await;
    }

    pub async fn refresh(&self) {
        self.fetch().await;
    }

    pub async fn set_kind(&self, kind: UserKind) {
        self.navigator
            .set_query_param("type", kind.as_query_value());
        {
            let mut guard = self.inner.lock().await;
            guard.kind = kind;
            guard.window = guard.window.with_index(0);
            guard.active_queries.clear();
            guard.search_key = None;
            if guard.selection.clear() {
                self.publish_selection(&guard.selection);
            }
        }
        self.fetch().await;
    }

    pub async fn change_page(&self, window: PageWindow) {
        {
            let mut guard = self.inner.lock().await;
            if guard.selection.clear() {
                self.publish_selection(&guard.selection);
            }
            guard.window = window;
        }
        self.fetch().await;
    }

    pub async fn apply_search_query(&self, queries: Vec<SearchQuery>) {
        {
            let mut guard = self.inner.lock().await;
            if guard.selection.clear() {
                self.publish_selection(&guard.selection);
            }
            guard.active_queries = queries;
        }
        self.fetch().await;
    }

    pub async fn set_filter(&self, key: SearchKey) {
        let closed = {
            let mut guard = self.inner.lock().await;
            if guard.search_key == Some(key) {
                guard.search_key = None;
                if !guard.active_queries.is_empty() {
                    guard.active_queries.clear();
                    if guard.selection.clear() {
                        self.publish_selection(&guard.selection);
                    }
                }
                true
            } else {
                guard.search_key = Some(key);
                false
            }
        };

        let focus = if closed { None } else { Some(key) };
        let _ = self.events.send(TableEvent::FocusRequested(focus));

        if closed {
            self.fetch().await;
        }
    }

    /// Toggles a displayed row. Returns `false` when `id` is not on the current page.
    pub async fn toggle_row(&self, id: &UserId) -> bool {
        let mut guard = self.inner.lock().await;
        let Some(row) = guard.rows.iter().find(|row| &row.id == id).cloned() else {
            return false;
        };
        guard.selection.toggle(&row);
        self.publish_selection(&guard.selection);
        true
    }

    pub async fn toggle_all(&self) {
        let mut guard = self.inner.lock().await;
        let TableState {
            rows, selection, ..
        } = &mut *guard;
        if selection.master_toggle(rows) {
            self.publish_selection(selection);
        }
    }

    pub async fn clear_selection(&self) {
        let mut guard = self.inner.lock().await;
        if guard.selection.clear() {
            self.publish_selection(&guard.selection);
        }
    }

    pub async fn is_all_selected(&self) -> bool {
        let guard = self.inner.lock().await;
        guard.selection.is_all_selected(guard.rows.len())
    }

    pub async fn selected_rows(&self) -> Vec<UserRow> {
        self.inner.lock().await.selection.selected()
    }

    pub async fn deactivate_selected(self: &Arc<Self>) -> BatchOutcome {
        self.run_batch(BatchAction::Deactivate).await
    }

    pub async fn reactivate_selected(self: &Arc<Self>) -> BatchOutcome {
        self.run_batch(BatchAction::Reactivate).await
    }

    pub async fn delete_user(self: &Arc<Self>, target: &UserRow) -> DeleteOutcome {
        if target.id.is_empty() {
            return DeleteOutcome::Skipped;
        }

        let is_me = self.session.current_user_id().await.as_ref() == Some(&target.id);
        let prompt = if is_me {
            ConfirmPrompt::delete_self(target)
        } else {
            ConfirmPrompt::delete_other(target)
        };

        if !self.confirm.confirm(&prompt).await {
            debug!(user_id = %target.id, "delete declined");
            return DeleteOutcome::Declined;
        }

        match self.directory.remove_user(&target.id).await {
            Ok(()) => {
                info!(user_id = %target.id, own_account = is_me, "user removed");
                self.schedule_reload(self.settings.settling_delay);
                self.notifier.show_info(DELETED_KEY, true);
                DeleteOutcome::Deleted
            }
            Err(err) => {
                warn!(user_id = %target.id, error = %err, "failed to remove user");
                self.notifier.show_error(&err);
                DeleteOutcome::Failed(err)
            }
        }
    }

    pub fn shutdown(&self) {
        self.torn_down.store(true, Ordering::Release);
        lock_std(&self.reloads).abort_all();
    }

    pub fn pending_reloads(&self) -> usize {
        let mut reloads = lock_std(&self.reloads);
        while reloads.try_join_next().is_some() {}
        reloads.len()
    }

    async fn run_batch(self: &Arc<Self>, action: BatchAction) -> BatchOutcome {
        let _in_flight = {
            let mut actions = lock_std(&self.in_flight);
            if !actions.insert(action) {
                debug!(action = action.name(), "batch already dispatching");
                return BatchOutcome::AlreadyRunning;
            }
            InFlightGuard {
                actions: &self.in_flight,
                action,
            }
        };

        let rows = self.inner.lock().await.selection.selected();
        let report = batch::dispatch(self.directory.as_ref(), action, &rows).await;

        if report.is_success() {
            info!(
                action = action.name(),
                applied = report.outcomes.len(),
                skipped = report.skipped.len(),
                "batch applied"
            );
            self.notifier.show_info(action.success_key(), true);
            self.clear_selection().await;
            self.schedule_reload(self.settings.settling_delay);
            BatchOutcome::Succeeded(report)
        } else {
            warn!(
                action = action.name(),
                failed = report.failed().count(),
                succeeded = report.succeeded().count(),
                "batch failed; succeeded rows are not rolled back"
            );
            if let Some(err) = report.first_error() {
                self.notifier.show_error(err);
            }
            BatchOutcome::Failed(report)
        }
    }

    async fn fetch(&self) {
        let (seq, window, kind, extra) = {
            let mut guard = self.inner.lock().await;
            guard.issued_loads += 1;
            self.set_loading(&mut guard, true);
            (
                guard.issued_loads,
                guard.window,
                guard.kind,
                guard.active_queries.clone(),
            )
        };

        let queries = query::compose(kind, &extra);
        debug!(
            seq,
            limit = window.limit(),
            offset = window.offset(),
            predicates = queries.len(),
            "listing users"
        );
        let result = self
            .directory
            .list_users(window.limit(), window.offset(), &queries)
            .await;

        let failure = {
            let mut guard = self.inner.lock().await;
            if seq != guard.issued_loads {
                debug!(seq, latest = guard.issued_loads, "discarding stale list response");
                if let Err(err) = result {
                    drop(guard);
                    warn!(error = %err, seq, "superseded list request failed");
                    self.notifier.show_error(&err);
                }
                return;
            }

            let failure = match result {
                Ok(response) => {
                    guard.total_result = response.total_result().unwrap_or(0);
                    if let Some(ts) = response.view_timestamp() {
                        guard.view_timestamp = Some(ts);
                    }
                    guard.rows = response.rows();
                    let TableState {
                        rows, selection, ..
                    } = &mut *guard;
                    selection.refresh_from(rows);
                    let _ = self.events.send(TableEvent::PageLoaded {
                        total: guard.total_result,
                        rows: guard.rows.len(),
                    });
                    None
                }
                Err(err) => Some(err),
            };
            self.set_loading(&mut guard, false);
            failure
        };

        if let Some(err) = failure {
            warn!(error = %err, "failed to list users");
            self.notifier.show_error(&err);
        }
    }

    fn schedule_reload(self: &Arc<Self>, delay: Duration) {
        let mut reloads = lock_std(&self.reloads);
        if self.torn_down.load(Ordering::Acquire) {
            debug!("table shut down; reload not scheduled");
            return;
        }
        while reloads.try_join_next().is_some() {}

        let deadline = Instant::now() + delay;
        let table = Arc::downgrade(self);
        reloads.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(table) = table.upgrade() {
                table.refresh().await;
            }
        });
        debug!(delay_ms = delay.as_millis() as u64, "reload scheduled");
    }

    fn set_loading(&self, state: &mut TableState, loading: bool) {
        if state.loading != loading {
            state.loading = loading;
            let _ = self.events.send(TableEvent::LoadingChanged(loading));
        }
    }

    fn publish_selection(&self, selection: &Selection) {
        let _ = self
            .events
            .send(TableEvent::SelectionChanged(selection.selected()));
    }
}
