use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    collaborators::DetachedNavigator, config::DEFAULT_SETTINGS_FILE, load_settings, BatchAction,
    BatchOutcome, ConfirmDialog, ConfirmPrompt, DeleteOutcome, HttpUserDirectory, Notifier,
    PageWindow, SearchKey, ServiceError, TableEvent, TableSnapshot, UserTableController,
};
use shared::{domain::UserKind, protocol::TextQueryMethod};
use tokio::sync::broadcast;
use tracing::warn;

const RELOAD_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "user-admin", about = "Browse and administer directory users")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Overrides the configured api base url.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, value_enum, default_value_t = KindArg::Human)]
    kind: KindArg,
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Human,
    Machine,
}

impl From<KindArg> for UserKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Human => UserKind::Human,
            KindArg::Machine => UserKind::Machine,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        user_name: Option<String>,
    },
    Deactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Reactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Delete {
        id: String,
    },
}

struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn show_info(&self, key: &str, _translate: bool) {
        println!("info: {key}");
    }

    fn show_error(&self, error: &ServiceError) {
        eprintln!("error: {error}");
    }
}

struct StdinConfirm;

#[async_trait]
impl ConfirmDialog for StdinConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        println!("{}", prompt.title_key);
        println!("{}", prompt.description_key);
        println!("{} [{}]:", prompt.confirmation_key, prompt.confirmation);

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match line {
            Ok(Ok(line)) => line.trim() == prompt.confirmation,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to read confirmation");
                false
            }
            Err(err) => {
                warn!(error = %err, "confirmation reader stopped");
                false
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    let table_settings = settings.table();

    let directory =
        Arc::new(HttpUserDirectory::from_settings(&settings).context("invalid console settings")?);
    let table = UserTableController::new_with_dependencies(
        directory.clone(),
        directory,
        Arc::new(StdoutNotifier),
        Arc::new(StdinConfirm),
        Arc::new(DetachedNavigator),
        table_settings,
    );

    let extra = match &cli.command {
        Command::List {
            user_name: Some(name),
        } => vec![SearchKey::UserName.query(name.clone(), TextQueryMethod::ContainsIgnoreCase)],
        _ => Vec::new(),
    };
    let window = PageWindow::new(table_settings.page_size, cli.page);
    table.load(window, cli.kind.into(), extra).await;

    let result = match cli.command {
        Command::List { .. } => {
            print_page(&table.snapshot().await);
            Ok(())
        }
        Command::Deactivate { ids } => run_batch(&table, BatchAction::Deactivate, &ids).await,
        Command::Reactivate { ids } => run_batch(&table, BatchAction::Reactivate, &ids).await,
        Command::Delete { id } => delete(&table, &id).await,
    };

    table.shutdown();
    result
}

fn print_page(snapshot: &TableSnapshot) {
    for row in &snapshot.rows {
        println!(
            "{:<24} {:<12} {:<32} {}",
            row.id.as_str(),
            format!("{:?}", row.state),
            row.preferred_login_name,
            row.email.as_deref().unwrap_or("-")
        );
    }
    println!(
        "page {} of {} ({} total)",
        snapshot.window.page_index + 1,
        snapshot.window.page_count(snapshot.total_result),
        snapshot.total_result
    );
}

async fn select_rows(table: &UserTableController, ids: &[String]) -> Result<()> {
    let mut selected = 0;
    for id in ids {
        if table.toggle_row(&id.as_str().into()).await {
            selected += 1;
        } else {
            warn!(user_id = %id, "user is not on the current page");
        }
    }
    if selected == 0 {
        bail!("none of the given users are on the current page");
    }
    Ok(())
}

async fn run_batch(
    table: &Arc<UserTableController>,
    action: BatchAction,
    ids: &[String],
) -> Result<()> {
    select_rows(table, ids).await?;
    let mut events = table.subscribe_events();

    let outcome = match action {
        BatchAction::Deactivate => table.deactivate_selected().await,
        BatchAction::Reactivate => table.reactivate_selected().await,
    };

    match outcome {
        BatchOutcome::Succeeded(report) => {
            println!(
                "{}: {} applied, {} skipped",
                action.name(),
                report.outcomes.len(),
                report.skipped.len()
            );
            wait_for_reload(table, &mut events).await;
            Ok(())
        }
        BatchOutcome::Failed(report) => {
            for failed in report.failed() {
                if let Err(err) = &failed.result {
                    eprintln!("{}: {err}", failed.id);
                }
            }
            bail!(
                "{} failed for {} of {} users",
                action.name(),
                report.failed().count(),
                report.outcomes.len()
            )
        }
        BatchOutcome::AlreadyRunning => bail!("{} is already running", action.name()),
    }
}

async fn delete(table: &Arc<UserTableController>, id: &str) -> Result<()> {
    let Some(target) = table
        .snapshot()
        .await
        .rows
        .into_iter()
        .find(|row| row.id.as_str() == id)
    else {
        bail!("user {id} is not on the current page");
    };
    let mut events = table.subscribe_events();

    match table.delete_user(&target).await {
        DeleteOutcome::Deleted => {
            wait_for_reload(table, &mut events).await;
            Ok(())
        }
        DeleteOutcome::Declined => {
            println!("delete cancelled");
            Ok(())
        }
        DeleteOutcome::Failed(err) => Err(err).context("delete failed"),
        DeleteOutcome::Skipped => bail!("user {id} has no id"),
    }
}

async fn wait_for_reload(
    table: &UserTableController,
    events: &mut broadcast::Receiver<TableEvent>,
) {
    let deadline = table.settings().settling_delay + RELOAD_GRACE;
    let reloaded = tokio::time::timeout(deadline, async {
        loop {
            match events.recv().await {
                Ok(TableEvent::PageLoaded { .. }) => return true,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    })
    .await;

    match reloaded {
        Ok(true) => print_page(&table.snapshot().await),
        Ok(false) | Err(_) => warn!("reload did not complete; listing may be stale"),
    }
}
