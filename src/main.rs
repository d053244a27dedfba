use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use loanops::application::audited_repository::AuditedRepaymentStore;
use loanops::application::capture::ChangeCapture;
use loanops::application::queue::ReminderQueue;
use loanops::application::reminders::{ReminderEngine, ReminderOptions};
use loanops::domain::loan::{LoanApplication, Repayment, User};
use loanops::domain::ports::{AuditStore, AuditStoreRef, EntityStore, NotifierRef};
use loanops::infrastructure::in_memory::{
    InMemoryAuditStore, InMemoryLoanApplicationStore, InMemoryRepaymentStore, InMemoryUserDirectory,
};
use loanops::infrastructure::notifier::LogNotifier;
use loanops::infrastructure::worker::ReminderWorker;
use loanops::interfaces::csv::record_reader::RecordReader;
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reminder batch over CSV-loaded repayments and loan applications
    Remind(RemindArgs),
}

#[derive(Args)]
struct RemindArgs {
    /// Repayments CSV file
    #[arg(long)]
    repayments: PathBuf,

    /// Loan applications CSV file
    #[arg(long)]
    loans: Option<PathBuf>,

    /// Users CSV file; active admins receive the digest
    #[arg(long)]
    users: Option<PathBuf>,

    /// Count eligible records without sending or writing anything
    #[arg(long)]
    simulate: bool,

    /// Look-ahead window for upcoming payment reminders, in days
    #[arg(long, default_value_t = 3)]
    days: u32,

    /// Only process overdue repayments
    #[arg(long)]
    overdue_only: bool,

    /// Run as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Path to persistent audit database (optional). If provided, uses RocksDB.
    #[arg(long)]
    audit_db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Remind(args) => remind(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn remind(args: RemindArgs) -> Result<()> {
    let audit_store = open_audit_store(args.audit_db.as_deref())?;
    let capture = Arc::new(ChangeCapture::new(audit_store.clone()));

    let repayments = Arc::new(InMemoryRepaymentStore::new());
    for repayment in load::<Repayment>(&args.repayments)? {
        repayments.save(repayment).await.into_diagnostic()?;
    }

    let applications = Arc::new(InMemoryLoanApplicationStore::new());
    if let Some(path) = &args.loans {
        for application in load::<LoanApplication>(path)? {
            applications.save(application).await.into_diagnostic()?;
        }
    }

    let users = Arc::new(InMemoryUserDirectory::new());
    if let Some(path) = &args.users {
        for user in load::<User>(path)? {
            users.add(user).await;
        }
    }

    let notifier: NotifierRef = Arc::new(LogNotifier::new());
    let (queue, receiver) = ReminderQueue::channel();
    let worker = ReminderWorker::spawn(receiver, notifier.clone());

    let engine = ReminderEngine::new(
        Arc::new(AuditedRepaymentStore::new(repayments, capture)),
        applications,
        users,
        notifier,
        queue,
    );
    let options = ReminderOptions {
        simulate: args.simulate,
        look_ahead_days: args.days,
        overdue_only: args.overdue_only,
    };
    let now = match args.as_of {
        Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };

    let summary = engine.run_at(&options, now).await;

    // Dropping the engine closes the queue so the worker can finish.
    drop(engine);
    let delivered = worker.await.into_diagnostic()?;
    let audit_records = audit_store.list().await.into_diagnostic()?.len();

    println!("{summary}");
    println!("reminders_delivered,{delivered}");
    println!("audit_records,{audit_records}");
    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).into_diagnostic()?;
    let mut records = Vec::new();
    for record in RecordReader::<_, T>::new(file).records() {
        match record {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
        }
    }
    Ok(records)
}

#[cfg(feature = "storage-rocksdb")]
fn open_audit_store(path: Option<&Path>) -> Result<AuditStoreRef> {
    use loanops::infrastructure::rocksdb::RocksDbAuditStore;

    let store: AuditStoreRef = match path {
        Some(path) => Arc::new(RocksDbAuditStore::open(path).into_diagnostic()?),
        None => Arc::new(InMemoryAuditStore::new()),
    };
    Ok(store)
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_audit_store(path: Option<&Path>) -> Result<AuditStoreRef> {
    if path.is_some() {
        warn!(
            "Persistent audit storage requested via --audit-db, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    let store: AuditStoreRef = Arc::new(InMemoryAuditStore::new());
    Ok(store)
}
