use clap::Parser;
use commerce_core::application::member_service::MemberService;
use commerce_core::application::order_service::OrderService;
use commerce_core::application::payment_service::PaymentService;
use commerce_core::domain::ports::{MemberStoreBox, OrderStoreBox, PaymentStoreBox};
use commerce_core::infrastructure::gateway::SimulatedGateway;
use commerce_core::infrastructure::in_memory::{
    InMemoryMemberStore, InMemoryOrderStore, InMemoryPaymentStore,
};
use commerce_core::interfaces::csv::report_writer::ReportWriter;
use commerce_core::interfaces::script::command::CommandReader;
use commerce_core::interfaces::script::runner::ScriptRunner;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script, one JSON command per line
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "COMMERCE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Make the simulated gateway decline charges above this amount
    #[arg(long, env = "COMMERCE_DECLINE_OVER")]
    decline_over: Option<Decimal>,
}

fn setup_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn open_stores(db_path: Option<PathBuf>) -> Result<(MemberStoreBox, OrderStoreBox, PaymentStoreBox)> {
    #[cfg(feature = "storage-rocksdb")]
    {
        if let Some(db_path) = db_path {
            use commerce_core::infrastructure::rocksdb::RocksDBStore;

            let store = RocksDBStore::open(&db_path).into_diagnostic()?;
            info!(path = %db_path.display(), "using RocksDB storage");
            return Ok((
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store),
            ));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if db_path.is_some() {
            tracing::warn!(
                "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
            );
        }
    }

    Ok((
        Box::new(InMemoryMemberStore::new()),
        Box::new(InMemoryOrderStore::new()),
        Box::new(InMemoryPaymentStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let (members, orders, payments) = open_stores(cli.db_path)?;
    let gateway = Box::new(SimulatedGateway::new(cli.decline_over));

    let mut runner = ScriptRunner::new(
        Arc::new(MemberService::new(members)),
        Arc::new(OrderService::new(orders)),
        Arc::new(PaymentService::new(payments, gateway)),
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    for (line, command) in CommandReader::new(file).commands() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.run(command).await {
                    error!(line, error = %e, "failed to process command");
                }
            }
            Err(e) => {
                error!(line, error = %e, "failed to read command");
            }
        }
    }

    let (orders, payments) = runner.snapshot().await.into_diagnostic()?;
    info!(orders = orders.len(), payments = payments.len(), "script finished");

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    let label = |id: &str| runner.label_of(id);
    writer.write_orders(&orders, label).into_diagnostic()?;
    writer.write_payments(&payments, label).into_diagnostic()?;

    Ok(())
}
