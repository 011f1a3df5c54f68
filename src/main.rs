use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use guild_steward::config::AppConfig;
use guild_steward::db;
use guild_steward::db::repositories::{
    ApplicationBanRepo, ConstantRepo, GiveawayRepo, TicketRepo,
};
use guild_steward::interaction::log_only::LogOnlyInteraction;
use guild_steward::interaction::InteractionLayer;
use guild_steward::services::{
    ban_expiry::BanExpiryService, giveaway_sweep::GiveawaySweepService,
    ticket_sweep::TicketSweepService,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run migrations, print the stamped schema version and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Skip the pre-migration backup even for an existing database.
    #[arg(long)]
    no_backup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Fresh means the file did not exist before this process connected;
    // connecting with mode=rwc creates it, so check first.
    let store_file = db::sqlite_file_path(&config.database_url);
    let fresh = store_file.as_deref().is_none_or(|p| !p.exists());

    let conn = db::establish_connection(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    db::migrations::ensure_latest(
        &conn,
        fresh,
        config.backup_on_migrate && !args.no_backup,
        store_file.as_deref(),
    )
    .await
    .context("Failed to migrate database")?;

    if args.migrate_only {
        let version = db::stamped_version(&conn).await?;
        info!("Schema is at version {version}; exiting (--migrate-only)");
        return Ok(());
    }

    info!(
        "Starting sweeps (tickets every {:?}, giveaways every {:?}, bans every {:?}; warning window {}h)",
        config.ticket_sweep_interval,
        config.giveaway_sweep_interval,
        config.ban_sweep_interval,
        config.warning_window.num_hours(),
    );

    // Until a chat adapter is wired in, requested effects are only logged.
    let interaction: Arc<dyn InteractionLayer> = Arc::new(LogOnlyInteraction);

    let tickets = TicketRepo::new(conn.clone());
    let giveaways = GiveawayRepo::new(conn.clone());
    let bans = ApplicationBanRepo::new(conn.clone());
    let constants = ConstantRepo::new(conn.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ticket_sweep = Arc::new(TicketSweepService::new(
        tickets,
        constants.clone(),
        interaction.clone(),
        config.ticket_sweep_interval,
    ));
    let giveaway_sweep = Arc::new(GiveawaySweepService::new(
        giveaways,
        constants,
        interaction.clone(),
        config.giveaway_sweep_interval,
    ));
    let ban_expiry = Arc::new(BanExpiryService::new(bans, config.ban_sweep_interval));

    let handles = vec![
        ticket_sweep.start_runner(shutdown_rx.clone()),
        giveaway_sweep.start_runner(shutdown_rx.clone()),
        ban_expiry.start_runner(shutdown_rx),
    ];

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested, letting sweeps finish their tick...");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    conn.close().await.context("Failed to close database")?;
    info!("Bye.");
    Ok(())
}
