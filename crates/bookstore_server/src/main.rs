//! Book catalog service entry point.
//!
//! Startup order: settings, logging, pool + migrations, seeding, listener.
//! Any failure before the listener binds stops the process.

use anyhow::Context;
use bookstore_core::{
    init_logging, open_pool, seed_initial_books, BookService, LogTarget, SqliteBookRepository,
};
use bookstore_server::settings::Settings;
use bookstore_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load bookstore settings")?;

    let log_target = LogTarget::from_dir(settings.logging.dir.as_deref())?;
    init_logging(settings.log_level(), log_target).context("failed to initialize logging")?;

    log::info!(
        "event=bootstrap module=main status=start env={:?} db={} version={}",
        settings.environment,
        settings.database.path.display(),
        bookstore_core::core_version()
    );

    let pool = open_pool(&settings.database.path, &settings.database.pool_options())
        .context("failed to open and migrate the book database")?;
    let repo = SqliteBookRepository::try_new(pool).context("book storage is not usable")?;
    seed_initial_books(&repo);

    let state = AppState::new(BookService::new(repo));
    bookstore_server::serve(state, &settings.server.host, settings.server.port).await
}
