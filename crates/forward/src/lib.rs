//! Cross-channel message forwarding with two-way reply relay.
//!
//! Messages posted in a source channel are copied to each of its targets,
//! prefixed with the author's name. A reply quoting one of those copies is
//! routed back to the source channel only, for as long as the reply window
//! (`reply_timeout`) is open.
//!
//! Targets come from static `[[forward.rules]]` (config mode) or from
//! per-channel lists edited with `forward add|remove|clear` (database mode).

pub mod address;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod interceptor;
pub mod mention;
pub mod relay_table;
pub mod service;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod targets;
pub mod types;

pub use {
    address::{format_address, parse_address},
    commands::{CommandReply, ForwardCommand},
    dispatch::Dispatcher,
    error::{Error, Result},
    interceptor::{Disposition, ReplyInterceptor},
    relay_table::RelayTable,
    service::Forwarder,
    store::ForwardStore,
    store_memory::MemoryForwardStore,
    store_sqlite::SqliteForwardStore,
    targets::{TargetResolver, TargetSource, TargetUpdate},
    types::{ForwardTarget, RelayEntry},
};

/// Run database migrations for the forward crate.
///
/// Creates the `forward_channels` table. Call at startup before using
/// [`SqliteForwardStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
