// API module - HTTP endpoints

pub mod cards;
pub mod health;
pub mod middleware;

use sqlx::PgPool;

use crate::config::Config;
use crate::db::PgCardRepository;
use crate::services::codec::CardCodec;

/// Shared application state. The codec is built once at startup from the
/// configured key material and is immutable for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub repo: PgCardRepository,
    pub codec: CardCodec,
    pub config: Config,
}
