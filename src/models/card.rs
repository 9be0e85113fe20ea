use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Credit,
    Debit,
    Prepaid,
}

/// A persisted card record. `number` always holds the ciphertext, never
/// the primary account number; it is unique store-wide and ciphertext
/// equality is what duplicate detection relies on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub number: String,
    pub holder_name: String,
    pub expiration_date: NaiveDate,
    pub cvv: String,
    /// Batch tag (lote) for batch-ingested cards; None for individual
    /// registrations.
    pub lote: Option<String>,
    pub processing_date: Option<NaiveDate>,
    pub card_type: CardType,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Display-safe projection of a card: the number is decrypted and then
/// masked before it ever leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub id: Uuid,
    pub masked_number: String,
    pub holder_name: String,
    pub expiration_date: NaiveDate,
    pub card_type: CardType,
    pub created_at: DateTime<Utc>,
}
