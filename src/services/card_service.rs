use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::CardRepository;
use crate::error::{AppError, Result};
use crate::models::{Card, CardType, CardView};
use crate::services::batch_file::{extract_card_number, BatchFile};
use crate::services::codec::{self, CardCodec};
use crate::services::validation;

/// Buffered records are flushed to the repository in chunks of this size.
const BATCH_SIZE: usize = 100;

/// The batch file format carries neither a cvv nor an expiration date;
/// ingested rows get fixed placeholders.
const PLACEHOLDER_CVV: &str = "000";

fn placeholder_expiration() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).expect("valid placeholder date")
}

/// Candidate for single-card registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRequest {
    pub number: String,
    pub holder_name: String,
    pub expiration_date: NaiveDate,
    pub cvv: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
}

/// Outcome of one batch-file ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessingResult {
    pub processed_count: usize,
    pub lines_read: usize,
    pub batch_tag: String,
}

/// Registers a single card for the given owner.
///
/// The store-wide duplicate check runs on the ciphertext before
/// validation, so a duplicate of an otherwise-invalid number still
/// reports as a duplicate.
#[tracing::instrument(skip_all, fields(username = %username))]
pub async fn register_card(
    repo: &impl CardRepository,
    codec: &CardCodec,
    request: CardRequest,
    username: &str,
) -> Result<()> {
    let user = repo
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {username} not found")))?;

    let encrypted = codec.encrypt(&request.number)?;
    if repo.exists_by_encrypted_number(&encrypted).await? {
        return Err(AppError::Duplicate("Card already registered".to_string()));
    }

    validation::validate_card(&request, Utc::now().date_naive())
        .map_err(|e| AppError::InvalidCard(e.to_string()))?;

    let card = Card {
        id: Uuid::new_v4(),
        number: encrypted,
        holder_name: request.holder_name,
        expiration_date: request.expiration_date,
        cvv: request.cvv,
        lote: None,
        processing_date: None,
        card_type: request.card_type,
        created_at: Utc::now(),
        user_id: user.id,
    };

    repo.save(&card).await?;
    tracing::info!(card_id = %card.id, "Card registered");

    Ok(())
}

/// Ingests a fixed-width batch file for the given owner.
///
/// `lines_read` counts every physical line consumed, header included.
/// `processed_count` counts every line whose embedded number has an
/// accepted length, duplicates included; duplicates are logged and
/// skipped, never failures. Fresh records accumulate in a buffer flushed
/// to the repository's batched write every [`BATCH_SIZE`] rows, plus a
/// final partial flush. Iteration stops once `processed_count` reaches
/// the header's expected record count or the input is exhausted.
///
/// The duplicate set is local to this call. Known limitation: two
/// concurrent uploads carrying the same new number can each pass the
/// store-existence check before either commits, so store-wide ciphertext
/// uniqueness is not guaranteed under concurrency at this layer.
#[tracing::instrument(skip_all, fields(username = %username, bytes = bytes.len()))]
pub async fn ingest_batch_file(
    repo: &impl CardRepository,
    codec: &CardCodec,
    bytes: &[u8],
    username: &str,
) -> Result<ProcessingResult> {
    let user = repo
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {username} not found")))?;

    let text = String::from_utf8_lossy(bytes);
    let mut file = BatchFile::parse(&text)?;
    let header = file.header.clone();
    let expiration = placeholder_expiration();

    tracing::info!(
        batch_tag = %header.batch_tag,
        expected = header.expected_record_count,
        "Batch header parsed"
    );

    let mut buffer: Vec<Card> = Vec::with_capacity(BATCH_SIZE);
    let mut seen_in_call: HashSet<String> = HashSet::new();
    let mut processed_count = 0usize;
    let mut lines_read = 1usize;

    while processed_count < header.expected_record_count {
        let Some(line) = file.next() else { break };
        lines_read += 1;

        // Lines without a plausibly-sized number are skipped silently;
        // they count toward lines_read but not processed_count.
        let Some(number) = extract_card_number(line) else {
            continue;
        };
        processed_count += 1;

        let encrypted = codec.encrypt(&number)?;
        if seen_in_call.contains(&encrypted)
            || repo.exists_by_encrypted_number(&encrypted).await?
        {
            tracing::info!(ciphertext = %encrypted, "Card number already exists");
            continue;
        }

        buffer.push(Card {
            id: Uuid::new_v4(),
            number: encrypted.clone(),
            holder_name: header.batch_name.clone(),
            expiration_date: expiration,
            cvv: PLACEHOLDER_CVV.to_string(),
            lote: Some(header.batch_tag.clone()),
            processing_date: Some(header.processing_date),
            card_type: CardType::Credit,
            created_at: Utc::now(),
            user_id: user.id,
        });
        seen_in_call.insert(encrypted);

        if buffer.len() >= BATCH_SIZE {
            repo.save_all(&buffer).await?;
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        repo.save_all(&buffer).await?;
    }

    tracing::info!(
        batch_tag = %header.batch_tag,
        processed_count,
        lines_read,
        "Batch file ingested"
    );

    Ok(ProcessingResult {
        processed_count,
        lines_read,
        batch_tag: header.batch_tag,
    })
}

/// All cards registered by an owner, newest first, numbers masked.
pub async fn get_cards_by_owner(
    repo: &impl CardRepository,
    codec: &CardCodec,
    user_id: Uuid,
) -> Result<Vec<CardView>> {
    let cards = repo.find_all_by_owner(user_id).await?;

    cards.iter().map(|card| to_view(codec, card)).collect()
}

/// Looks up one card by id. Note: this path performs no ownership check;
/// any identified caller can fetch any card's masked view by id, unlike
/// [`find_by_card_number`].
pub async fn get_card_by_id(
    repo: &impl CardRepository,
    codec: &CardCodec,
    card_id: Uuid,
) -> Result<CardView> {
    let card = repo
        .find_by_id(card_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Card {card_id} not found")))?;

    to_view(codec, &card)
}

/// Looks up a card by its plaintext number, enforcing that the record
/// belongs to the requester.
#[tracing::instrument(skip_all, fields(username = %requester_username))]
pub async fn find_by_card_number(
    repo: &impl CardRepository,
    codec: &CardCodec,
    number: &str,
    requester_username: &str,
) -> Result<CardView> {
    let encrypted = codec.encrypt(number)?;

    let card = repo
        .find_by_encrypted_number(&encrypted)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;

    let requester = repo
        .find_user_by_username(requester_username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {requester_username} not found")))?;

    if card.user_id != requester.id {
        return Err(AppError::Ownership);
    }

    to_view(codec, &card)
}

/// Decrypt-then-mask projection. Neither the ciphertext nor the raw
/// number leaves this function.
fn to_view(codec: &CardCodec, card: &Card) -> Result<CardView> {
    let number = codec.decrypt(&card.number)?;

    Ok(CardView {
        id: card.id,
        masked_number: codec::mask(&number),
        holder_name: card.holder_name.clone(),
        expiration_date: card.expiration_date,
        card_type: card.card_type,
        created_at: card.created_at,
    })
}
