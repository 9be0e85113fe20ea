use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Card, User};

/// Durable store boundary for the ingestion pipeline. The pipeline only
/// ever appends records; updates and deletes are not part of this
/// surface.
#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    async fn exists_by_encrypted_number(&self, number: &str) -> Result<bool, sqlx::Error>;

    async fn find_by_encrypted_number(&self, number: &str) -> Result<Option<Card>, sqlx::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, sqlx::Error>;

    /// All cards for one owner, newest first by creation time.
    async fn find_all_by_owner(&self, user_id: Uuid) -> Result<Vec<Card>, sqlx::Error>;

    async fn save(&self, card: &Card) -> Result<(), sqlx::Error>;

    /// Persists one accumulation-buffer chunk. Implementations write the
    /// chunk atomically; atomicity across chunks of one file is not
    /// provided at this layer.
    async fn save_all(&self, cards: &[Card]) -> Result<(), sqlx::Error>;
}

/// Production implementation backed by the Postgres pool.
#[derive(Clone)]
pub struct PgCardRepository {
    pool: PgPool,
}

impl PgCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_CARD: &str = r#"
    INSERT INTO cards
        (id, number, holder_name, expiration_date, cvv, lote,
         processing_date, card_type, created_at, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), $9)
"#;

#[async_trait]
impl CardRepository for PgCardRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn exists_by_encrypted_number(&self, number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cards WHERE number = $1)")
            .bind(number)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_by_encrypted_number(&self, number: &str) -> Result<Option<Card>, sqlx::Error> {
        sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, sqlx::Error> {
        sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_all_by_owner(&self, user_id: Uuid) -> Result<Vec<Card>, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            "SELECT * FROM cards WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save(&self, card: &Card) -> Result<(), sqlx::Error> {
        sqlx::query(INSERT_CARD)
            .bind(card.id)
            .bind(&card.number)
            .bind(&card.holder_name)
            .bind(card.expiration_date)
            .bind(&card.cvv)
            .bind(&card.lote)
            .bind(card.processing_date)
            .bind(card.card_type)
            .bind(card.user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn save_all(&self, cards: &[Card]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for card in cards {
            sqlx::query(INSERT_CARD)
                .bind(card.id)
                .bind(&card.number)
                .bind(&card.holder_name)
                .bind(card.expiration_date)
                .bind(&card.cvv)
                .bind(&card.lote)
                .bind(card.processing_date)
                .bind(card.card_type)
                .bind(card.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
