//! Transactions repository (read side)

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::transaction::TransactionDetails};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

const DETAILS_QUERY: &str = r#"
    SELECT t.id, t.user_id, u.name AS user_name,
           t.book_id, b.title AS book_title, b.author AS book_author,
           t.borrowed_date, t.return_date
    FROM transactions t
    JOIN users u ON u.id = t.user_id
    JOIN books b ON b.id = t.book_id
"#;

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Transactions of one user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetails>(&format!(
            "{} WHERE t.user_id = $1 ORDER BY t.borrowed_date DESC",
            DETAILS_QUERY
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All transactions, newest first
    pub async fn list_all(&self) -> AppResult<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetails>(&format!(
            "{} ORDER BY t.borrowed_date DESC",
            DETAILS_QUERY
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
