use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Book, BookId, Money, UserId};
use crate::domain::port::{BookRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row};

/// MySQL書籍リポジトリ
/// MySQLデータベースを使用して書籍カタログを永続化する
pub struct MySqlBookRepository {
    pool: Pool<MySql>,
}

impl MySqlBookRepository {
    /// 新しいMySQL書籍リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から書籍集約を再構築する
    fn book_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Book, RepositoryError> {
        let book_id = BookId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
        })?;

        let owner_id = UserId::from_string(row.get("owner_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;

        let price = Money::new(row.get("price_amount"), row.get("price_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;

        Ok(Book::reconstruct(
            book_id,
            row.get("title"),
            row.get("description"),
            row.get("author"),
            row.get("photo"),
            owner_id,
            price,
            row.get("stock"),
        ))
    }
}

#[async_trait]
impl BookRepository for MySqlBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, description, author, photo, owner_id, price_amount, price_currency, stock)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                description = VALUES(description),
                author = VALUES(author),
                photo = VALUES(photo),
                price_amount = VALUES(price_amount),
                price_currency = VALUES(price_currency),
                stock = VALUES(stock)
            "#,
        )
        .bind(book.id().to_string())
        .bind(book.title())
        .bind(book.description())
        .bind(book.author())
        .bind(book.photo())
        .bind(book.owner_id().to_string())
        .bind(book.price().amount())
        .bind(book.price().currency())
        .bind(book.stock())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("書籍の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, author, photo, owner_id, price_amount, price_currency, stock
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("書籍の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::book_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        // タイトルの昇順で並べる
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, author, photo, owner_id, price_amount, price_currency, stock
            FROM books
            ORDER BY title ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("書籍一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        rows.iter().map(Self::book_from_row).collect()
    }

    fn next_identity(&self) -> BookId {
        BookId::new()
    }
}
