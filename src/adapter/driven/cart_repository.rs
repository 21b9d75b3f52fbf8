use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    Book, BookId, Cart, CartId, CartItem, CartItemId, Money, StockDelta, UserId,
};
use crate::domain::port::{
    CartItemView, CartMutation, CartRepository, CartView, RepositoryError,
};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row, Transaction};
use std::collections::HashMap;

/// MySQLカートリポジトリ
/// カートとカート行を永続化する
/// 在庫を伴うコマンドは書籍行をFOR UPDATEでロックし、
/// 在庫の検査・増減と行の書き込みを1つのトランザクションで実行する
pub struct MySqlCartRepository {
    pool: Pool<MySql>,
}

impl MySqlCartRepository {
    /// 新しいMySQLカートリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行からカートを再構築する
    fn cart_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Cart, RepositoryError> {
        let cart_id = CartId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("カートIDの解析に失敗しました: {}", e))
        })?;
        let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;
        Ok(Cart::new(cart_id, user_id))
    }

    /// データベースの行からカート行を再構築する
    fn item_from_row(row: &sqlx::mysql::MySqlRow) -> Result<CartItem, RepositoryError> {
        let item_id = CartItemId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("カート行IDの解析に失敗しました: {}", e))
        })?;
        let cart_id = CartId::from_string(row.get("cart_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("カートIDの解析に失敗しました: {}", e))
        })?;
        let book_id = BookId::from_string(row.get("book_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
        })?;
        Ok(CartItem::reconstruct(
            item_id,
            cart_id,
            book_id,
            row.get("quantity"),
        ))
    }

    /// 書籍行をロックして集約を再構築する
    /// 在庫の検査と減算を同一トランザクション内で行うための起点
    async fn lock_book(
        tx: &mut Transaction<'_, MySql>,
        book_id: BookId,
    ) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, author, photo, owner_id, price_amount, price_currency, stock
            FROM books
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(book_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("書籍行のロックに失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let owner_id = UserId::from_string(row.get("owner_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;
        let price = Money::new(row.get("price_amount"), row.get("price_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;

        Ok(Some(Book::reconstruct(
            book_id,
            row.get("title"),
            row.get("description"),
            row.get("author"),
            row.get("photo"),
            owner_id,
            price,
            row.get("stock"),
        )))
    }

    /// カート行をロックせずに読む
    /// ロック対象の書籍IDを決めるための下見で、この結果は正としない
    async fn peek_item(
        tx: &mut Transaction<'_, MySql>,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query("SELECT id, cart_id, book_id, quantity FROM cart_items WHERE id = ?")
            .bind(item_id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カート行の取得に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::item_from_row).transpose()
    }

    /// カート行をロックして読む
    /// 書籍行のロックを取得した後に呼ぶこと
    async fn lock_item(
        tx: &mut Transaction<'_, MySql>,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, cart_id, book_id, quantity FROM cart_items WHERE id = ? FOR UPDATE",
        )
        .bind(item_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート行のロックに失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::item_from_row).transpose()
    }

    /// ロック済み書籍の在庫列を更新する
    async fn write_stock(
        tx: &mut Transaction<'_, MySql>,
        book_id: BookId,
        stock: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE books SET stock = ? WHERE id = ?")
            .bind(stock)
            .bind(book_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("在庫の更新に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    /// トランザクションをコミットする
    async fn commit(tx: Transaction<'_, MySql>) -> Result<(), RepositoryError> {
        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)
    }

    /// トランザクションを開始する
    async fn begin(&self) -> Result<Transaction<'_, MySql>, RepositoryError> {
        self.pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!(
                    "トランザクション開始に失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)
    }
}

#[async_trait]
impl CartRepository for MySqlCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query("SELECT id, user_id FROM carts WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カートの取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::cart_from_row).transpose()
    }

    async fn find_or_create_for_user(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // user_idの一意制約により、並行して呼ばれても1行しか作られない
        // 既存行がある場合このINSERTは何もしない
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(CartId::new().to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カートの作成に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        self.find_by_user(user_id).await?.ok_or_else(|| {
            RepositoryError::FetchFailed("作成したカートの取得に失敗しました".to_string())
        })
    }

    async fn find_cart_by_id(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query("SELECT id, user_id FROM carts WHERE id = ?")
            .bind(cart_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カートの取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::cart_from_row).transpose()
    }

    async fn find_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query("SELECT id, cart_id, book_id, quantity FROM cart_items WHERE id = ?")
            .bind(item_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カート行の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::item_from_row).transpose()
    }

    async fn add_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartMutation, RepositoryError> {
        let mut tx = self.begin().await?;

        // 在庫の検査と減算は書籍行のロック下で行う
        let mut book = match Self::lock_book(&mut tx, book_id).await? {
            Some(book) => book,
            None => return Ok(CartMutation::NotFound),
        };

        if book.reserve(quantity).is_err() {
            // コミットしない: ロックはドロップ時に解放される
            return Ok(CartMutation::InsufficientStock);
        }
        Self::write_stock(&mut tx, book_id, book.stock()).await?;

        // 同じ書籍の行があれば数量を加算、なければ新規作成
        let existing = sqlx::query(
            r#"
            SELECT id, cart_id, book_id, quantity
            FROM cart_items
            WHERE cart_id = ? AND book_id = ?
            FOR UPDATE
            "#,
        )
        .bind(cart_id.to_string())
        .bind(book_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート行の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let item = match existing {
            Some(row) => {
                let mut item = Self::item_from_row(&row)?;
                item.increase_quantity(quantity).map_err(|e| {
                    RepositoryError::OperationFailed(format!(
                        "カート行の数量加算に失敗しました: {}",
                        e
                    ))
                })?;
                sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
                    .bind(item.quantity())
                    .bind(item.id().to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        DatabaseError::QueryError(format!("カート行の更新に失敗しました: {}", e))
                    })
                    .map_err(RepositoryError::from)?;
                item
            }
            None => {
                let item = CartItem::new(CartItemId::new(), cart_id, book_id, quantity)
                    .map_err(|e| {
                        RepositoryError::OperationFailed(format!(
                            "カート行の作成に失敗しました: {}",
                            e
                        ))
                    })?;
                sqlx::query(
                    "INSERT INTO cart_items (id, cart_id, book_id, quantity) VALUES (?, ?, ?, ?)",
                )
                .bind(item.id().to_string())
                .bind(item.cart_id().to_string())
                .bind(item.book_id().to_string())
                .bind(item.quantity())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DatabaseError::QueryError(format!("カート行の保存に失敗しました: {}", e))
                })
                .map_err(RepositoryError::from)?;
                item
            }
        };

        Self::commit(tx).await?;
        Ok(CartMutation::Applied(item))
    }

    async fn update_item_quantity(
        &self,
        item_id: CartItemId,
        new_quantity: u32,
    ) -> Result<CartMutation, RepositoryError> {
        let mut tx = self.begin().await?;

        // ロックの取得順序は全コマンドで「書籍 → カート行」に統一する
        // 書籍IDを知るため、まずロックなしで行を読む
        let book_id = match Self::peek_item(&mut tx, item_id).await? {
            Some(item) => item.book_id(),
            None => return Ok(CartMutation::NotFound),
        };

        let mut book = match Self::lock_book(&mut tx, book_id).await? {
            Some(book) => book,
            None => return Ok(CartMutation::NotFound),
        };

        // 書籍ロック取得後に行を取り直す（この読みが正となる）
        let mut item = match Self::lock_item(&mut tx, item_id).await? {
            Some(item) => item,
            None => return Ok(CartMutation::NotFound),
        };

        let delta = item.change_quantity(new_quantity).map_err(|e| {
            RepositoryError::OperationFailed(format!("カート行の数量変更に失敗しました: {}", e))
        })?;

        // 在庫へは差分のみ反映する
        match delta {
            StockDelta::Reserve(diff) => {
                if book.reserve(diff).is_err() {
                    // コミットしない: 行も在庫も元のまま
                    return Ok(CartMutation::InsufficientStock);
                }
                Self::write_stock(&mut tx, book_id, book.stock()).await?;
            }
            StockDelta::Release(diff) => {
                book.release(diff);
                Self::write_stock(&mut tx, book_id, book.stock()).await?;
            }
            StockDelta::Unchanged => {}
        }

        sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
            .bind(item.quantity())
            .bind(item.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カート行の更新に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        Self::commit(tx).await?;
        Ok(CartMutation::Applied(item))
    }

    async fn remove_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let mut tx = self.begin().await?;

        // ロックの取得順序は全コマンドで「書籍 → カート行」に統一する
        let book_id = match Self::peek_item(&mut tx, item_id).await? {
            Some(item) => item.book_id(),
            None => return Ok(false),
        };

        let mut book = match Self::lock_book(&mut tx, book_id).await? {
            Some(book) => book,
            None => return Ok(false),
        };

        let item = match Self::lock_item(&mut tx, item_id).await? {
            Some(item) => item,
            None => return Ok(false),
        };

        // 行の全数量を在庫へ解放してから削除する
        book.release(item.quantity());
        Self::write_stock(&mut tx, book_id, book.stock()).await?;

        sqlx::query("DELETE FROM cart_items WHERE id = ?")
            .bind(item.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カート行の削除に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        Self::commit(tx).await?;
        Ok(true)
    }

    async fn find_cart_views(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<CartView>, RepositoryError> {
        // INNER JOINにより、行が0件のカートは結果に含まれない
        // 利用者名はFKを張らない読み取りモデルのため、欠損時はUnknownで補う
        let base_query = r#"
            SELECT
                c.id AS cart_id, c.user_id,
                COALESCE(u.name, 'Unknown') AS user_name,
                ci.id AS cart_item_id, ci.book_id, ci.quantity,
                b.title, b.price_amount, b.price_currency, b.stock
            FROM carts c
            INNER JOIN cart_items ci ON ci.cart_id = c.id
            INNER JOIN books b ON b.id = ci.book_id
            LEFT JOIN users u ON u.id = c.user_id
        "#;

        let rows = match owner {
            Some(user_id) => {
                sqlx::query(&format!(
                    "{} WHERE c.user_id = ? ORDER BY c.id, ci.created_at",
                    base_query
                ))
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{} ORDER BY c.id, ci.created_at", base_query))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| DatabaseError::QueryError(format!("カート一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // カートIDごとにグループ化（最初に現れた順を保つ）
        let mut views: Vec<CartView> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in &rows {
            let cart_id_str: String = row.get("cart_id");

            let position = match index.get(&cart_id_str) {
                Some(&position) => position,
                None => {
                    let cart_id = CartId::from_string(&cart_id_str).map_err(|e| {
                        RepositoryError::FetchFailed(format!(
                            "カートIDの解析に失敗しました: {}",
                            e
                        ))
                    })?;
                    let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
                        RepositoryError::FetchFailed(format!(
                            "利用者IDの解析に失敗しました: {}",
                            e
                        ))
                    })?;
                    views.push(CartView {
                        cart_id,
                        user_id,
                        user_name: row.get("user_name"),
                        items: Vec::new(),
                    });
                    index.insert(cart_id_str, views.len() - 1);
                    views.len() - 1
                }
            };

            let cart_item_id = CartItemId::from_string(row.get("cart_item_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("カート行IDの解析に失敗しました: {}", e))
            })?;
            let book_id = BookId::from_string(row.get("book_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
            })?;
            let unit_price = Money::new(row.get("price_amount"), row.get("price_currency"))
                .map_err(|e| {
                    RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e))
                })?;

            views[position].items.push(CartItemView {
                cart_item_id,
                book_id,
                title: row.get("title"),
                unit_price,
                quantity: row.get("quantity"),
                stock: row.get("stock"),
            });
        }

        Ok(views)
    }
}
