use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    BookId, CartId, CheckoutLine, Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus,
    PaymentMethod, PaymentStatus, ShippingAddress, UserId,
};
use crate::domain::port::{
    InvoiceView, OrderItemView, OrderPlacement, OrderRepository, OrderTransition, OrderUserView,
    OrderView, RepositoryError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool, Row};
use std::collections::HashMap;

/// MySQL注文リポジトリ
/// 注文集約を永続化する
/// 確定時のカート消し込みとキャンセル時の在庫復元は、
/// 注文自体の書き込みと同一トランザクションで実行する
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// JOINされた結果の行から注文集約を再構築する
    /// すべての行が同じ注文に属している前提
    fn order_from_rows(rows: &[sqlx::mysql::MySqlRow]) -> Result<Order, RepositoryError> {
        let first_row = &rows[0];

        let order_id = OrderId::from_string(first_row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e))
        })?;
        let user_id = UserId::from_string(first_row.get("user_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;
        let total_price = Money::new(first_row.get("total_amount"), first_row.get("total_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;
        let status = OrderStatus::from_string(first_row.get("status")).map_err(|e| {
            RepositoryError::FetchFailed(format!("注文ステータスの解析に失敗しました: {}", e))
        })?;
        let payment_method =
            PaymentMethod::from_string(first_row.get("payment_method")).map_err(|e| {
                RepositoryError::FetchFailed(format!("支払い方法の解析に失敗しました: {}", e))
            })?;
        let payment_status =
            PaymentStatus::from_string(first_row.get("payment_status")).map_err(|e| {
                RepositoryError::FetchFailed(format!(
                    "支払いステータスの解析に失敗しました: {}",
                    e
                ))
            })?;
        let shipping_address = ShippingAddress::from_json(first_row.get("shipping_address"))
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("配送先住所の構築に失敗しました: {}", e))
            })?;
        let created_at: DateTime<Utc> = first_row.get("created_at");

        // 注文明細を再構築
        let mut items = Vec::new();
        for row in rows {
            if let Some(item_id_str) = row.get::<Option<String>, _>("order_item_id") {
                let item_id = OrderItemId::from_string(&item_id_str).map_err(|e| {
                    RepositoryError::FetchFailed(format!("注文明細IDの解析に失敗しました: {}", e))
                })?;
                let book_id = BookId::from_string(row.get("book_id")).map_err(|e| {
                    RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
                })?;
                let unit_price =
                    Money::new(row.get("unit_price_amount"), row.get("unit_price_currency"))
                        .map_err(|e| {
                            RepositoryError::FetchFailed(format!(
                                "金額の構築に失敗しました: {}",
                                e
                            ))
                        })?;
                items.push(OrderItem::reconstruct(
                    item_id,
                    order_id,
                    book_id,
                    row.get("quantity"),
                    unit_price,
                ));
            }
        }

        Ok(Order::reconstruct(
            order_id,
            user_id,
            items,
            total_price,
            status,
            payment_method,
            payment_status,
            shipping_address,
            created_at,
        ))
    }

    /// JOINされた結果の行から注文の読み取りモデルを1件構築する
    fn view_from_rows(rows: &[&sqlx::mysql::MySqlRow]) -> Result<OrderView, RepositoryError> {
        let first_row = rows[0];

        let order_id = OrderId::from_string(first_row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e))
        })?;
        let user_id = UserId::from_string(first_row.get("user_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;
        let status = OrderStatus::from_string(first_row.get("status")).map_err(|e| {
            RepositoryError::FetchFailed(format!("注文ステータスの解析に失敗しました: {}", e))
        })?;
        let payment_method =
            PaymentMethod::from_string(first_row.get("payment_method")).map_err(|e| {
                RepositoryError::FetchFailed(format!("支払い方法の解析に失敗しました: {}", e))
            })?;
        let payment_status =
            PaymentStatus::from_string(first_row.get("payment_status")).map_err(|e| {
                RepositoryError::FetchFailed(format!(
                    "支払いステータスの解析に失敗しました: {}",
                    e
                ))
            })?;
        let total_price = Money::new(first_row.get("total_amount"), first_row.get("total_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;
        let shipping_address = ShippingAddress::from_json(first_row.get("shipping_address"))
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("配送先住所の構築に失敗しました: {}", e))
            })?;
        let created_at: DateTime<Utc> = first_row.get("created_at");

        let mut items = Vec::new();
        for row in rows {
            if let Some(item_id_str) = row.get::<Option<String>, _>("order_item_id") {
                let order_item_id = OrderItemId::from_string(&item_id_str).map_err(|e| {
                    RepositoryError::FetchFailed(format!("注文明細IDの解析に失敗しました: {}", e))
                })?;
                let unit_price =
                    Money::new(row.get("unit_price_amount"), row.get("unit_price_currency"))
                        .map_err(|e| {
                            RepositoryError::FetchFailed(format!(
                                "金額の構築に失敗しました: {}",
                                e
                            ))
                        })?;
                items.push(OrderItemView {
                    order_item_id,
                    title: row.get("title"),
                    unit_price,
                    quantity: row.get("quantity"),
                });
            }
        }

        Ok(OrderView {
            order_id,
            user: Some(OrderUserView {
                id: user_id,
                name: first_row.get("user_name"),
            }),
            status,
            payment_method,
            payment_status,
            total_price,
            shipping_address,
            created_at,
            items,
        })
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn place_from_cart(
        &self,
        order_id: OrderId,
        user_id: UserId,
        cart_id: CartId,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderPlacement, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!(
                    "トランザクション開始に失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        // カート行はロックして読む。読み取りと末尾の消し込みが同一
        // トランザクションのため、並行するカート投入は行が消えるか残るかの
        // どちらかになり、予約だけが失われることはない
        // ロック対象はカート行のみ（書籍行は投入コマンド側がロックする）
        let rows = sqlx::query(
            r#"
            SELECT ci.book_id, ci.quantity, b.price_amount, b.price_currency
            FROM cart_items ci
            INNER JOIN books b ON b.id = ci.book_id
            WHERE ci.cart_id = ?
            ORDER BY ci.created_at
            FOR UPDATE OF ci
            "#,
        )
        .bind(cart_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート行のロックに失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let book_id = BookId::from_string(row.get("book_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
            })?;
            let unit_price = Money::new(row.get("price_amount"), row.get("price_currency"))
                .map_err(|e| {
                    RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e))
                })?;
            lines.push(CheckoutLine {
                book_id,
                quantity: row.get("quantity"),
                unit_price,
            });
        }

        let order = match Order::from_cart(order_id, user_id, &lines, shipping_address,
            payment_method)
        {
            Ok(order) => order,
            // コミットしない: 何も変更されていない
            Err(err) => return Ok(OrderPlacement::Rejected(err)),
        };

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, total_currency, status, payment_method, payment_status, shipping_address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.user_id().to_string())
        .bind(order.total_price().amount())
        .bind(order.total_price().currency())
        .bind(order.status().to_string())
        .bind(order.payment_method().to_string())
        .bind(order.payment_status().to_string())
        .bind(order.shipping_address().to_json())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 明細はスナップショット単価ごと保存する
        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, book_id, quantity, unit_price_amount, unit_price_currency)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.id().to_string())
            .bind(item.order_id().to_string())
            .bind(item.book_id().to_string())
            .bind(item.quantity())
            .bind(item.unit_price().amount())
            .bind(item.unit_price().currency())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("注文明細の保存に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;
        }

        // 確定と同時にカート行を消し込む（カート自体は空のまま残る）
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カート行の消し込みに失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(OrderPlacement::Placed(order))
    }

    async fn transition(
        &self,
        order_id: OrderId,
        new_status: Option<OrderStatus>,
        new_payment_status: Option<PaymentStatus>,
    ) -> Result<OrderTransition, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!(
                    "トランザクション開始に失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        // 注文行をロックしてから集約を再構築する
        // 並行する遷移はここで直列化され、補償の二重適用を防ぐ
        let rows = sqlx::query(
            r#"
            SELECT
                o.id, o.user_id, o.total_amount, o.total_currency,
                o.status, o.payment_method, o.payment_status, o.shipping_address, o.created_at,
                oi.id AS order_item_id, oi.book_id, oi.quantity,
                oi.unit_price_amount, oi.unit_price_currency
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.id = ?
            FOR UPDATE
            "#,
        )
        .bind(order_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文行のロックに失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        if rows.is_empty() {
            return Ok(OrderTransition::NotFound);
        }

        let mut order = Self::order_from_rows(&rows)?;

        let restorations = match order.transition(new_status, new_payment_status) {
            Ok(restorations) => restorations,
            Err(err) => return Ok(OrderTransition::Rejected(err)),
        };

        // キャンセル補償: 明細の数量を在庫へ戻す
        for restoration in &restorations {
            sqlx::query("UPDATE books SET stock = stock + ? WHERE id = ?")
                .bind(restoration.quantity)
                .bind(restoration.book_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DatabaseError::QueryError(format!("在庫の復元に失敗しました: {}", e))
                })
                .map_err(RepositoryError::from)?;
        }

        sqlx::query("UPDATE orders SET status = ?, payment_status = ? WHERE id = ?")
            .bind(order.status().to_string())
            .bind(order.payment_status().to_string())
            .bind(order.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("注文の更新に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(OrderTransition::Applied(order))
    }

    async fn find_order_views(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<OrderView>, RepositoryError> {
        // 作成日時の降順。キャンセル済みも除外しない
        // 利用者名はFKを張らない読み取りモデルのため、欠損時はUnknownで補う
        let base_query = r#"
            SELECT
                o.id, o.user_id, o.total_amount, o.total_currency,
                o.status, o.payment_method, o.payment_status, o.shipping_address, o.created_at,
                COALESCE(u.name, 'Unknown') AS user_name,
                oi.id AS order_item_id, oi.quantity,
                oi.unit_price_amount, oi.unit_price_currency,
                b.title
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN order_items oi ON oi.order_id = o.id
            LEFT JOIN books b ON b.id = oi.book_id
        "#;

        let rows = match owner {
            Some(user_id) => {
                sqlx::query(&format!(
                    "{} WHERE o.user_id = ? ORDER BY o.created_at DESC, o.id",
                    base_query
                ))
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "{} ORDER BY o.created_at DESC, o.id",
                    base_query
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| DatabaseError::QueryError(format!("注文一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 注文IDごとにグループ化（ORDER BYの順を保つ）
        let mut groups: Vec<Vec<&sqlx::mysql::MySqlRow>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in &rows {
            let order_id: String = row.get("id");
            match index.get(&order_id) {
                Some(&position) => groups[position].push(row),
                None => {
                    index.insert(order_id, groups.len());
                    groups.push(vec![row]);
                }
            }
        }

        groups
            .iter()
            .map(|group| Self::view_from_rows(group))
            .collect()
    }

    async fn find_invoice_view(
        &self,
        order_id: OrderId,
    ) -> Result<Option<InvoiceView>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                o.id, o.user_id, o.total_amount, o.total_currency,
                o.status, o.payment_method, o.payment_status, o.shipping_address, o.created_at,
                COALESCE(u.name, 'Unknown') AS user_name,
                oi.id AS order_item_id, oi.quantity,
                oi.unit_price_amount, oi.unit_price_currency,
                b.title
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN order_items oi ON oi.order_id = o.id
            LEFT JOIN books b ON b.id = oi.book_id
            WHERE o.id = ?
            "#,
        )
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        if rows.is_empty() {
            return Ok(None);
        }

        let row_refs: Vec<&sqlx::mysql::MySqlRow> = rows.iter().collect();
        let view = Self::view_from_rows(&row_refs)?;

        Ok(Some(InvoiceView {
            order_id: view.order_id,
            customer_name: view
                .user
                .map(|u| u.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            payment_method: view.payment_method,
            payment_status: view.payment_status,
            shipping_address: view.shipping_address,
            total_price: view.total_price,
            items: view.items,
        }))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}
