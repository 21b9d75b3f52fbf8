// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::error::DomainError;
use crate::domain::model::{
    Book, BookId, Cart, CartId, CartItem, CartItemId, Money, Order, OrderId, OrderStatus,
    PaymentMethod, PaymentStatus, ShippingAddress, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// ロガートレイト
/// ログ出力を抽象化するポート
/// インフラ障害の詳細はここへ記録し、クライアントへは漏らさない
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// カート変更コマンドの結果
/// 在庫の検査と行の書き込みは1つのトランザクションで行われるため、
/// 在庫不足は例外ではなく結果の一種として返す
#[derive(Debug, Clone, PartialEq)]
pub enum CartMutation {
    /// 変更が適用された（結果のカート行を含む）
    Applied(CartItem),
    /// 在庫不足のため何も変更されなかった
    InsufficientStock,
    /// 対象（書籍またはカート行）が見つからなかった
    NotFound,
}

/// 注文確定コマンドの結果
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlacement {
    /// 注文が確定した（作成された注文を含む）
    Placed(Order),
    /// ビジネスルールにより拒否された（何も変更されなかった）
    Rejected(DomainError),
}

/// ステータス遷移コマンドの結果
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTransition {
    /// 遷移が適用された（更新後の注文を含む）
    Applied(Order),
    /// ビジネスルールにより拒否された（何も変更されなかった）
    Rejected(DomainError),
    /// 注文が見つからなかった
    NotFound,
}

/// 書籍リポジトリトレイト
/// カタログの永続化を抽象化する
/// 在庫の変更はここを通さず、カート・注文リポジトリの
/// トランザクショナルなコマンド内でのみ行う
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍を保存する（UPSERT）
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 書籍IDで書籍を検索する
    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// すべての書籍を取得する
    /// タイトルの昇順で並べて返す
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// 新しい一意の書籍IDを生成する
    fn next_identity(&self) -> BookId;
}

/// カート一覧の読み取りモデル
/// 行が0件のカートは一覧に含まれない
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub cart_id: CartId,
    pub user_id: UserId,
    pub user_name: String,
    pub items: Vec<CartItemView>,
}

/// カート行の読み取りモデル
/// availableは読み取り時点の在庫で数量を満たせるかどうか
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemView {
    pub cart_item_id: CartItemId,
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub stock: u32,
}

impl CartItemView {
    /// 現在庫で要求数量を満たせるか
    pub fn available(&self) -> bool {
        self.stock >= self.quantity
    }
}

/// カートリポジトリトレイト
/// カートとカート行の永続化、および在庫予約と対になる
/// トランザクショナルなコマンドを抽象化する
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// 利用者のカートを検索する
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// 利用者のカートを検索し、存在しなければ作成する
    /// user_idの一意制約により、並行呼び出しでも重複カートは作られない
    async fn find_or_create_for_user(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// カートIDでカートを検索する
    async fn find_cart_by_id(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// カート行IDでカート行を検索する
    async fn find_item(&self, item_id: CartItemId)
        -> Result<Option<CartItem>, RepositoryError>;

    /// 在庫を予約しつつカート行を作成または加算する
    /// 書籍行をロックした上で在庫検査・在庫減算・行のUPSERTを
    /// 1つのトランザクションで実行する
    async fn add_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartMutation, RepositoryError>;

    /// カート行の数量を指定値へ変更する
    /// 差分が正なら差分だけ追加予約（在庫不足で失敗しうる）、
    /// 負なら差分だけ在庫へ解放する。書籍と行の更新は同一トランザクション
    async fn update_item_quantity(
        &self,
        item_id: CartItemId,
        new_quantity: u32,
    ) -> Result<CartMutation, RepositoryError>;

    /// カート行を削除し、行の全数量を在庫へ解放する（同一トランザクション）
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 行が見つからなかった
    async fn remove_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError>;

    /// カート一覧の読み取りモデルを取得する
    /// ownerがSomeならその利用者のカートのみ、Noneなら全利用者分
    async fn find_cart_views(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<CartView>, RepositoryError>;
}

/// 注文一覧の読み取りモデル
#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub order_id: OrderId,
    pub user: Option<OrderUserView>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_price: Money,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// 注文に紐づく利用者の読み取りモデル
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUserView {
    pub id: UserId,
    pub name: String,
}

/// 注文明細の読み取りモデル
/// unit_priceは注文時点のスナップショット価格
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemView {
    pub order_item_id: crate::domain::model::OrderItemId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItemView {
    /// 行合計を計算（スナップショット単価 × 数量）
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// 請求書レンダリング用の読み取りモデル
/// 注文・利用者・明細・書籍タイトルを結合済みの射影
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceView {
    pub order_id: OrderId,
    pub customer_name: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub total_price: Money,
    pub items: Vec<OrderItemView>,
}

/// 注文リポジトリトレイト
/// 注文集約の永続化と、カート消し込み・在庫補償と対になる
/// トランザクショナルなコマンドを抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// カートの内容から注文を確定する
    /// カート行の読み取り（ロック付き）・価格のスナップショット・
    /// 注文と明細のINSERT・カート行の全削除を1つのトランザクションで実行する
    /// （カート自体は残り、空になるだけ）
    /// 読み取りと消し込みが同一トランザクションのため、並行するカート投入の
    /// 予約が注文にならないまま消えることはない
    async fn place_from_cart(
        &self,
        order_id: OrderId,
        user_id: UserId,
        cart_id: CartId,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderPlacement, RepositoryError>;

    /// ステータス・支払いステータスを遷移させる
    /// 注文行をロックした上で集約を再構築し、ドメインの遷移ルールを適用、
    /// 補償分の在庫復元と注文の更新を同一トランザクションで実行する
    /// 行ロックにより、並行する二重キャンセルが二重復元になることはない
    async fn transition(
        &self,
        order_id: OrderId,
        new_status: Option<OrderStatus>,
        new_payment_status: Option<PaymentStatus>,
    ) -> Result<OrderTransition, RepositoryError>;

    /// 注文一覧の読み取りモデルを取得する
    /// ownerがSomeならその利用者の注文のみ、Noneなら全利用者分
    /// 作成日時の降順で並べて返す。キャンセル済みも除外しない
    async fn find_order_views(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<OrderView>, RepositoryError>;

    /// 請求書レンダリング用の結合済み射影を取得する
    async fn find_invoice_view(
        &self,
        order_id: OrderId,
    ) -> Result<Option<InvoiceView>, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

/// 請求書レンダラーエラー
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Invoice rendering failed: {0}")]
    RenderingFailed(String),
}

/// 請求書レンダラートレイト
/// 結合済みの注文射影からPDFバイト列を生成するポート
/// ビジネスロジックは持たない
pub trait InvoiceRenderer: Send + Sync {
    /// 請求書をレンダリングする
    fn render(&self, invoice: &InvoiceView) -> Result<Vec<u8>, InvoiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OrderItemId;

    #[test]
    fn test_cart_item_view_availability() {
        let view = CartItemView {
            cart_item_id: CartItemId::new(),
            book_id: BookId::new(),
            title: "test".to_string(),
            unit_price: Money::usd(100),
            quantity: 3,
            stock: 3,
        };
        assert!(view.available());

        let short = CartItemView { stock: 2, ..view };
        assert!(!short.available());
    }

    #[test]
    fn test_order_item_view_line_total() {
        let view = OrderItemView {
            order_item_id: OrderItemId::new(),
            title: "test".to_string(),
            unit_price: Money::usd(250),
            quantity: 4,
        };
        assert_eq!(view.line_total(), Money::usd(1000));
    }
}
