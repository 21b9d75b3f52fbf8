pub mod cart_query_service;
pub mod invoice_service;
pub mod order_query_service;

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    Book, BookId, CartItem, CartItemId, Money, Order, OrderId, OrderStatus, PaymentMethod,
    PaymentStatus, Requester, ShippingAddress, UserId,
};
use crate::domain::port::{
    BookRepository, CartMutation, CartRepository, Logger, OrderPlacement, OrderRepository,
    OrderTransition,
};
use std::collections::HashMap;
use std::sync::Arc;

/// 書籍アプリケーションサービス
/// カタログの登録と参照を提供する
pub struct BookApplicationService {
    book_repository: Arc<dyn BookRepository>,
}

impl BookApplicationService {
    /// 新しい書籍アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `book_repository` - 書籍リポジトリ
    pub fn new(book_repository: Arc<dyn BookRepository>) -> Self {
        Self { book_repository }
    }

    /// 新しい書籍を登録
    ///
    /// # Arguments
    /// * `owner_id` - 出品者の利用者ID
    /// * `title` - タイトル
    /// * `description` - 説明（オプション）
    /// * `author` - 著者
    /// * `photo` - 表紙画像のURL（オプション）
    /// * `price` - 価格
    /// * `stock` - 初期在庫数
    ///
    /// # Returns
    /// * `Ok(Book)` - 登録された書籍
    /// * `Err(ApplicationError)` - 登録失敗
    #[allow(clippy::too_many_arguments)]
    pub async fn create_book(
        &self,
        owner_id: UserId,
        title: String,
        description: Option<String>,
        author: String,
        photo: Option<String>,
        price: Money,
        stock: u32,
    ) -> Result<Book, ApplicationError> {
        let book_id = self.book_repository.next_identity();
        let book = Book::new(
            book_id,
            title,
            description,
            author,
            photo,
            owner_id,
            price,
            stock,
        )?;
        self.book_repository.save(&book).await?;
        Ok(book)
    }

    /// 書籍IDで書籍を取得
    ///
    /// # Returns
    /// * `Ok(Book)` - 書籍が見つかった
    /// * `Err(ApplicationError::NotFound)` - 書籍が見つからなかった
    pub async fn get_book_by_id(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("Book not found".to_string()))
    }

    /// すべての書籍を取得
    /// タイトルの昇順で並べて返す
    pub async fn get_all_books(&self) -> Result<Vec<Book>, ApplicationError> {
        self.book_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}

/// カートアプリケーションサービス
/// カートへの投入・数量変更・削除を、対応する在庫の予約・解放とともに提供する
pub struct CartApplicationService {
    cart_repository: Arc<dyn CartRepository>,
    book_repository: Arc<dyn BookRepository>,
    logger: Arc<dyn Logger>,
}

impl CartApplicationService {
    /// 新しいカートアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `cart_repository` - カートリポジトリ
    /// * `book_repository` - 書籍リポジトリ
    /// * `logger` - ロガー
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        book_repository: Arc<dyn BookRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            cart_repository,
            book_repository,
            logger,
        }
    }

    /// 書籍をカートへ投入する
    /// 利用者のカートがなければ作成し、同じ書籍の行があれば数量を加算する
    /// 投入数量分の在庫がその場で予約（減算）される
    ///
    /// # Arguments
    /// * `user_id` - 利用者ID
    /// * `book_id` - 書籍ID
    /// * `quantity` - 投入数量（1以上）
    ///
    /// # Returns
    /// * `Ok(CartItem)` - 投入後のカート行
    /// * `Err(ApplicationError)` - 数量不正・書籍なし・在庫不足など
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i64,
    ) -> Result<CartItem, ApplicationError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity.into());
        }

        // 書籍の存在確認を先に行い、存在しない書籍のためにカートを作らない
        if self.book_repository.find_by_id(book_id).await?.is_none() {
            return Err(ApplicationError::NotFound("Book not found".to_string()));
        }

        let cart = self.cart_repository.find_or_create_for_user(user_id).await?;

        match self
            .cart_repository
            .add_item(cart.id(), book_id, quantity as u32)
            .await?
        {
            CartMutation::Applied(item) => {
                self.logger.info(
                    "CartApplicationService",
                    "カートへ投入しました",
                    None,
                    Some(HashMap::from([
                        ("cart_id".to_string(), cart.id().to_string()),
                        ("book_id".to_string(), book_id.to_string()),
                        ("quantity".to_string(), quantity.to_string()),
                    ])),
                );
                Ok(item)
            }
            CartMutation::InsufficientStock => Err(DomainError::InsufficientStock.into()),
            CartMutation::NotFound => {
                Err(ApplicationError::NotFound("Book not found".to_string()))
            }
        }
    }

    /// カート行の数量を指定値へ変更する
    /// 在庫へは差分のみ反映される: 増加分は追加予約、減少分は解放
    ///
    /// # Arguments
    /// * `requester` - 操作する利用者
    /// * `item_id` - カート行ID
    /// * `quantity` - 変更後の数量（1以上。0は削除操作で行う）
    ///
    /// # Returns
    /// * `Ok(CartItem)` - 変更後のカート行
    /// * `Err(ApplicationError)` - 行なし・権限なし・数量不正・在庫不足など
    pub async fn update_quantity(
        &self,
        requester: Requester,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<CartItem, ApplicationError> {
        // 存在確認が所有チェックより先: 所有者でなくても存在しない行は404
        self.authorize_item_access(&requester, item_id).await?;

        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity.into());
        }

        match self
            .cart_repository
            .update_item_quantity(item_id, quantity as u32)
            .await?
        {
            CartMutation::Applied(item) => Ok(item),
            CartMutation::InsufficientStock => Err(DomainError::InsufficientStock.into()),
            CartMutation::NotFound => Err(ApplicationError::NotFound(
                "Cart item not found".to_string(),
            )),
        }
    }

    /// カート行を削除し、行の全数量を在庫へ解放する
    ///
    /// # Arguments
    /// * `requester` - 操作する利用者（管理者は他人の行も削除できる）
    /// * `item_id` - カート行ID
    ///
    /// # Returns
    /// * `Ok(CartItemId)` - 削除した行のID
    /// * `Err(ApplicationError)` - 行なし・権限なしなど
    pub async fn remove_cart_item(
        &self,
        requester: Requester,
        item_id: CartItemId,
    ) -> Result<CartItemId, ApplicationError> {
        self.authorize_item_access(&requester, item_id).await?;

        let removed = self.cart_repository.remove_item(item_id).await?;
        if !removed {
            // 存在確認の後に並行削除されたケース
            return Err(ApplicationError::NotFound(
                "Cart item not found".to_string(),
            ));
        }

        self.logger.info(
            "CartApplicationService",
            "カート行を削除しました",
            None,
            Some(HashMap::from([(
                "cart_item_id".to_string(),
                item_id.to_string(),
            )])),
        );
        Ok(item_id)
    }

    /// カート行の存在と所有権を確認する
    /// 存在しなければNotFound、所有者でも管理者でもなければForbidden
    async fn authorize_item_access(
        &self,
        requester: &Requester,
        item_id: CartItemId,
    ) -> Result<(), ApplicationError> {
        let item = self
            .cart_repository
            .find_item(item_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("Cart item not found".to_string()))?;

        if requester.is_admin {
            return Ok(());
        }

        let cart = self
            .cart_repository
            .find_cart_by_id(item.cart_id())
            .await?
            .ok_or_else(|| ApplicationError::NotFound("Cart item not found".to_string()))?;

        if !cart.is_owned_by(requester.id) {
            return Err(ApplicationError::Forbidden(
                "Not your cart item".to_string(),
            ));
        }
        Ok(())
    }
}

/// 注文アプリケーションサービス
/// カートからの注文確定と、注文ステータスの遷移を提供する
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    cart_repository: Arc<dyn CartRepository>,
    logger: Arc<dyn Logger>,
}

impl OrderApplicationService {
    /// 新しい注文アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `cart_repository` - カートリポジトリ
    /// * `logger` - ロガー
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        cart_repository: Arc<dyn CartRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            order_repository,
            cart_repository,
            logger,
        }
    }

    /// カートの内容から注文を作成する
    /// 各明細の単価はこの時点の書籍価格でスナップショットされ、
    /// 以後の価格改定の影響を受けない。確定と同時にカート行は消し込まれる
    /// 在庫はカート投入時に予約済みのため、ここでは変更しない
    /// 行の読み取りと消し込みはリポジトリが同一トランザクションで行う
    ///
    /// # Arguments
    /// * `user_id` - 注文する利用者ID
    /// * `shipping_address` - 配送先住所（空でない自由記述）
    /// * `payment_method` - 支払い方法の文字列（"COD" または "card"）
    ///
    /// # Returns
    /// * `Ok(Order)` - 作成された注文
    /// * `Err(ApplicationError)` - カートが空・入力不正など
    pub async fn create_order(
        &self,
        user_id: UserId,
        shipping_address: String,
        payment_method: String,
    ) -> Result<Order, ApplicationError> {
        let address = ShippingAddress::new(shipping_address)?;
        let method = PaymentMethod::from_string(&payment_method)?;

        // カート未作成の利用者は空のカートとして扱う
        let cart = self
            .cart_repository
            .find_by_user(user_id)
            .await?
            .ok_or(DomainError::EmptyCart)?;

        let order_id = self.order_repository.next_identity();

        match self
            .order_repository
            .place_from_cart(order_id, user_id, cart.id(), address, method)
            .await?
        {
            OrderPlacement::Placed(order) => {
                self.logger.info(
                    "OrderApplicationService",
                    "注文を作成しました",
                    None,
                    Some(HashMap::from([
                        ("order_id".to_string(), order_id.to_string()),
                        ("user_id".to_string(), user_id.to_string()),
                        (
                            "total_amount".to_string(),
                            order.total_price().amount().to_string(),
                        ),
                    ])),
                );
                Ok(order)
            }
            OrderPlacement::Rejected(err) => Err(err.into()),
        }
    }

    /// 注文のステータス・支払いステータスを遷移させる
    /// どちらのフィールドも省略可能で、省略されたものは変化しない
    /// pendingからのキャンセルでは明細分の在庫が復元される（補償）
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    /// * `status` - 新しい注文ステータスの文字列（オプション）
    /// * `payment_status` - 新しい支払いステータスの文字列（オプション）
    ///
    /// # Returns
    /// * `Ok(Order)` - 更新後の注文
    /// * `Err(ApplicationError)` - 注文なし・許可されない遷移など
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: Option<String>,
        payment_status: Option<String>,
    ) -> Result<Order, ApplicationError> {
        let new_status = status
            .as_deref()
            .map(OrderStatus::from_string)
            .transpose()?;
        let new_payment_status = payment_status
            .as_deref()
            .map(PaymentStatus::from_string)
            .transpose()?;

        match self
            .order_repository
            .transition(order_id, new_status, new_payment_status)
            .await?
        {
            OrderTransition::Applied(order) => {
                self.logger.info(
                    "OrderApplicationService",
                    "注文ステータスを更新しました",
                    None,
                    Some(HashMap::from([
                        ("order_id".to_string(), order_id.to_string()),
                        ("status".to_string(), order.status().to_string()),
                        (
                            "payment_status".to_string(),
                            order.payment_status().to_string(),
                        ),
                    ])),
                );
                Ok(order)
            }
            OrderTransition::Rejected(err) => Err(err.into()),
            OrderTransition::NotFound => {
                Err(ApplicationError::NotFound("Order not found".to_string()))
            }
        }
    }
}
