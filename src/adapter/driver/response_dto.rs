use crate::domain::model::{Book, CartItem, Order};
use crate::domain::port::{CartItemView, CartView, OrderItemView, OrderView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub photo: Option<String>,
    pub owner_id: Uuid,
    pub price: i64,
    pub currency: String,
    pub stock: u32,
}

impl BookResponse {
    pub fn from_book(book: &Book) -> Self {
        Self {
            book_id: book.id().as_uuid(),
            title: book.title().to_string(),
            description: book.description().map(|s| s.to_string()),
            author: book.author().to_string(),
            photo: book.photo().map(|s| s.to_string()),
            owner_id: book.owner_id().as_uuid(),
            price: book.price().amount(),
            currency: book.price().currency(),
            stock: book.stock(),
        }
    }
}

/// 書籍一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BooksResponse {
    pub books: Vec<BookResponse>,
}

/// カート行の読み取りレスポンス
/// availableは現在庫で数量を満たせるかどうか
#[derive(Debug, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub cart_item_id: Uuid,
    pub book_id: Uuid,
    pub title: String,
    pub unit_price: i64,
    pub currency: String,
    pub quantity: u32,
    pub stock: u32,
    pub available: bool,
}

impl CartItemResponse {
    pub fn from_view(view: &CartItemView) -> Self {
        Self {
            cart_item_id: view.cart_item_id.as_uuid(),
            book_id: view.book_id.as_uuid(),
            title: view.title.clone(),
            unit_price: view.unit_price.amount(),
            currency: view.unit_price.currency(),
            quantity: view.quantity,
            stock: view.stock,
            available: view.available(),
        }
    }
}

/// カートの読み取りレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub items: Vec<CartItemResponse>,
}

impl CartResponse {
    pub fn from_view(view: &CartView) -> Self {
        Self {
            cart_id: view.cart_id.as_uuid(),
            user_id: view.user_id.as_uuid(),
            user_name: view.user_name.clone(),
            items: view.items.iter().map(CartItemResponse::from_view).collect(),
        }
    }
}

/// カート一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CartsResponse {
    pub carts: Vec<CartResponse>,
}

/// カート変更レスポンス（投入・数量変更）
#[derive(Debug, Serialize, Deserialize)]
pub struct CartMutationResponse {
    pub message: String,
    pub cart_item_id: Uuid,
    pub cart_id: Uuid,
    pub book_id: Uuid,
    pub quantity: u32,
}

impl CartMutationResponse {
    pub fn from_item(message: &str, item: &CartItem) -> Self {
        Self {
            message: message.to_string(),
            cart_item_id: item.id().as_uuid(),
            cart_id: item.cart_id().as_uuid(),
            book_id: item.book_id().as_uuid(),
            quantity: item.quantity(),
        }
    }
}

/// カート行削除レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveCartItemResponse {
    pub message: String,
    pub cart_item_id: Uuid,
}

/// 注文明細の読み取りレスポンス
/// unit_priceは注文時点のスナップショット価格
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub order_item_id: Uuid,
    pub title: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

impl OrderItemResponse {
    pub fn from_view(view: &OrderItemView) -> Self {
        Self {
            order_item_id: view.order_item_id.as_uuid(),
            title: view.title.clone(),
            unit_price: view.unit_price.amount(),
            quantity: view.quantity,
            line_total: view.line_total().amount(),
        }
    }
}

/// 注文に紐づく利用者のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderUserResponse {
    pub id: Uuid,
    pub name: String,
}

/// 注文の読み取りレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub user: Option<OrderUserResponse>,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub total_price: i64,
    pub currency: String,
    pub shipping_address: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn from_view(view: &OrderView) -> Self {
        Self {
            order_id: view.order_id.as_uuid(),
            user: view.user.as_ref().map(|u| OrderUserResponse {
                id: u.id.as_uuid(),
                name: u.name.clone(),
            }),
            status: view.status.to_string(),
            payment_method: view.payment_method.to_string(),
            payment_status: view.payment_status.to_string(),
            total_price: view.total_price.amount(),
            currency: view.total_price.currency(),
            shipping_address: view.shipping_address.as_str().to_string(),
            created_at: view.created_at.to_rfc3339(),
            items: view.items.iter().map(OrderItemResponse::from_view).collect(),
        }
    }
}

/// 注文一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderResponse>,
}

/// 注文作成時の明細レスポンス
/// タイトルの結合前なので書籍IDとスナップショット単価のみ
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedOrderItemResponse {
    pub order_item_id: Uuid,
    pub book_id: Uuid,
    pub quantity: u32,
    pub unit_price: i64,
}

/// 注文作成レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub message: String,
    pub order_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub total_price: i64,
    pub currency: String,
    pub shipping_address: String,
    pub created_at: String,
    pub items: Vec<CreatedOrderItemResponse>,
}

impl CreateOrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            message: "Order created successfully".to_string(),
            order_id: order.id().as_uuid(),
            status: order.status().to_string(),
            payment_method: order.payment_method().to_string(),
            payment_status: order.payment_status().to_string(),
            total_price: order.total_price().amount(),
            currency: order.total_price().currency(),
            shipping_address: order.shipping_address().as_str().to_string(),
            created_at: order.created_at().to_rfc3339(),
            items: order
                .items()
                .iter()
                .map(|item| CreatedOrderItemResponse {
                    order_item_id: item.id().as_uuid(),
                    book_id: item.book_id().as_uuid(),
                    quantity: item.quantity(),
                    unit_price: item.unit_price().amount(),
                })
                .collect(),
        }
    }
}

/// 注文ステータス更新レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusResponse {
    pub message: String,
    pub order_id: Uuid,
    pub status: String,
    pub payment_status: String,
}

impl UpdateOrderStatusResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            message: "Order updated successfully".to_string(),
            order_id: order.id().as_uuid(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
        }
    }
}
