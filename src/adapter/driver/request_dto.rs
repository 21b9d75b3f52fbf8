use serde::Deserialize;
use uuid::Uuid;

/// 書籍登録リクエスト
/// 価格は最小通貨単位（セント）の整数
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub photo: Option<String>,
    pub price: i64,
    pub stock: u32,
}

/// カート投入リクエスト
/// 数量は0以下の値を400で弾くため、符号付きで受け取る
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub book_id: Uuid,
    pub quantity: i64,
}

/// カート行の数量変更リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// 注文作成リクエスト
/// 配送先住所は自由記述、支払い方法は "COD" または "card"
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub payment_method: String,
}

/// 注文ステータス更新リクエスト
/// どちらのフィールドも省略可能で、省略されたものは変化しない
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}
