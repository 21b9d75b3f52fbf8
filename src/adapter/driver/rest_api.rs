use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::auth::AuthenticatedUser;
use crate::adapter::driver::request_dto::{
    AddToCartRequest, CreateBookRequest, CreateOrderRequest, UpdateOrderStatusRequest,
    UpdateQuantityRequest,
};
use crate::adapter::driver::response_dto::{
    BookResponse, BooksResponse, CartMutationResponse, CartResponse, CartsResponse,
    CreateOrderResponse, OrderResponse, OrdersResponse, RemoveCartItemResponse,
    UpdateOrderStatusResponse,
};
use crate::application::service::cart_query_service::CartQueryService;
use crate::application::service::invoice_service::InvoiceService;
use crate::application::service::order_query_service::OrderQueryService;
use crate::application::service::{
    BookApplicationService, CartApplicationService, OrderApplicationService,
};
use crate::application::ApplicationError;
use crate::domain::model::{BookId, CartItemId, Money, OrderId};

/// APIエラーレスポンス
#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

// アプリケーションサービスを含む状態
pub type AppState = AppStateInner;

#[derive(Clone)]
pub struct AppStateInner {
    pub book_service: Arc<BookApplicationService>,
    pub cart_service: Arc<CartApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub cart_query_service: Arc<CartQueryService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub invoice_service: Arc<InvoiceService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/books", post(create_book))
        .route("/books", get(get_books))
        .route("/books/:book_id", get(get_book_by_id))
        .route("/carts", post(add_to_cart))
        .route("/carts", get(get_carts))
        .route("/carts/item/:cart_item_id", put(update_cart_item_quantity))
        .route("/carts/item/:cart_item_id", delete(remove_cart_item))
        .route("/orders", post(create_order))
        .route("/orders", get(get_orders))
        .route("/orders/:order_id/status", put(update_order_status))
        .route("/invoice/:order_id/pdf", get(get_invoice_pdf))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "bookstore-backend",
        "version": "0.1.0"
    }))
}

// 書籍登録エンドポイント
async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), (StatusCode, Json<ApiError>)> {
    match state
        .book_service
        .create_book(
            requester.id,
            request.title,
            request.description,
            request.author,
            request.photo,
            Money::usd(request.price),
            request.stock,
        )
        .await
    {
        Ok(book) => Ok((StatusCode::CREATED, Json(BookResponse::from_book(&book)))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 書籍一覧取得エンドポイント
async fn get_books(
    State(state): State<AppState>,
    AuthenticatedUser(_requester): AuthenticatedUser,
) -> Result<Json<BooksResponse>, (StatusCode, Json<ApiError>)> {
    match state.book_service.get_all_books().await {
        Ok(books) => Ok(Json(BooksResponse {
            books: books.iter().map(BookResponse::from_book).collect(),
        })),
        Err(err) => Err(map_application_error(err)),
    }
}

// 書籍詳細取得エンドポイント
async fn get_book_by_id(
    State(state): State<AppState>,
    AuthenticatedUser(_requester): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, (StatusCode, Json<ApiError>)> {
    match state
        .book_service
        .get_book_by_id(BookId::from_uuid(book_id))
        .await
    {
        Ok(book) => Ok(Json(BookResponse::from_book(&book))),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート投入エンドポイント
// カートがなければ作成し、同じ書籍の行があれば数量を加算する
async fn add_to_cart(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartMutationResponse>, (StatusCode, Json<ApiError>)> {
    match state
        .cart_service
        .add_to_cart(
            requester.id,
            BookId::from_uuid(request.book_id),
            request.quantity,
        )
        .await
    {
        Ok(item) => Ok(Json(CartMutationResponse::from_item(
            "Item added to cart",
            &item,
        ))),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート一覧取得エンドポイント
// 管理者は全利用者分、一般利用者は自分のカートのみ
async fn get_carts(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
) -> Result<Json<CartsResponse>, (StatusCode, Json<ApiError>)> {
    match state.cart_query_service.get_carts(requester).await {
        Ok(views) => Ok(Json(CartsResponse {
            carts: views.iter().map(CartResponse::from_view).collect(),
        })),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート行の数量変更エンドポイント
async fn update_cart_item_quantity(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(cart_item_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartMutationResponse>, (StatusCode, Json<ApiError>)> {
    match state
        .cart_service
        .update_quantity(
            requester,
            CartItemId::from_uuid(cart_item_id),
            request.quantity,
        )
        .await
    {
        Ok(item) => Ok(Json(CartMutationResponse::from_item(
            "Quantity updated successfully",
            &item,
        ))),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート行削除エンドポイント
// 管理者は他人の行も削除できる
async fn remove_cart_item(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(cart_item_id): Path<Uuid>,
) -> Result<Json<RemoveCartItemResponse>, (StatusCode, Json<ApiError>)> {
    match state
        .cart_service
        .remove_cart_item(requester, CartItemId::from_uuid(cart_item_id))
        .await
    {
        Ok(removed_id) => Ok(Json(RemoveCartItemResponse {
            message: "Cart item removed successfully".to_string(),
            cart_item_id: removed_id.as_uuid(),
        })),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文作成エンドポイント
async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), (StatusCode, Json<ApiError>)> {
    match state
        .order_service
        .create_order(
            requester.id,
            request.shipping_address,
            request.payment_method,
        )
        .await
    {
        Ok(order) => Ok((
            StatusCode::CREATED,
            Json(CreateOrderResponse::from_order(&order)),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文一覧取得エンドポイント
// 管理者は全利用者分、一般利用者は自分の注文のみ。作成日時の降順
async fn get_orders(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
) -> Result<Json<OrdersResponse>, (StatusCode, Json<ApiError>)> {
    match state.order_query_service.get_orders(requester).await {
        Ok(views) => Ok(Json(OrdersResponse {
            orders: views.iter().map(OrderResponse::from_view).collect(),
        })),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文ステータス更新エンドポイント
async fn update_order_status(
    State(state): State<AppState>,
    AuthenticatedUser(_requester): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<UpdateOrderStatusResponse>, (StatusCode, Json<ApiError>)> {
    match state
        .order_service
        .update_order_status(
            OrderId::from_uuid(order_id),
            request.status,
            request.payment_status,
        )
        .await
    {
        Ok(order) => Ok(Json(UpdateOrderStatusResponse::from_order(&order))),
        Err(err) => Err(map_application_error(err)),
    }
}

// 請求書PDF取得エンドポイント（管理者専用）
async fn get_invoice_pdf(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let order_id = OrderId::from_uuid(order_id);

    match state
        .invoice_service
        .generate_invoice_pdf(requester, order_id)
        .await
    {
        Ok(pdf) => Ok((
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=invoice-{}.pdf", order_id),
                ),
            ],
            pdf,
        )
            .into_response()),
        Err(err) => Err(map_application_error(err)),
    }
}

// アプリケーションエラーをHTTPエラーにマッピング
// リポジトリ起因の詳細はサービス側でログ済みのため、クライアントには漏らさない
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: "Internal server error".to_string(),
                code: "REPOSITORY_ERROR".to_string(),
            }),
        ),
        ApplicationError::InvoiceRenderingFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: "Internal server error".to_string(),
                code: "INVOICE_RENDERING_FAILED".to_string(),
            }),
        ),
        ApplicationError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: msg,
                code: "NOT_FOUND".to_string(),
            }),
        ),
        ApplicationError::Forbidden(msg) => (
            StatusCode::FORBIDDEN,
            Json(ApiError {
                error: format!("Forbidden: {}", msg),
                code: "FORBIDDEN".to_string(),
            }),
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(
    domain_err: crate::domain::error::DomainError,
) -> (StatusCode, Json<ApiError>) {
    use crate::domain::error::DomainError;

    let code = match &domain_err {
        DomainError::InsufficientStock => "INSUFFICIENT_STOCK",
        DomainError::InvalidQuantity => "INVALID_QUANTITY",
        DomainError::EmptyCart => "EMPTY_CART",
        DomainError::InvalidOrderState(_) => "INVALID_ORDER_STATE",
        DomainError::CurrencyMismatch => "CURRENCY_MISMATCH",
        DomainError::InvalidValue(_) => "INVALID_VALUE",
    };

    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: domain_err.to_string(),
            code: code.to_string(),
        }),
    )
}
