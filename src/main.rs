use bookstore_backend::adapter::driven::{
    ConsoleLogger, MySqlBookRepository, MySqlCartRepository, MySqlOrderRepository,
    PdfInvoiceRenderer,
};
use bookstore_backend::adapter::driver::rest_api::{create_router, AppStateInner};
use bookstore_backend::adapter::{DatabaseConfig, DatabaseMigration};
use bookstore_backend::application::service::cart_query_service::CartQueryService;
use bookstore_backend::application::service::invoice_service::InvoiceService;
use bookstore_backend::application::service::order_query_service::OrderQueryService;
use bookstore_backend::application::service::{
    BookApplicationService, CartApplicationService, OrderApplicationService,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== オンライン書店バックエンド REST API ===");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // ドリブンアダプターを作成
    let book_repository = Arc::new(MySqlBookRepository::new(pool.clone()));
    let cart_repository = Arc::new(MySqlCartRepository::new(pool.clone()));
    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let invoice_renderer = Arc::new(PdfInvoiceRenderer::new());
    let logger = Arc::new(ConsoleLogger::new());

    // アプリケーションサービスを作成
    let book_service = BookApplicationService::new(book_repository.clone());
    let cart_service = CartApplicationService::new(
        cart_repository.clone(),
        book_repository.clone(),
        logger.clone(),
    );
    let order_service = OrderApplicationService::new(
        order_repository.clone(),
        cart_repository.clone(),
        logger.clone(),
    );
    let cart_query_service = CartQueryService::new(cart_repository.clone());
    let order_query_service = OrderQueryService::new(order_repository.clone());
    let invoice_service = InvoiceService::new(
        order_repository.clone(),
        invoice_renderer,
        logger.clone(),
    );

    // アプリケーション状態を作成
    let app_state = AppStateInner {
        book_service: Arc::new(book_service),
        cart_service: Arc::new(cart_service),
        order_service: Arc::new(order_service),
        cart_query_service: Arc::new(cart_query_service),
        order_query_service: Arc::new(order_query_service),
        invoice_service: Arc::new(invoice_service),
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("REST APIサーバーが起動しました: http://localhost:3000");
    println!("ヘルスチェック: GET http://localhost:3000/health");
    println!("API仕様:");
    println!("  POST   /books - 書籍登録");
    println!("  GET    /books - 書籍一覧取得");
    println!("  GET    /books/:book_id - 書籍詳細取得");
    println!("  POST   /carts - カート投入");
    println!("  GET    /carts - カート一覧取得");
    println!("  PUT    /carts/item/:cart_item_id - カート行の数量変更");
    println!("  DELETE /carts/item/:cart_item_id - カート行削除");
    println!("  POST   /orders - 注文作成");
    println!("  GET    /orders - 注文一覧取得");
    println!("  PUT    /orders/:order_id/status - 注文ステータス更新");
    println!("  GET    /invoice/:order_id/pdf - 請求書PDF取得（管理者専用）");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
