// ドリブンアダプター（出力側）
// ドメイン層のポートをMySQL・コンソール・PDFで実装する

pub mod book_repository;
pub mod cart_repository;
pub mod console_logger;
pub mod invoice_renderer;
pub mod order_repository;

pub use book_repository::MySqlBookRepository;
pub use cart_repository::MySqlCartRepository;
pub use console_logger::ConsoleLogger;
pub use invoice_renderer::PdfInvoiceRenderer;
pub use order_repository::MySqlOrderRepository;
