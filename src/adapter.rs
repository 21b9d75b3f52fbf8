// アダプター層
// ドメイン層のポートを具体的な技術（MySQL、HTTP、PDF）で実装する

pub mod database_config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;

pub use database_config::DatabaseConfig;
pub use database_migration::DatabaseMigration;
