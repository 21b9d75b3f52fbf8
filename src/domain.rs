// ドメイン層
// ビジネスルールと、外部依存を抽象化するポートを定義する

pub mod error;
pub mod model;
pub mod port;
