use crate::domain::error::DomainError;
use crate::domain::port::{InvoiceError, RepositoryError};

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、認可エラーをラップする
#[derive(Debug)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    DomainError(DomainError),
    /// リポジトリエラー（永続化の失敗）
    RepositoryError(RepositoryError),
    /// 請求書の生成エラー
    InvoiceRenderingFailed(String),
    /// エンティティが見つからない
    NotFound(String),
    /// 操作する権限がない
    Forbidden(String),
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationError::DomainError(err) => write!(f, "Domain error: {}", err),
            ApplicationError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            ApplicationError::InvoiceRenderingFailed(msg) => {
                write!(f, "Invoice rendering failed: {}", msg)
            }
            ApplicationError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApplicationError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApplicationError {}

// From実装でエラー変換を簡潔に
impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        ApplicationError::DomainError(err)
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        ApplicationError::RepositoryError(err)
    }
}

impl From<InvoiceError> for ApplicationError {
    fn from(err: InvoiceError) -> Self {
        ApplicationError::InvoiceRenderingFailed(err.to_string())
    }
}
