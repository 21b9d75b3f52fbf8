/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 在庫不足（予約しようとした数量が現在庫を超えた）
    InsufficientStock,
    /// 無効な数量（0以下の数量）
    InvalidQuantity,
    /// 空のカートから注文を作成しようとした
    EmptyCart,
    /// 無効な注文状態遷移（例: 配達完了の注文を発送済みに戻そうとした）
    InvalidOrderState(String),
    /// 通貨の不一致
    CurrencyMismatch,
    /// 無効な値
    InvalidValue(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InsufficientStock => write!(f, "Not enough stock available"),
            DomainError::InvalidQuantity => write!(f, "Quantity must be greater than 0"),
            DomainError::EmptyCart => write!(f, "Cart is empty"),
            DomainError::InvalidOrderState(msg) => write!(f, "Invalid order state: {}", msg),
            DomainError::CurrencyMismatch => write!(f, "Currency mismatch"),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
