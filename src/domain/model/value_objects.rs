use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDベースの識別子に共通する定型実装を生成するマクロ
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意のIDを生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDからIDを作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列からIDを作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_id!(
    /// 利用者の一意識別子
    /// 認証は上流のIdentity & Accessが実施済みで、ここでは不透明な値として扱う
    UserId
);
uuid_id!(
    /// 書籍の一意識別子
    BookId
);
uuid_id!(
    /// カートの一意識別子
    CartId
);
uuid_id!(
    /// カート行の一意識別子
    CartItemId
);
uuid_id!(
    /// 注文の一意識別子
    OrderId
);
uuid_id!(
    /// 注文明細の一意識別子
    OrderItemId
);

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 米ドル
    #[allow(clippy::upper_case_acronyms)]
    USD,
}

/// 金額を表す値オブジェクト
/// 最小単位（セント）の整数で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "USD" => Currency::USD,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "unsupported currency: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 米ドルの金額を作成
    pub fn usd(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::USD,
        }
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::USD => "USD".to_string(),
        }
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Money {
        Money {
            amount: self.amount * factor as i64,
            currency: self.currency,
        }
    }

    /// 金額が負でないかチェック
    pub fn is_non_negative(&self) -> bool {
        self.amount >= 0
    }
}

/// 注文のステータス
/// ワイヤ上の文字列は元システムのDB値をそのまま使う
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// 保留中（作成直後、キャンセル可能）
    Pending,
    /// 発送済み
    Shipped,
    /// 配達完了
    Delivered,
    /// キャンセル済み
    Canceled,
    /// 発送前キャンセル
    CanceledBeforeShipping,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::CanceledBeforeShipping => "canceledBeforeShipping",
        };
        write!(f, "{}", status_str)
    }
}

impl OrderStatus {
    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" => Ok(OrderStatus::Canceled),
            "canceledBeforeShipping" => Ok(OrderStatus::CanceledBeforeShipping),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid order status: {}",
                s
            ))),
        }
    }

    /// キャンセル系のステータスかどうか
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled | OrderStatus::CanceledBeforeShipping
        )
    }

    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Canceled | OrderStatus::CanceledBeforeShipping
        )
    }

    /// 指定されたステータスへの遷移が許可されているかチェック
    /// pending → shipped / canceled / canceledBeforeShipping
    /// shipped → delivered / canceled
    /// delivered・canceled系は終端
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match self {
            OrderStatus::Pending => matches!(
                next,
                OrderStatus::Shipped | OrderStatus::Canceled | OrderStatus::CanceledBeforeShipping
            ),
            OrderStatus::Shipped => {
                matches!(next, OrderStatus::Delivered | OrderStatus::Canceled)
            }
            OrderStatus::Delivered
            | OrderStatus::Canceled
            | OrderStatus::CanceledBeforeShipping => false,
        }
    }
}

/// 支払いステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// 支払い待ち（代金引換）
    Pending,
    /// 未払い
    Unpaid,
    /// 支払い済み
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        };
        write!(f, "{}", s)
    }
}

impl PaymentStatus {
    /// 文字列からPaymentStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid payment status: {}",
                s
            ))),
        }
    }
}

/// 支払い方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// 代金引換
    CashOnDelivery,
    /// カード払い
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::CashOnDelivery => "COD",
            PaymentMethod::Card => "card",
        };
        write!(f, "{}", s)
    }
}

impl PaymentMethod {
    /// 文字列からPaymentMethodを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "COD" => Ok(PaymentMethod::CashOnDelivery),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid payment method: {}",
                s
            ))),
        }
    }

    /// 注文作成時の初期支払いステータスを決定
    /// 代金引換はpending、それ以外はunpaid
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::CashOnDelivery => PaymentStatus::Pending,
            PaymentMethod::Card => PaymentStatus::Unpaid,
        }
    }
}

/// 配送先住所を表す値オブジェクト
/// クライアントは自由形式のテキストを送るため、空でないことのみを検証する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress(String);

impl ShippingAddress {
    /// 新しい配送先住所を作成
    /// 空白のみの住所は拒否する
    pub fn new(address: String) -> Result<Self, DomainError> {
        if address.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "shipping address must not be empty".to_string(),
            ));
        }
        Ok(Self(address))
    }

    /// 住所文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 永続化用にJSON文字列へシリアライズ
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "\"\"".to_string())
    }

    /// 永続化されたJSON文字列から復元
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let address: String = serde_json::from_str(json).map_err(|e| {
            DomainError::InvalidValue(format!("invalid shipping address payload: {}", e))
        })?;
        Self::new(address)
    }
}

/// 認証済みの呼び出し元
/// 上流のIdentity & Accessが検証したID/管理者フラグを運ぶだけの能力値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub is_admin: bool,
}

impl Requester {
    /// 新しい呼び出し元を作成
    pub fn new(id: UserId, is_admin: bool) -> Self {
        Self { id, is_admin }
    }

    /// 一覧系クエリの絞り込みスコープ
    /// 管理者はNone（全件）、一般利用者は自分のIDを返す
    pub fn scope(&self) -> Option<UserId> {
        if self.is_admin {
            None
        } else {
            Some(self.id)
        }
    }
}
