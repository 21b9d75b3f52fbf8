use crate::domain::error::DomainError;
use crate::domain::model::{
    BookId, CheckoutLine, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress, UserId,
};
use chrono::{DateTime, Utc};

/// 注文明細エンティティ
/// 単価は注文作成時点の書籍価格のスナップショットで、以後の価格変更とは切り離される
/// 作成後は不変（履歴レコード）
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    id: OrderItemId,
    order_id: OrderId,
    book_id: BookId,
    quantity: u32,
    unit_price: Money,
}

impl OrderItem {
    /// 新しい注文明細を作成
    /// 数量は1以上である必要がある
    pub fn new(
        id: OrderItemId,
        order_id: OrderId,
        book_id: BookId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id,
            order_id,
            book_id,
            quantity,
            unit_price,
        })
    }

    /// データベースから取得したデータで注文明細を再構築
    pub fn reconstruct(
        id: OrderItemId,
        order_id: OrderId,
        book_id: BookId,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id,
            order_id,
            book_id,
            quantity,
            unit_price,
        }
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// 小計を計算（スナップショット単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// キャンセル補償として在庫へ戻すべき数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRestoration {
    pub book_id: BookId,
    pub quantity: u32,
}

/// Order集約
/// カート内容の不変スナップショットとしての注文と、そのステータス遷移を管理する
/// total_priceは作成時に確定し、以後はstatus/payment_statusのみが変化する
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total_price: Money,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_address: ShippingAddress,
    created_at: DateTime<Utc>,
}

impl Order {
    /// カート内容から新しい注文を作成
    /// 各行の現在価格をこの時点で読み、明細と合計金額へ凍結する
    /// 在庫には触れない（カート投入時に予約済みで、注文中も予約が継続する）
    pub fn from_cart(
        id: OrderId,
        user_id: UserId,
        lines: &[CheckoutLine],
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        let mut total_price = Money::usd(0);
        for line in lines {
            let item = OrderItem::new(
                OrderItemId::new(),
                id,
                line.book_id,
                line.quantity,
                line.unit_price,
            )?;
            total_price = total_price.add(&item.subtotal())?;
            items.push(item);
        }

        Ok(Self {
            id,
            user_id,
            items,
            total_price,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: payment_method.initial_payment_status(),
            shipping_address,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_price: Money,
        status: OrderStatus,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
        shipping_address: ShippingAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_price,
            status,
            payment_method,
            payment_status,
            shipping_address,
            created_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// ステータス・支払いステータスを遷移させる
    /// どちらも省略可能で、省略されたフィールドは変化しない（両方省略は無変更で成功）
    ///
    /// pendingからキャンセル系への遷移のみが補償対象: 各明細の数量を
    /// 在庫へ戻すべき復元計画を返す。発送済み・配達済みの注文は物理的に
    /// 出荷済みとみなし、在庫復元は行わない
    ///
    /// # Returns
    /// * `Ok(Vec<StockRestoration>)` - 適用すべき在庫復元（補償なしなら空）
    /// * `Err(DomainError::InvalidOrderState)` - 許可されない遷移
    pub fn transition(
        &mut self,
        new_status: Option<OrderStatus>,
        new_payment_status: Option<PaymentStatus>,
    ) -> Result<Vec<StockRestoration>, DomainError> {
        let mut restorations = Vec::new();

        if let Some(next) = new_status {
            if next == self.status {
                // 同じステータスの再指定は無変更だが、終端状態からは拒否する
                if self.status.is_terminal() {
                    return Err(DomainError::InvalidOrderState(format!(
                        "cannot transition from {} to {}",
                        self.status, next
                    )));
                }
            } else {
                if !self.status.can_transition_to(next) {
                    return Err(DomainError::InvalidOrderState(format!(
                        "cannot transition from {} to {}",
                        self.status, next
                    )));
                }
                // 補償はpendingからのキャンセルのみ — 在庫はまだ予約の段階にある
                if self.status == OrderStatus::Pending && next.is_cancellation() {
                    restorations = self
                        .items
                        .iter()
                        .map(|item| StockRestoration {
                            book_id: item.book_id(),
                            quantity: item.quantity(),
                        })
                        .collect();
                }
                self.status = next;
            }
        }

        if let Some(payment) = new_payment_status {
            self.payment_status = payment;
        }

        Ok(restorations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lines() -> Vec<CheckoutLine> {
        vec![
            CheckoutLine {
                book_id: BookId::new(),
                quantity: 2,
                unit_price: Money::usd(2000),
            },
            CheckoutLine {
                book_id: BookId::new(),
                quantity: 1,
                unit_price: Money::usd(500),
            },
        ]
    }

    fn sample_order() -> Order {
        Order::from_cart(
            OrderId::new(),
            UserId::new(),
            &sample_lines(),
            ShippingAddress::new("221B Baker Street".to_string()).unwrap(),
            PaymentMethod::Card,
        )
        .unwrap()
    }

    #[test]
    fn test_from_cart_snapshots_total() {
        let order = sample_order();
        assert_eq!(order.total_price(), Money::usd(4500)); // 2*2000 + 1*500
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Unpaid);
        assert_eq!(order.items().len(), 2);
    }

    #[test]
    fn test_from_cart_cod_payment_pending() {
        let order = Order::from_cart(
            OrderId::new(),
            UserId::new(),
            &sample_lines(),
            ShippingAddress::new("somewhere".to_string()).unwrap(),
            PaymentMethod::CashOnDelivery,
        )
        .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_from_cart_rejects_empty_cart() {
        let result = Order::from_cart(
            OrderId::new(),
            UserId::new(),
            &[],
            ShippingAddress::new("somewhere".to_string()).unwrap(),
            PaymentMethod::Card,
        );
        assert_eq!(result.unwrap_err(), DomainError::EmptyCart);
    }

    #[test]
    fn test_cancel_pending_yields_restorations() {
        let mut order = sample_order();
        let restorations = order
            .transition(Some(OrderStatus::Canceled), None)
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Canceled);
        assert_eq!(restorations.len(), 2);
        assert_eq!(restorations[0].quantity, 2);
        assert_eq!(restorations[1].quantity, 1);
    }

    #[test]
    fn test_cancel_before_shipping_yields_restorations() {
        let mut order = sample_order();
        let restorations = order
            .transition(Some(OrderStatus::CanceledBeforeShipping), None)
            .unwrap();
        assert_eq!(order.status(), OrderStatus::CanceledBeforeShipping);
        assert!(!restorations.is_empty());
    }

    #[test]
    fn test_cancel_shipped_order_restores_nothing() {
        let mut order = sample_order();
        order.transition(Some(OrderStatus::Shipped), None).unwrap();
        let restorations = order
            .transition(Some(OrderStatus::Canceled), None)
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Canceled);
        assert!(restorations.is_empty()); // 出荷済みの在庫は戻さない
    }

    #[test]
    fn test_ship_then_deliver() {
        let mut order = sample_order();
        let restorations = order.transition(Some(OrderStatus::Shipped), None).unwrap();
        assert!(restorations.is_empty());
        order
            .transition(Some(OrderStatus::Delivered), None)
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut order = sample_order();
        let result = order.transition(Some(OrderStatus::Delivered), None);
        assert!(matches!(
            result.unwrap_err(),
            DomainError::InvalidOrderState(_)
        ));
        assert_eq!(order.status(), OrderStatus::Pending); // ステータスは変わらない
    }

    #[test]
    fn test_terminal_order_rejects_further_status_change() {
        let mut order = sample_order();
        order
            .transition(Some(OrderStatus::Canceled), None)
            .unwrap();
        let result = order.transition(Some(OrderStatus::Pending), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_second_cancel_is_rejected_without_restoration() {
        let mut order = sample_order();
        let first = order
            .transition(Some(OrderStatus::Canceled), None)
            .unwrap();
        assert!(!first.is_empty());
        // 2回目のキャンセルは遷移として拒否される — 二重補償は起こらない
        let second = order.transition(Some(OrderStatus::Canceled), None);
        assert!(second.is_err());
    }

    #[test]
    fn test_payment_status_changes_independently() {
        let mut order = sample_order();
        let restorations = order
            .transition(None, Some(PaymentStatus::Paid))
            .unwrap();
        assert!(restorations.is_empty());
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_both_absent_is_noop_success() {
        let mut order = sample_order();
        let restorations = order.transition(None, None).unwrap();
        assert!(restorations.is_empty());
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_same_status_is_noop() {
        let mut order = sample_order();
        let restorations = order.transition(Some(OrderStatus::Pending), None).unwrap();
        assert!(restorations.is_empty());
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_terminal_same_status_is_rejected() {
        // 終端状態では同じステータスの再指定も遷移として拒否する
        let mut order = sample_order();
        order
            .transition(Some(OrderStatus::Canceled), None)
            .unwrap();
        let result = order.transition(Some(OrderStatus::Canceled), None);
        assert!(matches!(
            result.unwrap_err(),
            DomainError::InvalidOrderState(_)
        ));

        let mut order = sample_order();
        order.transition(Some(OrderStatus::Shipped), None).unwrap();
        order
            .transition(Some(OrderStatus::Delivered), None)
            .unwrap();
        let result = order.transition(Some(OrderStatus::Delivered), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_total_price_is_immutable_after_creation() {
        let mut order = sample_order();
        let total_before = order.total_price();
        order.transition(Some(OrderStatus::Shipped), None).unwrap();
        order
            .transition(Some(OrderStatus::Delivered), Some(PaymentStatus::Paid))
            .unwrap();
        assert_eq!(order.total_price(), total_before);
    }
}
