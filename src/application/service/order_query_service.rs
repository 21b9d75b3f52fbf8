use crate::application::ApplicationError;
use crate::domain::model::Requester;
use crate::domain::port::{OrderRepository, OrderView};
use std::sync::Arc;

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 注文一覧を取得
    /// 管理者は全利用者分、一般利用者は自分の注文のみが返る
    /// 作成日時の降順。キャンセル済みの注文も含まれる
    ///
    /// # Returns
    /// * `Ok(Vec<OrderView>)` - 注文の読み取りモデルのリスト
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_orders(
        &self,
        requester: Requester,
    ) -> Result<Vec<OrderView>, ApplicationError> {
        self.order_repository
            .find_order_views(requester.scope())
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::model::{
        CartId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
        UserId,
    };
    use crate::domain::port::{
        InvoiceView, OrderPlacement, OrderTransition, OrderUserView, RepositoryError,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    // テスト用のモックリポジトリ
    struct MockOrderRepository {
        views: Mutex<Vec<OrderView>>,
    }

    impl MockOrderRepository {
        fn new(views: Vec<OrderView>) -> Self {
            Self {
                views: Mutex::new(views),
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn place_from_cart(
            &self,
            _order_id: OrderId,
            _user_id: UserId,
            _cart_id: CartId,
            _shipping_address: ShippingAddress,
            _payment_method: PaymentMethod,
        ) -> Result<OrderPlacement, RepositoryError> {
            Ok(OrderPlacement::Rejected(DomainError::EmptyCart))
        }

        async fn transition(
            &self,
            _order_id: OrderId,
            _new_status: Option<OrderStatus>,
            _new_payment_status: Option<PaymentStatus>,
        ) -> Result<OrderTransition, RepositoryError> {
            Ok(OrderTransition::NotFound)
        }

        async fn find_order_views(
            &self,
            owner: Option<UserId>,
        ) -> Result<Vec<OrderView>, RepositoryError> {
            let views = self.views.lock().map_err(|e| {
                RepositoryError::OperationFailed(format!("lock poisoned: {}", e))
            })?;
            Ok(views
                .iter()
                .filter(|v| {
                    owner.map_or(true, |id| v.user.as_ref().map(|u| u.id) == Some(id))
                })
                .cloned()
                .collect())
        }

        async fn find_invoice_view(
            &self,
            _order_id: OrderId,
        ) -> Result<Option<InvoiceView>, RepositoryError> {
            Ok(None)
        }

        fn next_identity(&self) -> OrderId {
            OrderId::new()
        }
    }

    fn sample_view(user_id: UserId) -> OrderView {
        OrderView {
            order_id: OrderId::new(),
            user: Some(OrderUserView {
                id: user_id,
                name: "alice".to_string(),
            }),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Pending,
            total_price: Money::usd(3000),
            shipping_address: ShippingAddress::new("1-2-3 Chiyoda, Tokyo".to_string()).unwrap(),
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_get_orders_scoped_to_requester() {
        let alice = UserId::new();
        let repository = Arc::new(MockOrderRepository::new(vec![
            sample_view(alice),
            sample_view(UserId::new()),
        ]));
        let service = OrderQueryService::new(repository);

        let orders = service
            .get_orders(Requester::new(alice, false))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].user.as_ref().unwrap().id, alice);
    }

    #[tokio::test]
    async fn test_get_orders_admin_sees_all() {
        let repository = Arc::new(MockOrderRepository::new(vec![
            sample_view(UserId::new()),
            sample_view(UserId::new()),
        ]));
        let service = OrderQueryService::new(repository);

        let orders = service
            .get_orders(Requester::new(UserId::new(), true))
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
    }
}
