use crate::application::ApplicationError;
use crate::domain::model::{OrderId, Requester};
use crate::domain::port::{InvoiceRenderer, Logger, OrderRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// 請求書サービス
/// 注文の結合済み射影からPDFの請求書を生成する（管理者専用）
pub struct InvoiceService {
    order_repository: Arc<dyn OrderRepository>,
    renderer: Arc<dyn InvoiceRenderer>,
    logger: Arc<dyn Logger>,
}

impl InvoiceService {
    /// 新しい請求書サービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `renderer` - 請求書レンダラー
    /// * `logger` - ロガー
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        renderer: Arc<dyn InvoiceRenderer>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            order_repository,
            renderer,
            logger,
        }
    }

    /// 注文の請求書PDFを生成する
    /// 管理者以外の呼び出しは、注文の所有者であっても拒否される
    ///
    /// # Arguments
    /// * `requester` - 操作する利用者
    /// * `order_id` - 注文ID
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - PDFのバイト列
    /// * `Err(ApplicationError)` - 権限なし・注文なし・生成失敗
    pub async fn generate_invoice_pdf(
        &self,
        requester: Requester,
        order_id: OrderId,
    ) -> Result<Vec<u8>, ApplicationError> {
        if !requester.is_admin {
            return Err(ApplicationError::Forbidden(
                "Admin access required".to_string(),
            ));
        }

        let invoice = self
            .order_repository
            .find_invoice_view(order_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("Order not found".to_string()))?;

        let pdf = self.renderer.render(&invoice)?;

        self.logger.info(
            "InvoiceService",
            "請求書PDFを生成しました",
            None,
            Some(HashMap::from([
                ("order_id".to_string(), order_id.to_string()),
                ("bytes".to_string(), pdf.len().to_string()),
            ])),
        );
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::model::{
        CartId, Money, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress, UserId,
    };
    use crate::domain::port::{
        InvoiceError, InvoiceView, OrderPlacement, OrderTransition, OrderView, RepositoryError,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockOrderRepository {
        invoice: Mutex<Option<InvoiceView>>,
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
            _owner: Option<UserId>,
        ) -> Result<Vec<OrderView>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_invoice_view(
            &self,
            _order_id: OrderId,
        ) -> Result<Option<InvoiceView>, RepositoryError> {
            let invoice = self.invoice.lock().map_err(|e| {
                RepositoryError::OperationFailed(format!("lock poisoned: {}", e))
            })?;
            Ok(invoice.clone())
        }

        fn next_identity(&self) -> OrderId {
            OrderId::new()
        }
    }

    struct FakeRenderer;

    impl InvoiceRenderer for FakeRenderer {
        fn render(&self, _invoice: &InvoiceView) -> Result<Vec<u8>, InvoiceError> {
            Ok(b"%PDF-1.3 fake".to_vec())
        }
    }

    struct NoopLogger;

    impl Logger for NoopLogger {
        fn debug(
            &self,
            _: &str,
            _: &str,
            _: Option<uuid::Uuid>,
            _: Option<HashMap<String, String>>,
        ) {
        }
        fn info(
            &self,
            _: &str,
            _: &str,
            _: Option<uuid::Uuid>,
            _: Option<HashMap<String, String>>,
        ) {
        }
        fn warn(
            &self,
            _: &str,
            _: &str,
            _: Option<uuid::Uuid>,
            _: Option<HashMap<String, String>>,
        ) {
        }
        fn error(
            &self,
            _: &str,
            _: &str,
            _: Option<uuid::Uuid>,
            _: Option<HashMap<String, String>>,
        ) {
        }
    }

    fn sample_invoice() -> InvoiceView {
        InvoiceView {
            order_id: OrderId::new(),
            customer_name: "alice".to_string(),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: ShippingAddress::new("1-2-3 Chiyoda, Tokyo".to_string()).unwrap(),
            total_price: Money::usd(5000),
            items: Vec::new(),
        }
    }

    fn service_with(invoice: Option<InvoiceView>) -> InvoiceService {
        InvoiceService::new(
            Arc::new(MockOrderRepository {
                invoice: Mutex::new(invoice),
            }),
            Arc::new(FakeRenderer),
            Arc::new(NoopLogger),
        )
    }

    #[tokio::test]
    async fn test_admin_gets_pdf_bytes() {
        let service = service_with(Some(sample_invoice()));
        let admin = Requester::new(UserId::new(), true);

        let pdf = service
            .generate_invoice_pdf(admin, OrderId::new())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let service = service_with(Some(sample_invoice()));
        let user = Requester::new(UserId::new(), false);

        let result = service.generate_invoice_pdf(user, OrderId::new()).await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let service = service_with(None);
        let admin = Requester::new(UserId::new(), true);

        let result = service.generate_invoice_pdf(admin, OrderId::new()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }
}
