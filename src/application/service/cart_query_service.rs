use crate::application::ApplicationError;
use crate::domain::model::Requester;
use crate::domain::port::{CartRepository, CartView};
use std::sync::Arc;

/// カートクエリサービス
/// 読み取り専用のカート操作を提供する
pub struct CartQueryService {
    cart_repository: Arc<dyn CartRepository>,
}

impl CartQueryService {
    /// 新しいカートクエリサービスを作成
    ///
    /// # Arguments
    /// * `cart_repository` - カートリポジトリ
    pub fn new(cart_repository: Arc<dyn CartRepository>) -> Self {
        Self { cart_repository }
    }

    /// カート一覧を取得
    /// 管理者は全利用者分、一般利用者は自分のカートのみが返る
    /// 行が0件のカートは含まれない
    ///
    /// # Returns
    /// * `Ok(Vec<CartView>)` - カートの読み取りモデルのリスト
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_carts(&self, requester: Requester) -> Result<Vec<CartView>, ApplicationError> {
        self.cart_repository
            .find_cart_views(requester.scope())
            .await
            .map_err(ApplicationError::from)
    }
}
