use crate::domain::error::DomainError;
use crate::domain::model::{BookId, CartId, CartItemId, Money, UserId};

/// カートエンティティ
/// 利用者ごとに最大1つ（最初のカート投入時に遅延作成され、明示的には削除されない）
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
}

impl Cart {
    /// 新しいカートを作成
    pub fn new(id: CartId, user_id: UserId) -> Self {
        Self { id, user_id }
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// 指定された利用者がこのカートの所有者かチェック
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// 数量変更が在庫に与える影響
/// updateQuantityの差分セマンティクス: 増加分だけを予約し、減少分だけを解放する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDelta {
    /// 差分だけ在庫を追加予約する（失敗しうる）
    Reserve(u32),
    /// 差分だけ在庫へ解放する（常に成功する）
    Release(u32),
    /// 数量に変化なし
    Unchanged,
}

/// カート行エンティティ
/// (cart_id, book_id) の組は一意 — 同じ書籍の再投入は行を増やさず数量を加算する
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    id: CartItemId,
    cart_id: CartId,
    book_id: BookId,
    quantity: u32,
}

impl CartItem {
    /// 新しいカート行を作成
    /// 数量は1以上である必要がある
    pub fn new(
        id: CartItemId,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id,
            cart_id,
            book_id,
            quantity,
        })
    }

    /// データベースから取得したデータでカート行を再構築
    pub fn reconstruct(id: CartItemId, cart_id: CartId, book_id: BookId, quantity: u32) -> Self {
        Self {
            id,
            cart_id,
            book_id,
            quantity,
        }
    }

    pub fn id(&self) -> CartItemId {
        self.id
    }

    pub fn cart_id(&self) -> CartId {
        self.cart_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 数量を増加させる（同じ書籍を再投入した場合）
    pub fn increase_quantity(&mut self, additional_quantity: u32) -> Result<(), DomainError> {
        if additional_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.quantity += additional_quantity;
        Ok(())
    }

    /// 数量を指定値へ変更し、在庫へ反映すべき差分を返す
    /// 0への変更は拒否する（削除は別操作）
    pub fn change_quantity(&mut self, new_quantity: u32) -> Result<StockDelta, DomainError> {
        if new_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let delta = if new_quantity > self.quantity {
            StockDelta::Reserve(new_quantity - self.quantity)
        } else if new_quantity < self.quantity {
            StockDelta::Release(self.quantity - new_quantity)
        } else {
            StockDelta::Unchanged
        };
        self.quantity = new_quantity;
        Ok(delta)
    }
}

/// 注文作成用に価格付けされたカート行の読み取りモデル
/// 単価は読み取り時点の書籍価格（この値が注文明細へスナップショットされる）
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
    pub book_id: BookId,
    pub quantity: u32,
    pub unit_price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(quantity: u32) -> CartItem {
        CartItem::new(CartItemId::new(), CartId::new(), BookId::new(), quantity).unwrap()
    }

    #[test]
    fn test_cart_ownership() {
        let user_id = UserId::new();
        let cart = Cart::new(CartId::new(), user_id);
        assert!(cart.is_owned_by(user_id));
        assert!(!cart.is_owned_by(UserId::new()));
    }

    #[test]
    fn test_cart_item_rejects_zero_quantity() {
        let result = CartItem::new(CartItemId::new(), CartId::new(), BookId::new(), 0);
        assert_eq!(result.unwrap_err(), DomainError::InvalidQuantity);
    }

    #[test]
    fn test_increase_quantity() {
        let mut item = sample_item(3);
        item.increase_quantity(2).unwrap();
        assert_eq!(item.quantity(), 5);
    }

    #[test]
    fn test_increase_quantity_rejects_zero() {
        let mut item = sample_item(3);
        assert!(item.increase_quantity(0).is_err());
        assert_eq!(item.quantity(), 3);
    }

    #[test]
    fn test_change_quantity_increase_reserves_diff() {
        let mut item = sample_item(3);
        let delta = item.change_quantity(5).unwrap();
        assert_eq!(delta, StockDelta::Reserve(2));
        assert_eq!(item.quantity(), 5);
    }

    #[test]
    fn test_change_quantity_decrease_releases_diff() {
        let mut item = sample_item(5);
        let delta = item.change_quantity(3).unwrap();
        assert_eq!(delta, StockDelta::Release(2));
        assert_eq!(item.quantity(), 3);
    }

    #[test]
    fn test_change_quantity_same_is_noop() {
        let mut item = sample_item(4);
        let delta = item.change_quantity(4).unwrap();
        assert_eq!(delta, StockDelta::Unchanged);
        assert_eq!(item.quantity(), 4);
    }

    #[test]
    fn test_change_quantity_rejects_zero() {
        let mut item = sample_item(4);
        assert_eq!(
            item.change_quantity(0).unwrap_err(),
            DomainError::InvalidQuantity
        );
        assert_eq!(item.quantity(), 4); // 数量は変わらない
    }
}
