use crate::domain::error::DomainError;
use crate::domain::model::{BookId, Money, UserId};

/// 書籍集約
/// カタログ情報と在庫数を管理する
/// 在庫の不変条件: stock >= 0（予約が現在庫を超える場合は変更前に拒否する）
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    title: String,
    description: Option<String>,
    author: String,
    photo: Option<String>,
    owner_id: UserId,
    price: Money,
    stock: u32,
}

impl Book {
    /// 新しい書籍を作成
    /// タイトルは空でなく、価格は負でない必要がある
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BookId,
        title: String,
        description: Option<String>,
        author: String,
        photo: Option<String>,
        owner_id: UserId,
        price: Money,
        stock: u32,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "title must not be empty".to_string(),
            ));
        }
        if !price.is_non_negative() {
            return Err(DomainError::InvalidValue(
                "price must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id,
            title,
            description,
            author,
            photo,
            owner_id,
            price,
            stock,
        })
    }

    /// データベースから取得したデータで書籍を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: BookId,
        title: String,
        description: Option<String>,
        author: String,
        photo: Option<String>,
        owner_id: UserId,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id,
            title,
            description,
            author,
            photo,
            owner_id,
            price,
            stock,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// 在庫を予約する（カート投入時の取り置き）
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功、在庫が減少
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足、変更なし
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock);
        }
        self.stock -= quantity;
        Ok(())
    }

    /// 予約済み在庫を解放する（カート行の削除・数量減・キャンセル補償）
    /// 解放は常に成功する
    pub fn release(&mut self, quantity: u32) {
        self.stock += quantity;
    }

    /// 指定された数量の在庫が利用可能かチェック
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}
