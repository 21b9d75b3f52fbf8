// ドメインモデル（エンティティと値オブジェクト）

mod book;
mod cart;
mod order;
mod value_objects;

pub use value_objects::{
    BookId, CartId, CartItemId, Currency, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod,
    PaymentStatus, Requester, ShippingAddress, UserId,
};

pub use book::Book;
pub use cart::{Cart, CartItem, CheckoutLine, StockDelta};
pub use order::{Order, OrderItem, StockRestoration};
