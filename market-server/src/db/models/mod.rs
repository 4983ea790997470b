//! Data models for every marketplace table.

pub mod cart;
pub mod certification;
pub mod cow;
pub mod notification;
pub mod order;
pub mod product;
pub mod serde_helpers;
pub mod stock_entry;
pub mod subscription;
pub mod user;

pub use cart::{Cart, CartItem};
pub use certification::{Certification, CertificationCreate, VerificationStatus};
pub use cow::{Cow, CowBreed, CowCreate, CowStatus, CowUpdate};
pub use notification::{Notification, NotificationKind};
pub use order::{
    DeliveryStatus, Order, OrderItem, PaymentInfo, PaymentMethod, PaymentStatus, ShippingAddress,
    StatusEntry, TrackingInfo,
};
pub use product::{
    Product, ProductCreate, ProductKind, ProductLocation, ProductStatus, ProductUpdate, Rating,
};
pub use stock_entry::{Batch, RelatedModel, StockChangeKind, StockEntry};
pub use subscription::{DeliveryTime, Subscription, SubscriptionPayment, SubscriptionStatus};
pub use user::{Address, KycDocument, KycStatus, User, UserPublic, UserRole};
