use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    RawMilk,
    Ghee,
    Paneer,
    Curd,
    Butter,
    Other,
}

/// Listing moderation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
}

/// Customer review embedded on the product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Reviewer user id (`user:key`)
    pub user: String,
    /// 1..=5
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where the product ships from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

/// Product record
///
/// `stock` is a derived value: it mirrors the latest `new_stock` of the
/// product's stock ledger and must only change through the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Seller user id (`user:key`)
    pub seller: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ProductKind,
    /// Price per unit
    pub price: f64,
    /// Sale unit, e.g. "liter", "kg"
    pub unit: String,
    /// Fat percentage, raw milk only
    #[serde(default)]
    pub fat_percentage: Option<f64>,
    /// Current stock level, ledger-derived
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: ProductLocation,
    /// Certification record id (`certification:key`)
    #[serde(default)]
    pub certification: Option<String>,
    /// Set when the certification is approved
    pub is_verified: bool,
    pub status: ProductStatus,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    /// Average of `ratings`, 0.0 when unrated
    pub average_rating: f64,
    pub num_reviews: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    /// Recompute `average_rating` / `num_reviews` after the ratings list changed
    pub fn recompute_rating(&mut self) {
        self.num_reviews = self.ratings.len() as u32;
        if self.ratings.is_empty() {
            self.average_rating = 0.0;
        } else {
            let sum: u32 = self.ratings.iter().map(|r| r.rating as u32).sum();
            self.average_rating = sum as f64 / self.ratings.len() as f64;
        }
    }

    /// A product can be sold only while approved and in stock
    pub fn is_purchasable(&self, quantity: i64) -> bool {
        self.status == ProductStatus::Approved && quantity > 0 && self.stock >= quantity
    }
}

/// Payload for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub kind: ProductKind,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 32))]
    #[serde(default = "default_unit")]
    pub unit: String,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub fat_percentage: Option<f64>,
    /// Opening stock, recorded as a `purchase` ledger entry
    #[validate(range(min = 0))]
    #[serde(default)]
    pub initial_stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: ProductLocation,
}

fn default_unit() -> String {
    "liter".to_string()
}

impl ProductCreate {
    pub fn into_product(self, seller: String) -> Product {
        Product {
            id: None,
            seller,
            name: self.name,
            description: self.description,
            kind: self.kind,
            price: self.price,
            unit: self.unit,
            fat_percentage: self.fat_percentage,
            stock: 0,
            images: self.images,
            location: self.location,
            certification: None,
            is_verified: false,
            status: ProductStatus::Approved,
            ratings: Vec::new(),
            average_rating: 0.0,
            num_reviews: 0,
            created_at: Utc::now(),
        }
    }
}

/// Partial update payload; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub kind: Option<ProductKind>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub fat_percentage: Option<f64>,
    pub images: Option<Vec<String>>,
    pub location: Option<ProductLocation>,
    pub status: Option<ProductStatus>,
}

impl ProductUpdate {
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(fat) = self.fat_percentage {
            product.fat_percentage = Some(fat);
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(location) = self.location {
            product.location = location;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        ProductCreate {
            name: "A2 Gir Cow Milk".into(),
            description: "Fresh raw milk".into(),
            kind: ProductKind::RawMilk,
            price: 60.0,
            unit: "liter".into(),
            fat_percentage: Some(4.5),
            initial_stock: 0,
            images: Vec::new(),
            location: ProductLocation::default(),
        }
        .into_product("user:farmer1".into())
    }

    #[test]
    fn recompute_rating_averages() {
        let mut product = sample();
        assert_eq!(product.average_rating, 0.0);

        for (user, rating) in [("user:a", 4), ("user:b", 5), ("user:c", 3)] {
            product.ratings.push(Rating {
                user: user.into(),
                rating,
                comment: None,
                created_at: Utc::now(),
            });
        }
        product.recompute_rating();
        assert_eq!(product.num_reviews, 3);
        assert!((product.average_rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn purchasable_requires_approval_and_stock() {
        let mut product = sample();
        product.stock = 5;
        assert!(product.is_purchasable(5));
        assert!(!product.is_purchasable(6));
        assert!(!product.is_purchasable(0));
        product.status = ProductStatus::Pending;
        assert!(!product.is_purchasable(1));
    }

    #[test]
    fn update_applies_only_set_fields() {
        let mut product = sample();
        ProductUpdate {
            price: Some(65.0),
            status: Some(ProductStatus::Rejected),
            ..Default::default()
        }
        .apply(&mut product);
        assert_eq!(product.price, 65.0);
        assert_eq!(product.status, ProductStatus::Rejected);
        assert_eq!(product.name, "A2 Gir Cow Milk");
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ProductKind::RawMilk).unwrap(),
            serde_json::json!("raw_milk")
        );
    }
}
