use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::product::ProductLocation;
use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CowBreed {
    Gir,
    Sahiwal,
    RedSindhi,
    Tharparkar,
    Jersey,
    HolsteinFriesian,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CowStatus {
    Available,
    Sold,
    Reserved,
}

/// Livestock listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cow {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Seller user id (`user:key`)
    pub seller: String,
    pub breed: CowBreed,
    /// Age in years
    pub age: u32,
    /// Daily milk yield in liters
    pub milk_capacity: f64,
    pub price: f64,
    pub negotiable: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub health_records: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: ProductLocation,
    pub status: CowStatus,
    #[serde(default)]
    pub pregnancy_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Cow {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CowCreate {
    pub breed: CowBreed,
    #[validate(range(min = 0, max = 40))]
    pub age: u32,
    #[validate(range(min = 0.0))]
    pub milk_capacity: f64,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub negotiable: bool,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub health_records: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: ProductLocation,
    #[serde(default)]
    pub pregnancy_status: Option<String>,
}

impl CowCreate {
    pub fn into_cow(self, seller: String) -> Cow {
        Cow {
            id: None,
            seller,
            breed: self.breed,
            age: self.age,
            milk_capacity: self.milk_capacity,
            price: self.price,
            negotiable: self.negotiable,
            description: self.description,
            health_records: self.health_records,
            images: self.images,
            location: self.location,
            status: CowStatus::Available,
            pregnancy_status: self.pregnancy_status,
            created_at: Utc::now(),
        }
    }
}

/// Partial update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CowUpdate {
    pub breed: Option<CowBreed>,
    #[validate(range(min = 0, max = 40))]
    pub age: Option<u32>,
    #[validate(range(min = 0.0))]
    pub milk_capacity: Option<f64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub negotiable: Option<bool>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub health_records: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub location: Option<ProductLocation>,
    pub status: Option<CowStatus>,
    pub pregnancy_status: Option<String>,
}

impl CowUpdate {
    pub fn apply(self, cow: &mut Cow) {
        if let Some(breed) = self.breed {
            cow.breed = breed;
        }
        if let Some(age) = self.age {
            cow.age = age;
        }
        if let Some(milk_capacity) = self.milk_capacity {
            cow.milk_capacity = milk_capacity;
        }
        if let Some(price) = self.price {
            cow.price = price;
        }
        if let Some(negotiable) = self.negotiable {
            cow.negotiable = negotiable;
        }
        if let Some(description) = self.description {
            cow.description = description;
        }
        if let Some(health_records) = self.health_records {
            cow.health_records = health_records;
        }
        if let Some(images) = self.images {
            cow.images = images;
        }
        if let Some(location) = self.location {
            cow.location = location;
        }
        if let Some(status) = self.status {
            cow.status = status;
        }
        if let Some(pregnancy_status) = self.pregnancy_status {
            cow.pregnancy_status = Some(pregnancy_status);
        }
    }
}
