use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered user of the rental marketplace.
///
/// The id doubles as the natural key ("First.Last"); uniqueness is
/// best-effort since it is derived from randomly generated names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub pwd: String,
}

/// A house listed for rental.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub price: i64,
    pub discount: i64,
}

/// A question posted about a house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "houseId")]
    pub house_id: String,
    #[serde(rename = "askerId")]
    pub asker_id: String,
    pub text: String,
}

/// A rental reservation for a house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rental {
    pub id: String,
    #[serde(rename = "houseId")]
    pub house_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "initialDate")]
    pub initial_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    pub name: String,
    pub pwd: String,
}

/// Request payload for creating a house.
///
/// `owner_id` is absent when no users have been recorded yet; the field is
/// dropped from the serialized payload rather than sent as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousePayload {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    #[serde(rename = "ownerId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub price: i64,
    pub discount: i64,
}

/// Request payload for posting a question about a house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPayload {
    #[serde(rename = "houseId")]
    pub house_id: String,
    #[serde(rename = "askerId")]
    pub asker_id: String,
    pub text: String,
}

/// Request payload for reserving a house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalPayload {
    #[serde(rename = "houseId")]
    pub house_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "initialDate")]
    pub initial_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}
