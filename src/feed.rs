//! Typed views over the feed payloads: posts, the offers made on them, and
//! the users behind both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramUser {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl InstagramUser {
    pub fn profile_url(&self) -> String {
        format!("https://www.instagram.com/{}", self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_user: Option<InstagramUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Value,
    /// Price in ETH. The backend sends it as a string or a number.
    #[serde(deserialize_with = "price_text")]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<User>,
}

impl Offer {
    /// Numeric price; unparseable prices count as zero.
    pub fn price_value(&self) -> f64 {
        self.price.trim().parse::<f64>().unwrap_or(0.0)
    }

    /// Price converted at `usd_per_eth`, with two decimals.
    pub fn dollar_price(&self, usd_per_eth: f64) -> String {
        format!("{:.2}", self.price_value() * usd_per_eth)
    }
}

fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected price as string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl FeedItem {
    /// The highest offer on this post.
    pub fn top_offer(&self) -> Option<&Offer> {
        self.offers
            .iter()
            .max_by(|a, b| a.price_value().total_cmp(&b.price_value()))
    }

    pub fn is_video(&self) -> bool {
        self.post.thumbnail.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Image to show for the post: the thumbnail for videos, else the source.
    pub fn cover_image(&self) -> Option<&str> {
        if self.is_video() {
            self.post.thumbnail.as_deref()
        } else {
            self.post.source.as_deref()
        }
    }
}

/// Parse a feed payload: a bare array, or an object wrapping one in `data`
/// or `items`.
pub fn parse_feed(payload: Value) -> Result<Vec<FeedItem>, ApiError> {
    let items = match payload {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("data")
            .filter(Value::is_array)
            .or_else(|| map.remove("items").filter(Value::is_array))
            .ok_or_else(|| ApiError::Decode("feed payload has no item array".into()))?,
        other => {
            return Err(ApiError::Decode(format!(
                "expected feed array, got {other}"
            )))
        }
    };
    serde_json::from_value(items).map_err(|e| ApiError::Decode(format!("invalid feed item: {e}")))
}
