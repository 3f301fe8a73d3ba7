use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `GET review_counts.json?key=..&isbns=..` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCountsResponse {
    #[serde(default)]
    pub books: Vec<ReviewCounts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCounts {
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub work_ratings_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_rating: Option<f64>,
}

/// Rating signal reported by the community ratings provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommunityRating {
    pub ratings_count: u64,
    pub average_rating: f64,
}

impl ReviewCountsResponse {
    pub fn into_rating(self) -> Option<CommunityRating> {
        let first = self.books.into_iter().next()?;
        Some(CommunityRating {
            ratings_count: first.work_ratings_count?,
            average_rating: first.average_rating?,
        })
    }
}

// The provider sends averages as strings ("3.82") and counts as numbers; accept either.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
