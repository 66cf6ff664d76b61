use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Domain Models (Mapped to DB) ---

#[derive(Debug, Serialize, FromRow, Clone, ToSchema)]
pub struct User {
    pub id: i64, // SQLite INTEGER maps to i64
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Serialize, FromRow, Clone, ToSchema)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub deadline: Option<String>,
    pub status: String,
    pub category: Option<String>,
    pub user_id: i64,
}

// --- Request/Response DTOs ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub deadline: Option<String>,
    pub status: String,
    pub category: Option<String>,
    pub user_id: i64,
}

/// Partial update. A missing key keeps the stored value. For the optional
/// columns an explicit `null` clears it; for required ones `null` is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub deadline: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub category: Option<Option<String>>,
    pub user_id: Option<i64>,
}

// Present-but-null becomes `Some(None)`; `#[serde(default)]` covers absent keys.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_missing() {
        let update: UpdateTask =
            serde_json::from_str(r#"{"description": null, "category": "Home"}"#).unwrap();

        assert_eq!(update.description, Some(None));
        assert_eq!(update.category, Some(Some("Home".to_string())));
        assert_eq!(update.deadline, None);
        assert_eq!(update.title, None);
    }
}
