use serde::Serialize;
use sqlx::FromRow;

/// Full user record as persisted. Deliberately not `Serialize`: anything
/// that leaves the process goes through [`PublicUser`], which has no
/// password hash field at all.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_verified: bool,
    pub last_login: String,
    pub verification_token: Option<String>,
    pub verification_expires: Option<String>,
    pub reset_token: Option<String>,
    pub reset_expires: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Outbound projection of a user record. Constructed by mapping, never by
/// deleting fields from the full record.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_verified: bool,
    pub last_login: String,
    pub created_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_verified: user.is_verified,
            last_login: user.last_login.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            email: "ann@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            name: "Ann".to_string(),
            is_verified: false,
            last_login: "2025-01-01T00:00:00.000000Z".to_string(),
            verification_token: Some("123456".to_string()),
            verification_expires: Some("2025-01-02T00:00:00.000000Z".to_string()),
            reset_token: None,
            reset_expires: None,
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2025-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn public_projection_has_no_sensitive_fields() {
        let user = sample_user();
        let value = serde_json::to_value(PublicUser::from(&user)).unwrap();
        let obj = value.as_object().unwrap();

        assert!(!obj.contains_key("password_hash"));
        assert!(!obj.contains_key("verification_token"));
        assert!(!obj.contains_key("reset_token"));
        assert_eq!(obj["email"], "ann@example.com");
        assert_eq!(obj["is_verified"], false);
    }
}
