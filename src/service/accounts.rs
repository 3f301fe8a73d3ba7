use crate::db::{LibraryStorage, UserId};
use crate::error::LibrisError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::info;

pub fn hash_password(password: &str) -> Result<String, LibrisError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn required<'a>(value: Option<&'a str>, msg: &str) -> Result<&'a str, LibrisError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LibrisError::validation(msg)),
    }
}

/// Create an account and return its id. An existing username leaves the users table untouched.
pub async fn register(
    storage: &LibraryStorage,
    username: Option<&str>,
    password: Option<&str>,
    confirmation: Option<&str>,
) -> Result<UserId, LibrisError> {
    let username = required(username, "must provide username")?;
    let password = required(password, "must provide password")?;
    let confirmation = required(confirmation, "must confirm password")?;
    if password != confirmation {
        return Err(LibrisError::validation(
            "password and confirmed password must be equal!",
        ));
    }

    if storage.get_user_by_name(username).await?.is_some() {
        return Err(LibrisError::UsernameTaken);
    }
    let hash = hash_password(password)?;
    let user_id = storage
        .insert_user_if_absent(username, &hash)
        .await?
        .ok_or(LibrisError::UsernameTaken)?;
    info!(user_id, username, "user registered");
    Ok(user_id)
}

/// Check credentials and return the user id to store in the session.
pub async fn login(
    storage: &LibraryStorage,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<UserId, LibrisError> {
    let username = required(username, "must provide username")?;
    let password = required(password, "must provide password")?;

    let Some(user) = storage.get_user_by_name(username).await? else {
        return Err(LibrisError::InvalidCredentials);
    };
    if !verify_password(password, &user.hash_password) {
        return Err(LibrisError::InvalidCredentials);
    }
    Ok(user.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip_and_garbage_hash() {
        let hash = hash_password("pw123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn register_then_login() {
        let db = LibraryStorage::connect("sqlite::memory:").await.unwrap();
        let id = register(&db, Some("alice"), Some("pw123"), Some("pw123"))
            .await
            .unwrap();
        assert_eq!(login(&db, Some("alice"), Some("pw123")).await.unwrap(), id);
        assert!(matches!(
            login(&db, Some("alice"), Some("wrong")).await,
            Err(LibrisError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&db, Some("mallory"), Some("pw123")).await,
            Err(LibrisError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let db = LibraryStorage::connect("sqlite::memory:").await.unwrap();
        register(&db, Some("alice"), Some("pw123"), Some("pw123"))
            .await
            .unwrap();
        let err = register(&db, Some("alice"), Some("other"), Some("other"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibrisError::UsernameTaken));
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_or_mismatched_fields_are_validation_errors() {
        let db = LibraryStorage::connect("sqlite::memory:").await.unwrap();
        for (u, p, c) in [
            (None, Some("pw"), Some("pw")),
            (Some("bob"), Some(""), Some("pw")),
            (Some("bob"), Some("pw"), None),
            (Some("bob"), Some("pw"), Some("px")),
        ] {
            assert!(matches!(
                register(&db, u, p, c).await,
                Err(LibrisError::Validation(_))
            ));
        }
        assert_eq!(db.count_users().await.unwrap(), 0);
    }
}
