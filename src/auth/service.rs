use crate::auth::password::{hash_password, verify_password};
use crate::config::AuthConfig;
use crate::db::models::{Account, AccountCategory, AccountProjection};
use crate::db::operations::AccountStore;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;

pub const MISSING_FIELDS: &str = "All fields are required";
pub const INVALID_CATEGORY: &str = "Invalid account type";
pub const EMAIL_TAKEN: &str = "User with this email already exists";
pub const ACCOUNT_NOT_FOUND: &str = "User not found";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Account ID
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
}

/// Registration body. Fields are optional so absent and empty values both
/// surface as the same validation error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub account_type: Option<String>,
}

struct NewAccount {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    category: AccountCategory,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

fn check_len(value: &str, max: usize, what: &str) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{} must be at most {} characters",
            what, max
        )));
    }
    Ok(())
}

impl RegisterRequest {
    fn validate(self) -> Result<NewAccount> {
        let (Some(first_name), Some(last_name), Some(email), Some(password), Some(account_type)) = (
            present(self.first_name),
            present(self.last_name),
            present(self.email),
            present(self.password),
            present(self.account_type),
        ) else {
            return Err(AppError::ValidationError(MISSING_FIELDS.to_string()));
        };

        let category = account_type
            .parse::<AccountCategory>()
            .map_err(|_| AppError::ValidationError(INVALID_CATEGORY.to_string()))?;

        check_len(&first_name, MAX_NAME_LEN, "First name")?;
        check_len(&last_name, MAX_NAME_LEN, "Last name")?;
        check_len(&email, MAX_EMAIL_LEN, "Email")?;

        Ok(NewAccount { first_name, last_name, email, password, category })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountProjection,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> std::result::Result<&str, AuthError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)
}

pub struct AuthService {
    store: Arc<dyn AccountStore>,
    jwt_secret: String,
    token_expiry_hours: i64,
    password_hash_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        jwt_secret: String,
        token_expiry_hours: i64,
        password_hash_cost: u32,
    ) -> Self {
        Self {
            store,
            jwt_secret,
            token_expiry_hours,
            password_hash_cost,
        }
    }

    pub fn from_config(store: Arc<dyn AccountStore>, config: &AuthConfig) -> Self {
        Self::new(
            store,
            config.jwt_secret.clone(),
            config.token_expiry_hours,
            config.password_hash_cost,
        )
    }

    /// Creates an account and returns its projection.
    pub async fn register(&self, req: RegisterRequest) -> Result<AccountProjection> {
        let new = req.validate()?;

        if self.store.get_by_email(&new.email).await?.is_some() {
            return Err(AppError::ConflictError(EMAIL_TAKEN.to_string()));
        }

        let digest = hash_password(&new.password, self.password_hash_cost).await?;
        let account = Account::new(new.first_name, new.last_name, new.email, digest, new.category);

        // A concurrent registration can still win between the check and the insert.
        let stored = self.store.insert(&account).await.map_err(|e| match e {
            DatabaseError::Duplicate => AppError::ConflictError(EMAIL_TAKEN.to_string()),
            other => AppError::DatabaseError(other),
        })?;

        info!(account_id = %stored.id, category = %stored.category, "Account created");
        Ok(stored.projection())
    }

    /// Checks credentials and issues a bearer token.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
            return Err(AppError::ValidationError("Email and password are required".to_string()));
        };

        let account = self
            .store
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&password, &account.password_hash).await? {
            warn!(account_id = %account.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.generate_token(account.id)?;
        Ok(LoginResponse {
            token,
            user: account.projection(),
        })
    }

    /// Verifies the bearer credential, then loads the account it names.
    /// Every call re-verifies and re-queries.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<AccountProjection> {
        let token = bearer_token(authorization)?;
        let account_id = self.validate_token(token)?;

        let account = self
            .store
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFoundError(ACCOUNT_NOT_FOUND.to_string()))?;

        debug!(account_id = %account.id, "Resolved bearer token");
        Ok(account.projection())
    }

    /// Returns the subject of a valid, unexpired token.
    pub fn validate_token(&self, token: &str) -> Result<Uuid> {
        let claims = self.decode_token(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken.into())
    }

    pub fn generate_token(&self, account_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.token_expiry_hours)).timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            exp,
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    fn decode_token(&self, token: &str) -> Result<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(claims.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::MockAccountStore;

    const SECRET: &str = "unit_test_secret";

    fn service(store: MockAccountStore) -> AuthService {
        AuthService::new(Arc::new(store), SECRET.to_string(), 1, 4)
    }

    fn ada_request() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            password: Some("s3cret!".into()),
            account_type: Some("individual".into()),
        }
    }

    fn token_with(sub: &str, exp_offset: Duration, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + exp_offset).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(None), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("bearer abc")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Bearer ")), Ok(""));
    }

    #[test_log::test(tokio::test)]
    async fn test_register_missing_field_touches_no_storage() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_email().never();
        store.expect_insert().never();
        let service = service(store);

        for strip in 0..5 {
            let mut req = ada_request();
            match strip {
                0 => req.first_name = None,
                1 => req.last_name = Some(String::new()),
                2 => req.email = None,
                3 => req.password = Some(String::new()),
                _ => req.account_type = None,
            }
            let err = service.register(req).await.unwrap_err();
            assert!(
                matches!(err, AppError::ValidationError(ref m) if m == MISSING_FIELDS),
                "unexpected error: {:?}",
                err
            );
        }
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_category() {
        let mut store = MockAccountStore::new();
        store.expect_insert().never();
        let service = service(store);

        for category in ["admin", "user", "company", "recruiter", "Individual"] {
            let mut req = ada_request();
            req.account_type = Some(category.into());

            let err = service.register(req).await.unwrap_err();
            assert!(
                matches!(err, AppError::ValidationError(ref m) if m == INVALID_CATEGORY),
                "{} was accepted",
                category
            );
        }
    }

    #[tokio::test]
    async fn test_register_rejects_overlong_names() {
        let mut store = MockAccountStore::new();
        store.expect_insert().never();
        let service = service(store);

        let mut req = ada_request();
        req.first_name = Some("a".repeat(101));

        let err = service.register(req).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_existing_email_conflicts() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_email().times(1).returning(|email| {
            Ok(Some(Account::new(
                "Someone".into(),
                "Else".into(),
                email.to_string(),
                "digest".into(),
                AccountCategory::Individual,
            )))
        });
        store.expect_insert().never();
        let service = service(store);

        let err = service.register(ada_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ConflictError(ref m) if m == EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn test_register_insert_race_reports_conflict() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_email().returning(|_| Ok(None));
        store.expect_insert().times(1).returning(|_| Err(DatabaseError::Duplicate));
        let service = service(store);

        let err = service.register(ada_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ConflictError(_)));
    }

    #[tokio::test]
    async fn test_register_stores_digest_not_password() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_email().returning(|_| Ok(None));
        store
            .expect_insert()
            .withf(|account| account.password_hash != "s3cret!" && account.password_hash.starts_with("$2"))
            .times(1)
            .returning(|account| Ok(account.clone()));
        let service = service(store);

        let projection = service.register(ada_request()).await.unwrap();
        assert_eq!(projection.email, "ada@example.com");
        assert_eq!(projection.account_type, AccountCategory::Individual);
    }

    #[tokio::test]
    async fn test_resolve_bad_tokens_skip_lookup() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_id().never();
        let service = service(store);

        let id = Uuid::new_v4().to_string();
        let expired = token_with(&id, Duration::hours(-2), SECRET);
        let forged = token_with(&id, Duration::hours(1), "some_other_secret");
        let not_a_uuid = token_with("42", Duration::hours(1), SECRET);

        for header in [
            format!("Bearer {}", expired),
            format!("Bearer {}", forged),
            format!("Bearer {}", not_a_uuid),
            "Bearer not.a.jwt".to_string(),
            "Bearer ".to_string(),
        ] {
            let err = service.resolve(Some(&header)).await.unwrap_err();
            assert!(
                matches!(err, AppError::AuthError(AuthError::InvalidToken)),
                "unexpected error for {}: {:?}",
                header,
                err
            );
        }

        let err = service.resolve(None).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_subject_is_not_found() {
        let mut store = MockAccountStore::new();
        store.expect_get_by_id().times(1).returning(|_| Ok(None));
        let service = service(store);

        let token = service.generate_token(Uuid::new_v4()).unwrap();
        let err = service.resolve(Some(&format!("Bearer {}", token))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundError(ref m) if m == ACCOUNT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_issued_token_resolves_to_issuer() {
        let account = Account::new(
            "Ada".into(),
            "Lovelace".into(),
            "ada@example.com".into(),
            "digest".into(),
            AccountCategory::Individual,
        );
        let expected = account.projection();
        let account_id = account.id;

        let mut store = MockAccountStore::new();
        store
            .expect_get_by_id()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        let service = service(store);

        let token = service.generate_token(account_id).unwrap();
        let resolved = service.resolve(Some(&format!("Bearer {}", token))).await.unwrap();
        assert_eq!(resolved, expected);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let digest = hash_password("right", 4).await.unwrap();
        let mut store = MockAccountStore::new();
        store.expect_get_by_email().returning(move |email| {
            if email == "known@example.com" {
                Ok(Some(Account::new(
                    "Known".into(),
                    "User".into(),
                    email.to_string(),
                    digest.clone(),
                    AccountCategory::Intermediary,
                )))
            } else {
                Ok(None)
            }
        });
        let service = service(store);

        let wrong = service
            .login(LoginRequest {
                email: Some("known@example.com".into()),
                password: Some("wrong".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::AuthError(AuthError::InvalidCredentials)));

        let unknown = service
            .login(LoginRequest {
                email: Some("nobody@example.com".into()),
                password: Some("right".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::AuthError(AuthError::InvalidCredentials)));

        let ok = service
            .login(LoginRequest {
                email: Some("known@example.com".into()),
                password: Some("right".into()),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.account_type, AccountCategory::Intermediary);
        assert!(service.validate_token(&ok.token).is_ok());
    }
}
