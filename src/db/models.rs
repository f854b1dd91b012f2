use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of registrant kinds. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    Individual,
    Organization,
    Intermediary,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Individual => "individual",
            AccountCategory::Organization => "organization",
            AccountCategory::Intermediary => "intermediary",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for AccountCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(AccountCategory::Individual),
            "organization" => Ok(AccountCategory::Organization),
            "intermediary" => Ok(AccountCategory::Intermediary),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A stored account, digest included. Never serialized to clients directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub category: AccountCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        category: AccountCategory,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password_hash,
            category,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn projection(&self) -> AccountProjection {
        AccountProjection::from(self)
    }
}

/// The client-safe view of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProjection {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountCategory,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProjection {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            account_type: account.category,
            created_at: account.created_at,
        }
    }
}

/// Row shape of the `accounts` table; the category column is plain text.
#[derive(Debug, FromRow)]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub account_category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = crate::error::DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let category = row.account_category.parse::<AccountCategory>().map_err(|e| {
            crate::error::DatabaseError::CorruptRecord(format!("unknown account category: {}", e.0))
        })?;

        Ok(Account {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!("individual".parse::<AccountCategory>(), Ok(AccountCategory::Individual));
        assert_eq!("organization".parse::<AccountCategory>(), Ok(AccountCategory::Organization));
        assert_eq!("intermediary".parse::<AccountCategory>(), Ok(AccountCategory::Intermediary));

        for legacy in ["user", "company", "recruiter"] {
            assert_eq!(
                legacy.parse::<AccountCategory>(),
                Err(UnknownCategory(legacy.to_string()))
            );
        }
        assert!("admin".parse::<AccountCategory>().is_err());
        assert!("Individual".parse::<AccountCategory>().is_err());
        assert!("".parse::<AccountCategory>().is_err());
    }

    #[test]
    fn test_projection_omits_digest() {
        let account = Account::new(
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
            "$2b$04$digest".to_string(),
            AccountCategory::Individual,
        );

        let json = serde_json::to_value(account.projection()).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["accountType"], "individual");
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("digest"));
    }

    #[test]
    fn test_row_with_unknown_category_is_rejected() {
        let now = Utc::now();
        let row = AccountRow {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "x".into(),
            account_category: "wizard".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(Account::try_from(row).is_err());
    }
}
