use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    auth::Principal,
    schema::{COUNTRY, PERSON, ROLE_USER, USER},
};

/// Every user implicitly holds `ROLE_USER`.
fn with_base_role<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut roles = Vec::<String>::deserialize(deserializer)?;
    roles.push(ROLE_USER.to_string());
    let mut seen = HashSet::new();
    roles.retain(|role| seen.insert(role.clone()));
    Ok(roles)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 hash; never serialized back out.
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(deserialize_with = "with_base_role")]
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(User => USER);

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::new(Some(user.id), user.roles.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub email: String,
    /// Plaintext; hashed before it is stored.
    pub password: String,
    /// Extra roles. Only administrators may grant them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

payload!(NewUser => User);

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

patch!(UserPatch => User);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
    pub birthday: Option<NaiveDate>,
    pub is_male: bool,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Person => PERSON);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPerson {
    pub given_name: String,
    pub family_name: String,
    pub birthday: Option<NaiveDate>,
    pub is_male: bool,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country_id: i64,
}

payload!(NewPerson => Person);

#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_male: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i64>,
}

patch!(PersonPatch => Person);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    /// Administrator who created the row.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Country => COUNTRY);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCountry {
    pub name: String,
}

payload!(NewCountry => Country);

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

patch!(CountryPatch => Country);
