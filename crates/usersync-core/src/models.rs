//! User record model and its strongly-typed identifier.
//!
//! The identifier is owned by the identity provider, so unlike locally
//! generated keys it is an opaque string (`user_2NNEqL2nrIRdJ194ndJqAHwEfxC`
//! style). The newtype keeps it from being confused with any other string
//! column and binds directly as `TEXT`.

use std::fmt;

use serde::{Deserialize, Serialize};

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type BoxDynError = sqlx::error::BoxDynError;
type EncodeResult = Result<sqlx::encode::IsNull, BoxDynError>;

/// Identity-provider user identifier.
///
/// Primary key of the `users` table. Immutable once a record exists.
///
/// # Example
///
/// ```
/// use usersync_core::models::UserId;
///
/// let id = UserId::from("user_123");
/// assert_eq!(id.as_str(), "user_123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl sqlx::Type<PgDb> for UserId {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<PgDb>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<PgDb>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for UserId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let id = <String as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(id))
    }
}

impl sqlx::Encode<'_, PgDb> for UserId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// One end-user account as known to the application.
///
/// Writes always replace the whole record; there is no field-level merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    /// Identity-provider identifier.
    pub id: UserId,

    /// Primary contact address, absent when the provider sent none.
    pub email: Option<String>,

    /// Display name built from given and family name. May be empty.
    pub name: String,

    /// Profile picture URL.
    pub image: Option<String>,
}

impl UserRecord {
    /// Builds a record, deriving the display name from its parts.
    pub fn new(
        id: impl Into<UserId>,
        email: Option<String>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        image: Option<String>,
    ) -> Self {
        Self { id: id.into(), email, name: display_name(first_name, last_name), image }
    }
}

/// Joins given and family name with a single space and trims the result.
///
/// Missing parts count as empty, so a user with neither name gets `""`.
pub fn display_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    format!("{} {}", first_name.unwrap_or_default(), last_name.unwrap_or_default())
        .trim()
        .to_string()
}
