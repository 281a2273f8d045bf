//! Addressing types for the event store
//!
//! Every value in the datastore is addressed by a key built from three parts:
//!
//! ```text
//! collection / id / field
//! topic      / 42 / title
//! ```
//!
//! - [`Collection`]: the entity type namespace, e.g. `topic`
//! - [`Fqid`]: one entity instance, `topic/42`
//! - [`FqField`]: one versioned attribute slot, `topic/42/title`
//!
//! FQIDs and FQFields serialize as their canonical strings so they can be
//! used as JSON object keys on the wire.
//!
//! [`Position`] is the datastore's monotonically increasing clock. It is an
//! opaque, totally ordered version stamp without wall-clock meaning.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator between the parts of a fully qualified key
pub const KEYSEPARATOR: char = '/';

/// Name of the sentinel field that tracks deletion of a model
pub const DELETED_FIELD: &str = "deleted";

/// Integer id of one entity inside a collection
pub type EntityId = u64;

// =============================================================================
// Collection
// =============================================================================

/// Namespace identifying an entity type, e.g. `topic`
///
/// Equality and hashing are by name.
///
/// ## Validation Rules
///
/// - Must not be empty
/// - Must not contain the key separator `/`
/// - Must not contain whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Collection(String);

impl Collection {
    /// Create a new Collection, validating the name
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Collection(name))
    }

    /// Create a Collection without validation
    ///
    /// The caller must ensure the name is valid. Use `new()` for untrusted input.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Collection(name.into())
    }

    /// Validate a collection name
    pub fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidAddress(
                "collection name cannot be empty".to_string(),
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == KEYSEPARATOR || c.is_whitespace())
        {
            return Err(Error::InvalidAddress(format!(
                "invalid character {:?} in collection name '{}'",
                c, name
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address one entity of this collection
    pub fn fqid(&self, id: EntityId) -> Fqid {
        Fqid::new(self.clone(), id)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Collection::new(s)
    }
}

impl TryFrom<String> for Collection {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Collection::new(value)
    }
}

impl From<Collection> for String {
    fn from(c: Collection) -> Self {
        c.0
    }
}

// =============================================================================
// Fqid
// =============================================================================

/// Fully qualified id: `collection/id`
///
/// Identifies one entity instance. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fqid {
    /// Owning collection
    pub collection: Collection,
    /// Entity id inside the collection
    pub id: EntityId,
}

impl Fqid {
    /// Create a new FQID
    pub fn new(collection: Collection, id: EntityId) -> Self {
        Fqid { collection, id }
    }

    /// Address one field of this entity
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the field name is invalid.
    pub fn field(&self, field: impl Into<String>) -> Result<FqField> {
        FqField::new(self.collection.clone(), self.id, field)
    }

    /// The deletion sentinel field of this entity
    pub fn deleted_field(&self) -> FqField {
        FqField::new_unchecked(self.collection.clone(), self.id, DELETED_FIELD)
    }
}

impl fmt::Display for Fqid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.collection, KEYSEPARATOR, self.id)
    }
}

impl FromStr for Fqid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(KEYSEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(collection), Some(id), None) => Ok(Fqid {
                collection: Collection::new(collection)?,
                id: parse_id(id, s)?,
            }),
            _ => Err(Error::InvalidAddress(format!(
                "'{}' is not of the form collection/id",
                s
            ))),
        }
    }
}

// =============================================================================
// FqField
// =============================================================================

/// Fully qualified field: `collection/id/field`
///
/// Identifies one versioned attribute slot inside the event store. This is
/// the granularity at which positions are tracked and locks are asserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FqField {
    /// Owning collection
    pub collection: Collection,
    /// Entity id inside the collection
    pub id: EntityId,
    /// Field name
    pub field: String,
}

impl FqField {
    /// Create a new FQField, validating the field name
    ///
    /// Field names follow the collection name rules, so every FQField
    /// parses back from its string form.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the field name is invalid.
    pub fn new(collection: Collection, id: EntityId, field: impl Into<String>) -> Result<Self> {
        let field = field.into();
        Self::validate_field(&field)?;
        Ok(Self::new_unchecked(collection, id, field))
    }

    /// Create a FQField without validating the field name
    pub fn new_unchecked(collection: Collection, id: EntityId, field: impl Into<String>) -> Self {
        FqField {
            collection,
            id,
            field: field.into(),
        }
    }

    /// Validate a field name
    pub fn validate_field(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidAddress("field name cannot be empty".to_string()));
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == KEYSEPARATOR || c.is_whitespace())
        {
            return Err(Error::InvalidAddress(format!(
                "invalid character {:?} in field name '{}'",
                c, name
            )));
        }
        Ok(())
    }

    /// The entity this field belongs to
    pub fn fqid(&self) -> Fqid {
        Fqid::new(self.collection.clone(), self.id)
    }
}

impl fmt::Display for FqField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.collection,
            self.id,
            self.field,
            sep = KEYSEPARATOR
        )
    }
}

impl FromStr for FqField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(KEYSEPARATOR);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(collection), Some(id), Some(field), None) if !field.is_empty() => {
                FqField::new(Collection::new(collection)?, parse_id(id, s)?, field)
            }
            _ => Err(Error::InvalidAddress(format!(
                "'{}' is not of the form collection/id/field",
                s
            ))),
        }
    }
}

fn parse_id(id: &str, whole: &str) -> Result<EntityId> {
    id.parse::<EntityId>().map_err(|_| {
        Error::InvalidAddress(format!("invalid id '{}' in '{}'", id, whole))
    })
}

macro_rules! string_serde {
    ($ty:ty, $expecting:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(|e: Error| {
                    serde::de::Error::custom(format!("expected {}: {}", $expecting, e))
                })
            }
        }
    };
}

string_serde!(Fqid, "collection/id");
string_serde!(FqField, "collection/id/field");

// =============================================================================
// Position
// =============================================================================

/// Version stamp assigned by the datastore to every change
///
/// Positions are monotonically increasing and totally ordered. Position 0
/// means "never written".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(u64);

impl Position {
    /// The position of something that was never written
    pub const ZERO: Position = Position(0);

    /// Create a position
    pub const fn new(value: u64) -> Self {
        Position(value)
    }

    /// Get the numeric value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The position following this one
    pub const fn next(&self) -> Self {
        Position(self.0 + 1)
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Position(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
