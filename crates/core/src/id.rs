//! Strongly-typed identifiers for every aggregate.
//!
//! Each identifier wraps a non-nil UUID. New identifiers are UUIDv7.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::query::FilterValue;

/// Errors raised when parsing or wrapping an identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("{0} cannot be the nil UUID")]
    Nil(&'static str),
    #[error("Invalid {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

/// Behaviour shared by all aggregate identifiers.
pub trait EntityId:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Into<FilterValue>
    + Send
    + Sync
    + 'static
{
    /// Generates a fresh identifier.
    fn generate() -> Self;

    /// Returns the wrapped UUID.
    fn uuid(&self) -> Uuid;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID, rejecting the nil UUID.
            pub fn from_uuid(uuid: Uuid) -> Result<Self, IdError> {
                if uuid.is_nil() {
                    return Err(IdError::Nil(stringify!($name)));
                }
                Ok(Self(uuid))
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s).map_err(|e| IdError::Malformed {
                    kind: stringify!($name),
                    reason: e.to_string(),
                })?;
                Self::from_uuid(uuid)
            }
        }

        impl TryFrom<Uuid> for $name {
            type Error = IdError;

            fn try_from(value: Uuid) -> Result<Self, Self::Error> {
                Self::from_uuid(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$name> for FilterValue {
            fn from(value: $name) -> Self {
                FilterValue::Id(value.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let uuid = <Uuid as serde::Deserialize>::deserialize(deserializer)?;
                Self::from_uuid(uuid).map_err(serde::de::Error::custom)
            }
        }

        impl EntityId for $name {
            fn generate() -> Self {
                Self::new()
            }

            fn uuid(&self) -> Uuid {
                self.0
            }
        }
    };
}

define_id!(CountryId);
define_id!(RegionId);
define_id!(CityId);
define_id!(MonetaryZoneId);
define_id!(CurrencyId);
define_id!(BankId);
define_id!(BankAccountId);
define_id!(TypeDefinitionId);
define_id!(ParamTypeId);
define_id!(ProductId);
define_id!(ProductServiceId);
define_id!(SectorId);
define_id!(AgencyId);
define_id!(TaxId);
define_id!(TaxRuleDetailId);
