// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(RequestId);

/// Server-assigned account identifier, kept exactly as the server sent it.
/// The service may use JSON numbers or strings; both decode, and the id
/// encodes back in the same shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(IdRepr);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

impl AccountId {
    pub const fn new(value: i64) -> Self {
        Self(IdRepr::Number(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self(IdRepr::Text(value.into()))
    }

    /// The numeric value when the server sent a number.
    pub const fn as_number(&self) -> Option<i64> {
        match &self.0 {
            IdRepr::Number(value) => Some(*value),
            IdRepr::Text(_) => None,
        }
    }
}

impl From<i64> for AccountId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            IdRepr::Number(value) => write!(f, "{value}"),
            IdRepr::Text(value) => f.write_str(value),
        }
    }
}
