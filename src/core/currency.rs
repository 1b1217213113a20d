//! Currency codes

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;

/// The base currency every source rate is quoted against.
pub const EUR: &str = "EUR";

/// A short uppercase currency identifier such as `NOK`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn eur() -> Self {
        CurrencyCode(EUR.to_string())
    }

    pub fn is_eur(&self) -> bool {
        self.0 == EUR
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(anyhow!("Invalid currency code: '{}'", s));
        }
        Ok(CurrencyCode(s.to_string()))
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
