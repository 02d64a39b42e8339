//! (De)serialize integers as decimal strings.
//!
//! The contract encodes every 64-bit-plus value as a decimal string so it
//! survives JSON boundaries with clients whose native number type cannot hold
//! it exactly. We keep that wire contract while working with real integers
//! internally.

use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let string = String::deserialize(deserializer)?;
    string.parse().map_err(de::Error::custom)
}
