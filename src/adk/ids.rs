// SPDX-License-Identifier: MIT

//! Stored records use integer ids in some places and string ids in others.
//! These deserializers accept either and normalize to `String`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| D::Error::custom("expected a string or integer id"))
}

pub fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_from_value(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a string or integer id")),
    }
}

pub fn de_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Vec<Value>>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(values) => values
            .into_iter()
            .map(|v| id_from_value(v).ok_or_else(|| D::Error::custom("expected a string or integer id")))
            .collect(),
    }
}
