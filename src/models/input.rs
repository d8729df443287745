//! Field deserializers shared by the request bodies.
//!
//! Each one checks the JSON type of a single field and fails with the tail of a readable
//! sentence ("must be a string."); the route layer prefixes it with the field name. An
//! absent or `null` field becomes `None` so that `validator`'s `required` rule reports it.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

pub const NOT_A_STRING: &str = "must be a string.";
pub const NOT_A_BOOLEAN: &str = "must be true or false.";

/// A string with surrounding whitespace removed, so `"   "` fails a length rule.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string(deserializer)?.map(|s| s.trim().to_string()))
}

/// A string taken as sent. Used for passwords, where whitespace is significant.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(D::Error::custom(NOT_A_STRING)),
    }
}

/// A boolean, also accepting `1`/`0` and `"1"`/`"0"`/`"true"`/`"false"`.
pub fn boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Ok(Some(true)),
            Some(0) => Ok(Some(false)),
            _ => Err(D::Error::custom(NOT_A_BOOLEAN)),
        },
        Some(Value::String(s)) => match s.as_str() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(D::Error::custom(NOT_A_BOOLEAN)),
        },
        Some(_) => Err(D::Error::custom(NOT_A_BOOLEAN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "trimmed")]
        name: Option<String>,
        #[serde(default, deserialize_with = "string")]
        secret: Option<String>,
        #[serde(default, deserialize_with = "boolean")]
        done: Option<bool>,
    }

    fn sample(value: serde_json::Value) -> Result<Sample, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_absent_and_null_fields_are_none() {
        let parsed = sample(json!({ "name": null })).unwrap();
        assert!(parsed.name.is_none());
        assert!(parsed.secret.is_none());
        assert!(parsed.done.is_none());
    }

    #[test]
    fn test_strings_are_trimmed_except_verbatim_ones() {
        let parsed = sample(json!({ "name": "  Alice  ", "secret": " pw " })).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Alice"));
        assert_eq!(parsed.secret.as_deref(), Some(" pw "));

        let blank = sample(json!({ "name": "   " })).unwrap();
        assert_eq!(blank.name.as_deref(), Some(""));
    }

    #[test]
    fn test_booleans_accept_numeric_forms() {
        for (raw, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("1"), true),
            (json!(0), false),
            (json!("false"), false),
        ] {
            let parsed = sample(json!({ "done": raw.clone() })).unwrap();
            assert_eq!(parsed.done, Some(expected), "input {}", raw);
        }
    }

    #[test]
    fn test_wrong_types_carry_readable_messages() {
        let err = sample(json!({ "done": "yes" })).unwrap_err();
        assert_eq!(err.to_string(), NOT_A_BOOLEAN);

        let err = sample(json!({ "done": 2 })).unwrap_err();
        assert_eq!(err.to_string(), NOT_A_BOOLEAN);

        let err = sample(json!({ "name": 5 })).unwrap_err();
        assert_eq!(err.to_string(), NOT_A_STRING);
    }
}
