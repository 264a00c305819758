//! Lenient deserializers for documents produced by browser editors and
//! external desktop tools, which disagree on whether ids are numbers or strings.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Accept a string or a number and normalize it to a string.
pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected id, found {other}"))),
    }
}

/// Accept a non-negative integer or a numeric string.
pub(crate) fn index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| de::Error::custom(format!("expected port index, found {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected port index, found '{s}'"))),
        Value::Null => Ok(0),
        other => Err(de::Error::custom(format!(
            "expected port index, found {other}"
        ))),
    }
}

/// Accept a bool or the strings `"true"`/`"false"`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.eq_ignore_ascii_case("true") || s == "1"),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("expected bool, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::id")]
        id: String,
        #[serde(deserialize_with = "super::index")]
        port: usize,
        #[serde(deserialize_with = "super::flag")]
        optional: bool,
    }

    #[test]
    fn test_numbers_and_strings_accepted() {
        let a: Sample = serde_json::from_str(r#"{"id": 7, "port": "2", "optional": "true"}"#).unwrap();
        assert_eq!(a.id, "7");
        assert_eq!(a.port, 2);
        assert!(a.optional);

        let b: Sample = serde_json::from_str(r#"{"id": "op", "port": 0, "optional": false}"#).unwrap();
        assert_eq!(b.id, "op");
        assert_eq!(b.port, 0);
        assert!(!b.optional);
    }

    #[test]
    fn test_negative_index_rejected() {
        let result: Result<Sample, _> =
            serde_json::from_str(r#"{"id": 1, "port": -1, "optional": false}"#);
        assert!(result.is_err());
    }
}
