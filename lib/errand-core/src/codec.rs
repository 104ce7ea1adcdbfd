//! JSON encoding and decoding for request and response bodies.

use bytes::Bytes;
use derive_more::{Display, Error, From};

/// Failure of the JSON codec.
#[derive(Debug, Display, Error, From)]
pub enum CodecError {
    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    Serialize(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    Deserialize {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use errand_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes, CodecError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes, reporting the path of the field that failed.
///
/// # Example
///
/// ```
/// use errand_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| CodecError::Deserialize {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn to_json_serialize() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
            age: u32,
        }

        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        let bytes = to_json(&user).expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"name":"Alice","age":30}"#);
    }

    #[test]
    fn to_json_rejects_non_string_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(vec![1_u8], "value");

        let err = to_json(&map).expect_err("tuple keys are not JSON");
        assert!(err.to_string().starts_with("JSON serialization error"));
    }

    #[test]
    fn from_json_reports_field_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let err = from_json::<User>(br#"{"address":{"city":42}}"#).expect_err("type mismatch");
        let CodecError::Deserialize { path, .. } = err else {
            panic!("expected a deserialization error");
        };
        assert_eq!(path, "address.city");
    }

    #[test]
    fn from_json_syntax_error() {
        let err = from_json::<serde_json::Value>(b"{not json").expect_err("syntax");
        assert!(err.to_string().contains("JSON deserialization error"));
    }
}
