//! Purpose: Provide the shared JSON text decode entrypoint for the client and the CLI.
//! Exports: `from_str`.
//! Role: Maps serde_json failures to `ErrorKind::Parse` with caller context.
//! Invariants: Error messages name the context, never the payload.

use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;

pub fn from_str<T: DeserializeOwned>(input: &str, context: &str) -> Result<T, Error> {
    serde_json::from_str(input).map_err(|err| {
        Error::new(ErrorKind::Parse)
            .with_message(format!("invalid json in {context}"))
            .with_hint(format!("line {}, column {}", err.line(), err.column()))
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::from_str;
    use crate::core::error::ErrorKind;
    use serde_json::Value;

    #[test]
    fn syntax_error_maps_to_parse_kind() {
        let err = from_str::<Value>(r#"{"a":}"#, "response body").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.message(), Some("invalid json in response body"));
        assert!(err.hint().unwrap_or_default().starts_with("line 1"));
    }
}
