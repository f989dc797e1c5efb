//! Inbound invocation: function name plus flat string parameters.
//!
//! Follows the peer CLI convention: in `{"Args": ["memberc", "001", ...]}` the
//! first element names the function and the rest are its parameters. An
//! explicit `"function"` field takes precedence, in which case every element
//! of `Args` is a parameter.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tx_id: String,
    pub function: String,
    pub args: Vec<String>,
}

/// JSON shape accepted by [`Invocation::from_json`].
#[derive(Deserialize)]
struct RawInvocation {
    #[serde(default)]
    function: Option<String>,
    #[serde(rename = "Args", alias = "args", default)]
    args: Vec<String>,
}

impl Invocation {
    /// Invocation with an explicit function name and a fresh transaction id.
    pub fn new(function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tx_id: new_tx_id(),
            function: function.into(),
            args,
        }
    }

    /// Split a flat vector into function name and parameters.
    ///
    /// An empty vector yields an empty function name, which no chaincode
    /// recognises.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = args.into_iter().map(Into::into);
        let function = iter.next().unwrap_or_default();
        Self::new(function, iter.collect())
    }

    /// Parse a `{"Args": [...]}` / `{"function": ..., "Args": [...]}` document.
    pub fn from_json(input: &str) -> Result<Self, AppError> {
        let raw: RawInvocation = serde_json::from_str(input)
            .map_err(|e| AppError::Invocation(format!("malformed invocation: {e}")))?;
        Ok(match raw.function {
            Some(function) => Self::new(function, raw.args),
            None => Self::from_args(raw.args),
        })
    }

    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = tx_id.into();
        self
    }
}

fn new_tx_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_args_splits_function() {
        let inv = Invocation::from_args(["query", "001"]);
        assert_eq!(inv.function, "query");
        assert_eq!(inv.args, vec!["001".to_string()]);
        assert_eq!(inv.tx_id.len(), 32);
    }

    #[test]
    fn from_args_empty() {
        let inv = Invocation::from_args(Vec::<String>::new());
        assert_eq!(inv.function, "");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn json_args_convention() {
        let inv = Invocation::from_json(r#"{"Args":["memberd","001"]}"#).unwrap();
        assert_eq!(inv.function, "memberd");
        assert_eq!(inv.args, vec!["001".to_string()]);
    }

    #[test]
    fn json_explicit_function() {
        let inv = Invocation::from_json(r#"{"function":"query","Args":["001"]}"#).unwrap();
        assert_eq!(inv.function, "query");
        assert_eq!(inv.args, vec!["001".to_string()]);
    }

    #[test]
    fn json_lowercase_args_alias() {
        let inv = Invocation::from_json(r#"{"args":["query","7"]}"#).unwrap();
        assert_eq!(inv.function, "query");
        assert_eq!(inv.args, vec!["7".to_string()]);
    }

    #[test]
    fn json_malformed_errors() {
        let err = Invocation::from_json(r#"{"Args":"query"}"#).unwrap_err();
        assert!(err.to_string().contains("malformed invocation"));
        assert!(Invocation::from_json("not json").is_err());
    }

    #[test]
    fn tx_ids_are_unique_and_overridable() {
        let a = Invocation::from_args(["query"]);
        let b = Invocation::from_args(["query"]);
        assert_ne!(a.tx_id, b.tx_id);
        assert_eq!(a.with_tx_id("tx-1").tx_id, "tx-1");
    }
}
