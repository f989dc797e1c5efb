//! Peer-style chaincode response.

/// Status for a successful invocation.
pub const OK: i32 = 200;
/// Status the host treats as "endorsement failed".
pub const ERROR: i32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn success(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OK
    }

    /// Payload as UTF-8, replacing invalid sequences. Empty when absent.
    pub fn payload_lossy(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_payload() {
        let r = Response::success(Some(b"{}".to_vec()));
        assert!(r.is_ok());
        assert_eq!(r.status, 200);
        assert!(r.message.is_empty());
        assert_eq!(r.payload_lossy(), "{}");
    }

    #[test]
    fn error_has_no_payload() {
        let r = Response::error("boom");
        assert!(!r.is_ok());
        assert_eq!(r.status, 500);
        assert_eq!(r.message, "boom");
        assert_eq!(r.payload, None);
        assert_eq!(r.payload_lossy(), "");
    }
}
