//! Tamper-evident transport of proof states.
//!
//! The engine keeps no session memory: every state leaves it together with a
//! seal over its canonical encoding, and every inbound state is rejected
//! unless its seal still matches.

use crate::error::{LogicError, Result};
use crate::misc::log::targets;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A state that can be sealed
pub trait ProtectedState {
    /// Distinguishes states of different calculi with equal encodings
    const SEAL_DOMAIN: &'static str;

    /// Total, order-sensitive, whitespace-free encoding of every field that
    /// affects validity
    fn canonical_info(&self) -> String;

    fn compute_seal(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::SEAL_DOMAIN.as_bytes());
        hasher.update(b"|");
        hasher.update(self.canonical_info().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn verify_seal(&self, seal: &str) -> bool {
        self.compute_seal() == seal
    }
}

/// Wire envelope: the state's fields plus its seal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sealed<S> {
    #[serde(flatten)]
    pub state: S,
    pub seal: String,
}

impl<S: ProtectedState> Sealed<S> {
    pub fn new(state: S) -> Self {
        let seal = state.compute_seal();
        Sealed { state, seal }
    }

    /// Verify the seal and hand out the state
    pub fn open(self) -> Result<S> {
        if self.state.verify_seal(&self.seal) {
            Ok(self.state)
        } else {
            log::warn!(
                target: targets::SEAL,
                "rejecting {} state with invalid seal",
                S::SEAL_DOMAIN
            );
            Err(LogicError::JsonParse(
                "Invalid tamper protection seal, state object appears to have been modified"
                    .to_string(),
            ))
        }
    }
}

impl<S: ProtectedState + Serialize> Sealed<S> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<S: ProtectedState + DeserializeOwned> Sealed<S> {
    /// Parse a sealed state and verify it
    pub fn open_json(json: &str) -> Result<S> {
        let sealed: Sealed<S> = serde_json::from_str(json)?;
        sealed.open()
    }
}

/// Join canonical encodings as `[a,b,c]`
pub fn encode_list<T>(items: &[T], encode: impl Fn(&T) -> String) -> String {
    let parts: Vec<String> = items.iter().map(encode).collect();
    format!("[{}]", parts.join(","))
}

/// Canonical encoding of an optional index
pub fn encode_opt(value: Option<usize>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
        history: Vec<u32>,
    }

    impl ProtectedState for Counter {
        const SEAL_DOMAIN: &'static str = "counter";

        fn canonical_info(&self) -> String {
            format!("{}|{}", self.value, encode_list(&self.history, u32::to_string))
        }
    }

    #[test]
    fn test_seal_roundtrip() {
        let state = Counter { value: 3, history: vec![1, 2] };
        let json = Sealed::new(state.clone()).to_json().unwrap();
        assert!(json.contains("\"seal\":\""));
        assert_eq!(Sealed::<Counter>::open_json(&json).unwrap(), state);
    }

    #[test]
    fn test_seal_is_sha256_hex() {
        let seal = Counter { value: 0, history: vec![] }.compute_seal();
        assert_eq!(seal.len(), 64);
        assert!(seal.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tampered_state_rejected() {
        let json = Sealed::new(Counter { value: 3, history: vec![] }).to_json().unwrap();
        let tampered = json.replace("\"value\":3", "\"value\":4");
        assert!(matches!(
            Sealed::<Counter>::open_json(&tampered),
            Err(LogicError::JsonParse(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Sealed::<Counter>::open_json("{\"value\":"),
            Err(LogicError::JsonParse(_))
        ));
    }

    #[test]
    fn test_encoders() {
        assert_eq!(encode_list(&[1u32, 2], u32::to_string), "[1,2]");
        assert_eq!(encode_opt(None), "null");
        assert_eq!(encode_opt(Some(4)), "4");
    }
}
