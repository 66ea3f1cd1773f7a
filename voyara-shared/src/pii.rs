use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive payloads (card PANs) that masks its value in Debug,
/// Display and Serialize output. The inner value is only reachable through
/// explicit accessors, so it cannot leak through log macros or response bodies.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Card data is inbound-only; nothing this wrapper holds is ever echoed
        // back to a caller, so serialization masks unconditionally.
        serializer.serialize_str("********")
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Masked<String> {
    /// Trailing digits for receipts ("card ending 4242"). Safe to log.
    pub fn last4(&self) -> &str {
        let digits = self.0.len().saturating_sub(4);
        &self.0[digits..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_never_prints_inner() {
        let pan = Masked("4242424242424242".to_string());
        assert_eq!(format!("{}", pan), "********");
        assert_eq!(format!("{:?}", pan), "********");
        assert_eq!(serde_json::to_string(&pan).unwrap(), "\"********\"");
    }

    #[test]
    fn test_last4() {
        let pan = Masked("4242424242424242".to_string());
        assert_eq!(pan.last4(), "4242");

        let short = Masked("42".to_string());
        assert_eq!(short.last4(), "42");
    }
}
