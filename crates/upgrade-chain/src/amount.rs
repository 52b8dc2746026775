//! Native-currency and token amounts
//!
//! Amounts are raw integer units (wei-style, 18 decimals for most tokens).
//! Text forms use decimal digits; `_` separators are accepted.

/// Amount in the smallest unit
pub type Amount = u128;

/// One whole token with 18 decimals
pub const E18: Amount = 1_000_000_000_000_000_000;

/// Parse a decimal amount
///
/// # Errors
/// Returns the offending text when it is not a base-10 integer
pub fn parse(text: &str) -> Result<Amount, String> {
    let digits: String = text.trim().chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return Err(text.to_string());
    }
    digits.parse::<Amount>().map_err(|_| text.to_string())
}

/// Serde adapter: serialize as a decimal string, accept strings or integers
pub mod serde_str {
    use super::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    /// Serialize as decimal string
    ///
    /// # Errors
    /// Propagates serializer errors
    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    /// Deserialize from decimal string or integer
    ///
    /// # Errors
    /// Fails on non-numeric text
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(Amount::from(n)),
            Repr::Text(text) => super::parse(&text)
                .map_err(|t| serde::de::Error::custom(format!("invalid amount: {t}"))),
        }
    }
}
