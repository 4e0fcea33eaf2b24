//! Money types for API boundary enforcement
//!
//! - `StrictDecimal`: Format-validated amount input type

use std::fmt;

use rust_decimal::prelude::*;
use serde::de::{self, Visitor};
use serde::{Deserialize, Serialize};

// ============================================================================
// StrictDecimal: Format-Validated Decimal at Serde Layer
// ============================================================================

/// Strict format Decimal - validates format during deserialization
///
/// Accepts a JSON string or a JSON number. Strings are checked before parsing:
/// - Rejects `.5` (must be `0.5`)
/// - Rejects `5.` (must be `5.0` or `5`)
/// - Rejects empty strings
/// - Rejects scientific notation
/// - Rejects a `+` prefix
///
/// The sign is not checked here. Non-positive transfer amounts are rejected
/// by the engine with `INVALID_AMOUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictDecimal(Decimal);

impl StrictDecimal {
    /// Get the inner Decimal value
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for StrictDecimal {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl std::ops::Deref for StrictDecimal {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse_strict(s: &str) -> Result<Decimal, String> {
    if s.is_empty() {
        return Err("Amount cannot be empty".into());
    }

    let digits = s.strip_prefix('-').unwrap_or(s);

    // Reject .5 format (must be 0.5)
    if digits.starts_with('.') {
        return Err("Invalid format: use 0.5 not .5".into());
    }

    // Reject 5. format (must be 5.0 or 5)
    if digits.ends_with('.') {
        return Err("Invalid format: use 5.0 not 5.".into());
    }

    if s.contains('e') || s.contains('E') {
        return Err("Invalid format: scientific notation not allowed".into());
    }

    if s.starts_with('+') {
        return Err("Invalid format: + prefix not allowed".into());
    }

    Decimal::from_str(s).map_err(|e| format!("Invalid decimal: {}", e))
}

struct StrictDecimalVisitor;

impl Visitor<'_> for StrictDecimalVisitor {
    type Value = StrictDecimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_strict(v).map(StrictDecimal).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(StrictDecimal(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(StrictDecimal(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Decimal::from_f64(v)
            .map(|d| StrictDecimal(d.normalize()))
            .ok_or_else(|| E::custom(format!("Invalid decimal: {}", v)))
    }
}

impl<'de> Deserialize<'de> for StrictDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(StrictDecimalVisitor)
    }
}

impl Serialize for StrictDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
