use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of an order.
///
/// The backend stores statuses as free strings and two vocabularies coexist:
/// the legacy English values and the current Spanish ones. Raw strings are
/// normalized exactly once, when a row is deserialized or a value enters the
/// system through [`OrderStatus::parse`]. Everything downstream compares
/// variants, never strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    EnRoute,
    Delivered,
    Cancelled,
    /// A raw value outside every synonym set. Kept verbatim so it can be logged.
    Unknown(String),
}

impl OrderStatus {
    /// Maps a raw backend value onto its variant. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" | "pendiente" => Self::Pending,
            "confirmed" | "confirmado" => Self::Confirmed,
            "preparing" | "preparando" => Self::Preparing,
            "ready" | "listo" => Self::Ready,
            "en_route" | "en_camino" | "on_way" => Self::EnRoute,
            "delivered" | "entregado" => Self::Delivered,
            "cancelled" | "cancelado" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical value written back to the backend.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pendiente",
            Self::Confirmed => "confirmado",
            Self::Preparing => "preparando",
            Self::Ready => "listo",
            Self::EnRoute => "en_camino",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
