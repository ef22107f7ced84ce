use std::fmt;

use serde::{Deserialize, Deserializer};

/// Opaque identifier assigned by the server when an order is accepted.
/// Immutable once obtained; every poll for the artifact quotes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(s.to_string())
    }
}

/// 202 acceptance envelope. The order id sits behind a nested
/// service-specific wrapper; anything off this single path is treated as a
/// malformed acceptance by the caller.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderAcceptance {
    #[serde(default, rename = "elaboreProduitAvecDemandeResponse")]
    reply: Option<AcceptanceReply>,
}

#[derive(Debug, Deserialize)]
struct AcceptanceReply {
    #[serde(default, rename = "return", deserialize_with = "id_string")]
    order_id: Option<String>,
}

impl OrderAcceptance {
    pub(crate) fn into_order_id(self) -> Option<OrderId> {
        self.reply?
            .order_id
            .filter(|id| !id.trim().is_empty())
            .map(OrderId)
    }
}

/// The `return` field has been observed both as a string and as a number.
fn id_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        None => None,
    })
}
