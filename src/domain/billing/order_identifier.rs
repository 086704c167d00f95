//! Composite order identifier carried in `order.merchant_order_id`.
//!
//! The platform encodes the business context of a checkout into the one
//! free-form field the processor echoes back:
//!
//! ```text
//! <subscriberId>---<productType>---<planTier>---<issuedAtEpochMillis>
//! ```
//!
//! Decoding is strict: exactly four non-empty segments, a known product type,
//! a known plan tier and a positive integer timestamp. Anything else is a
//! [`OrderIdentifierError`] and the callback is rejected with no side effects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::SubscriberId;

use super::tier::PlanTier;

/// Separator between the four segments.
pub const SEPARATOR: &str = "---";

const SEGMENT_COUNT: usize = 4;

/// Product families that can be purchased through the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Recurring plan subscription.
    Subscription,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Subscription => "SUBSCRIPTION",
        }
    }
}

impl FromStr for ProductType {
    type Err = OrderIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBSCRIPTION" => Ok(ProductType::Subscription),
            other => Err(OrderIdentifierError::UnknownProductType(other.to_string())),
        }
    }
}

/// Why a composite identifier failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderIdentifierError {
    #[error("expected 4 segments separated by '---', found {0}")]
    SegmentCount(usize),

    #[error("segment '{0}' is empty")]
    EmptySegment(&'static str),

    #[error("segment '{0}' contains the separator")]
    ContainsSeparator(&'static str),

    #[error("segment '{0}' ends with '-' and would run into the separator")]
    TrailingDash(&'static str),

    #[error("unknown product type: {0}")]
    UnknownProductType(String),

    #[error("unknown plan tier: {0}")]
    UnknownPlanTier(String),

    #[error("issued-at must be a positive integer, got '{0}'")]
    InvalidIssuedAt(String),
}

/// Business context recovered from a processor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIdentifier {
    pub subscriber_id: SubscriberId,
    pub product_type: ProductType,
    pub plan_tier: PlanTier,
    pub issued_at_millis: u64,
}

impl OrderIdentifier {
    /// Builds an identifier, enforcing the same invariants as [`decode`].
    ///
    /// [`decode`]: OrderIdentifier::decode
    pub fn new(
        subscriber_id: SubscriberId,
        product_type: ProductType,
        plan_tier: PlanTier,
        issued_at_millis: u64,
    ) -> Result<Self, OrderIdentifierError> {
        if subscriber_id.as_str().contains(SEPARATOR) {
            return Err(OrderIdentifierError::ContainsSeparator("subscriber_id"));
        }
        // "a----SUBSCRIPTION" splits as "a" and "-SUBSCRIPTION"
        if subscriber_id.as_str().ends_with('-') {
            return Err(OrderIdentifierError::TrailingDash("subscriber_id"));
        }
        if issued_at_millis == 0 {
            return Err(OrderIdentifierError::InvalidIssuedAt("0".to_string()));
        }
        Ok(Self {
            subscriber_id,
            product_type,
            plan_tier,
            issued_at_millis,
        })
    }

    /// Parses `<subscriberId>---<productType>---<planTier>---<issuedAt>`.
    pub fn decode(raw: &str) -> Result<Self, OrderIdentifierError> {
        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(OrderIdentifierError::SegmentCount(segments.len()));
        }

        let names = ["subscriber_id", "product_type", "plan_tier", "issued_at"];
        for (segment, name) in segments.iter().zip(names) {
            if segment.is_empty() {
                return Err(OrderIdentifierError::EmptySegment(name));
            }
        }

        let subscriber_id = SubscriberId::new(segments[0])
            .map_err(|_| OrderIdentifierError::EmptySegment("subscriber_id"))?;
        let product_type: ProductType = segments[1].parse()?;
        let plan_tier: PlanTier = segments[2]
            .parse()
            .map_err(|_| OrderIdentifierError::UnknownPlanTier(segments[2].to_string()))?;
        let issued_at_millis = parse_positive(segments[3])?;

        Ok(Self {
            subscriber_id,
            product_type,
            plan_tier,
            issued_at_millis,
        })
    }

    /// Exact inverse of [`decode`](OrderIdentifier::decode).
    pub fn encode(&self) -> String {
        [
            self.subscriber_id.as_str(),
            self.product_type.as_str(),
            self.plan_tier.as_str(),
            &self.issued_at_millis.to_string(),
        ]
        .join(SEPARATOR)
    }
}

/// Digits only: `u64::from_str` would also accept a leading `+`.
fn parse_positive(raw: &str) -> Result<u64, OrderIdentifierError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OrderIdentifierError::InvalidIssuedAt(raw.to_string()));
    }
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(OrderIdentifierError::InvalidIssuedAt(raw.to_string())),
    }
}

impl FromStr for OrderIdentifier {
    type Err = OrderIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for OrderIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
