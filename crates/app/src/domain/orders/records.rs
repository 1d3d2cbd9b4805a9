//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{carts::records::LineItem, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Largest page [`OrderFilter`] will return.
pub const MAX_ORDERS_PAGE: u64 = 100;

const DEFAULT_ORDERS_PAGE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// Order Record
///
/// The line items are copied from the active cart at checkout and never
/// change afterwards; only `status` moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub items: Vec<LineItem>,
    pub total: u64,
    pub status: OrderStatus,
    pub payment_session: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user: Option<UserUuid>,
    pub offset: u64,
    pub limit: u64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            user: None,
            offset: 0,
            limit: DEFAULT_ORDERS_PAGE,
        }
    }
}

impl OrderFilter {
    /// The page size actually used: at least one, at most [`MAX_ORDERS_PAGE`].
    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.limit.clamp(1, MAX_ORDERS_PAGE)
    }
}
