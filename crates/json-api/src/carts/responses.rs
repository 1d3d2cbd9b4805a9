//! Cart Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::carts::records::{
    ActiveCartRecord, DraftCartRecord, DraftLineItem, DraftReason, LineItem,
};

use crate::products::get::NameBody;

/// Line Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineItemResponse {
    /// The product on this line
    pub product: Uuid,

    /// Product name when the line was created
    pub name: NameBody,

    /// Product cover when the line was created
    pub cover: Option<String>,

    /// Units on the line
    pub quantity: u64,

    /// Price per unit the line was created at
    pub unit_price: u64,

    /// `quantity * unit_price`
    pub line_total: u64,
}

impl From<LineItem> for LineItemResponse {
    fn from(line: LineItem) -> Self {
        Self {
            product: line.product.into(),
            name: line.name.into(),
            cover: line.cover,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        }
    }
}

/// Active Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// The unique identifier of the cart
    pub uuid: Uuid,

    /// Sum of every line total
    pub aggregate_total: u64,

    /// The lines in the cart
    pub items: Vec<LineItemResponse>,

    /// The date and time the cart was created
    pub created_at: String,

    /// The date and time the cart was last updated
    pub updated_at: String,
}

impl From<ActiveCartRecord> for CartResponse {
    fn from(cart: ActiveCartRecord) -> Self {
        CartResponse {
            uuid: cart.uuid.into(),
            aggregate_total: cart.aggregate_total,
            items: cart.items.into_iter().map(Into::into).collect(),
            created_at: cart.created_at.to_string(),
            updated_at: cart.updated_at.to_string(),
        }
    }
}

/// Draft Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DraftLineResponse {
    #[serde(flatten)]
    pub line: LineItemResponse,

    /// Why the line left the active cart, absent for lines added directly
    pub reason: Option<DraftReasonBody>,
}

/// Why a line was moved out of the active cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DraftReasonBody {
    PriceChange,
    OutOfStock,
}

impl From<DraftReason> for DraftReasonBody {
    fn from(reason: DraftReason) -> Self {
        match reason {
            DraftReason::PriceChange => Self::PriceChange,
            DraftReason::OutOfStock => Self::OutOfStock,
        }
    }
}

impl From<DraftLineItem> for DraftLineResponse {
    fn from(item: DraftLineItem) -> Self {
        Self {
            line: item.line.into(),
            reason: item.reason.map(Into::into),
        }
    }
}

/// Draft Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DraftCartResponse {
    /// The unique identifier of the draft cart
    pub uuid: Uuid,

    /// Lines waiting to be confirmed
    pub items: Vec<DraftLineResponse>,

    /// The date and time the cart was created
    pub created_at: String,

    /// The date and time the cart was last updated
    pub updated_at: String,
}

impl From<DraftCartRecord> for DraftCartResponse {
    fn from(cart: DraftCartRecord) -> Self {
        DraftCartResponse {
            uuid: cart.uuid.into(),
            items: cart.items.into_iter().map(Into::into).collect(),
            created_at: cart.created_at.to_string(),
            updated_at: cart.updated_at.to_string(),
        }
    }
}
