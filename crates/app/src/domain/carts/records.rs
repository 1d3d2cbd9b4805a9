//! Cart Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        products::records::{LocalizedName, ProductRecord, ProductUuid},
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Active Cart UUID
pub type ActiveCartUuid = TypedUuid<ActiveCartRecord>;

/// Draft Cart UUID
pub type DraftCartUuid = TypedUuid<DraftCartRecord>;

/// Cart arithmetic left the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart arithmetic out of range")]
pub struct CartOverflow;

/// Why a line was moved out of the active cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftReason {
    PriceChange,
    OutOfStock,
}

impl DraftReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceChange => "price_change",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for DraftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown draft reason {0:?}")]
pub struct UnknownDraftReason(pub String);

impl FromStr for DraftReason {
    type Err = UnknownDraftReason;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "price_change" => Ok(Self::PriceChange),
            "out_of_stock" => Ok(Self::OutOfStock),
            other => Err(UnknownDraftReason(other.to_string())),
        }
    }
}

/// A product requested in a batch add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemQuantity {
    pub product: ProductUuid,
    pub quantity: u64,
}

/// Line Item
///
/// A snapshot of the product taken when the line was created. `unit_price`
/// is never re-read from the product afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product: ProductUuid,
    pub name: LocalizedName,
    pub cover: Option<String>,
    pub quantity: u64,
    pub unit_price: u64,
    pub line_total: u64,
}

/// Result of taking units away from a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shrink {
    /// The line keeps some units; `delta` was subtracted from its total.
    Reduced { delta: u64 },

    /// The line has to go; `line_total` is what it contributed.
    Emptied { line_total: u64 },
}

/// How a cart mutation changed a single line. Draft carts report the
/// [`DraftLineItem`] so its reason is written along with the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineChange<T = LineItem> {
    Unchanged,
    Upserted(T),
    Removed,
}

impl LineItem {
    /// Snapshot `product` at its current effective price.
    pub(crate) fn snapshot(product: &ProductRecord, quantity: u64) -> Result<Self, CartOverflow> {
        Ok(Self {
            product: product.uuid,
            name: product.name.clone(),
            cover: product.cover().map(str::to_string),
            quantity,
            unit_price: product.effective_price,
            line_total: product
                .effective_price
                .checked_mul(quantity)
                .ok_or(CartOverflow)?,
        })
    }

    /// Add `quantity` units at the line's own unit price, returning the
    /// amount added to its total.
    pub(crate) fn grow(&mut self, quantity: u64) -> Result<u64, CartOverflow> {
        let delta = self.unit_price.checked_mul(quantity).ok_or(CartOverflow)?;
        let line_total = self.line_total.checked_add(delta).ok_or(CartOverflow)?;

        self.quantity = self.quantity.checked_add(quantity).ok_or(CartOverflow)?;
        self.line_total = line_total;

        Ok(delta)
    }

    pub(crate) fn shrink(&mut self, quantity: u64) -> Result<Shrink, CartOverflow> {
        if self.quantity <= quantity {
            return Ok(Shrink::Emptied {
                line_total: self.line_total,
            });
        }

        let delta = self.unit_price.checked_mul(quantity).ok_or(CartOverflow)?;

        self.line_total = self.line_total.checked_sub(delta).ok_or(CartOverflow)?;
        self.quantity -= quantity;

        Ok(Shrink::Reduced { delta })
    }
}

/// Active Cart Record
#[derive(Debug, Clone)]
pub struct ActiveCartRecord {
    pub uuid: ActiveCartUuid,
    pub user: UserUuid,
    pub aggregate_total: u64,
    pub items: Vec<LineItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ActiveCartRecord {
    #[must_use]
    pub fn line(&self, product: ProductUuid) -> Option<&LineItem> {
        self.items.iter().find(|line| line.product == product)
    }

    pub(crate) fn add_product(
        &mut self,
        product: &ProductRecord,
        quantity: u64,
    ) -> Result<LineItem, CartOverflow> {
        let position = self.items.iter().position(|line| line.product == product.uuid);

        let (line, delta) = match position {
            Some(index) => {
                let delta = self.items[index].grow(quantity)?;

                (self.items[index].clone(), delta)
            }
            None => {
                let line = LineItem::snapshot(product, quantity)?;
                let delta = line.line_total;

                self.items.push(line.clone());

                (line, delta)
            }
        };

        self.aggregate_total = self
            .aggregate_total
            .checked_add(delta)
            .ok_or(CartOverflow)?;

        Ok(line)
    }

    pub(crate) fn remove_product(
        &mut self,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<LineChange, CartOverflow> {
        let Some(index) = self.items.iter().position(|line| line.product == product) else {
            return Ok(LineChange::Unchanged);
        };

        let (delta, change) = match self.items[index].shrink(quantity)? {
            Shrink::Reduced { delta } => (delta, LineChange::Upserted(self.items[index].clone())),
            Shrink::Emptied { line_total } => {
                self.items.remove(index);

                (line_total, LineChange::Removed)
            }
        };

        self.aggregate_total = self
            .aggregate_total
            .checked_sub(delta)
            .ok_or(CartOverflow)?;

        Ok(change)
    }

    /// Remove the whole line for `product`, if present.
    pub(crate) fn take_product(
        &mut self,
        product: ProductUuid,
    ) -> Result<Option<LineItem>, CartOverflow> {
        let Some(index) = self.items.iter().position(|line| line.product == product) else {
            return Ok(None);
        };

        let line = self.items.remove(index);

        self.aggregate_total = self
            .aggregate_total
            .checked_sub(line.line_total)
            .ok_or(CartOverflow)?;

        Ok(Some(line))
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.aggregate_total = 0;
    }
}

/// Draft Line Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLineItem {
    pub line: LineItem,

    /// `None` for lines the user put in the draft cart directly.
    pub reason: Option<DraftReason>,
}

/// Draft Cart Record
#[derive(Debug, Clone)]
pub struct DraftCartRecord {
    pub uuid: DraftCartUuid,
    pub user: UserUuid,
    pub items: Vec<DraftLineItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DraftCartRecord {
    #[must_use]
    pub fn line(&self, product: ProductUuid) -> Option<&DraftLineItem> {
        self.items.iter().find(|item| item.line.product == product)
    }

    pub(crate) fn add_product(
        &mut self,
        product: &ProductRecord,
        quantity: u64,
    ) -> Result<DraftLineItem, CartOverflow> {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.line.product == product.uuid)
        {
            item.line.grow(quantity)?;

            return Ok(item.clone());
        }

        let item = DraftLineItem {
            line: LineItem::snapshot(product, quantity)?,
            reason: None,
        };

        self.items.push(item.clone());

        Ok(item)
    }

    /// Merge a line moved out of the active cart. The quantities are summed
    /// and the snapshot, price and reason are refreshed from `product`.
    pub(crate) fn merge_moved(
        &mut self,
        product: &ProductRecord,
        quantity: u64,
        reason: DraftReason,
    ) -> Result<DraftLineItem, CartOverflow> {
        let position = self
            .items
            .iter()
            .position(|item| item.line.product == product.uuid);

        let total_quantity = match position {
            Some(index) => self.items[index]
                .line
                .quantity
                .checked_add(quantity)
                .ok_or(CartOverflow)?,
            None => quantity,
        };

        let item = DraftLineItem {
            line: LineItem::snapshot(product, total_quantity)?,
            reason: Some(reason),
        };

        match position {
            Some(index) => self.items[index] = item.clone(),
            None => self.items.push(item.clone()),
        }

        Ok(item)
    }

    pub(crate) fn remove_product(
        &mut self,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<LineChange<DraftLineItem>, CartOverflow> {
        let Some(index) = self
            .items
            .iter()
            .position(|item| item.line.product == product)
        else {
            return Ok(LineChange::Unchanged);
        };

        match self.items[index].line.shrink(quantity)? {
            Shrink::Reduced { .. } => Ok(LineChange::Upserted(self.items[index].clone())),
            Shrink::Emptied { .. } => {
                self.items.remove(index);

                Ok(LineChange::Removed)
            }
        }
    }

    pub(crate) fn take_product(&mut self, product: ProductUuid) -> Option<DraftLineItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.line.product == product)?;

        Some(self.items.remove(index))
    }
}
