//! Offer Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

#[cfg(test)]
pub(crate) mod tests {
    use jiff::Timestamp;
    use souq_app::domain::{
        offers::records::{OfferRecord, OfferUuid},
        pricing::Discount,
        products::records::ProductUuid,
    };

    pub(crate) fn make_offer(uuid: OfferUuid, product: ProductUuid) -> OfferRecord {
        OfferRecord {
            uuid,
            product,
            name: None,
            discount: Discount::Fixed(300),
            offer_quantity: 20,
            max_per_client: 2,
            quantity_purchased: 0,
            disabled: false,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
