//! Draft Carts

mod handlers;
pub(crate) mod items;

pub(crate) use handlers::*;
