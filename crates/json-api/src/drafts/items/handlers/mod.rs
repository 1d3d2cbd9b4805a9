//! Draft Cart Item Handlers

pub(crate) mod confirm;
pub(crate) mod create;
pub(crate) mod delete;
