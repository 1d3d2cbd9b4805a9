//! Cart Item Handlers

pub(crate) mod batch;
pub(crate) mod create;
pub(crate) mod delete;
