//! Per-table query functions. They take a plain `&Connection` so callers can
//! run them either directly or inside a transaction.

pub mod accounts;
pub mod countries;
pub mod fields;
pub mod groups;
pub mod members;
pub mod messages;
pub mod metas;
pub mod persons;
pub mod sessions;
pub mod users;
