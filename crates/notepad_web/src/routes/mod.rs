//! HTTP route tables.

pub mod actions;
pub mod events;
pub mod pages;
pub mod uploads;
