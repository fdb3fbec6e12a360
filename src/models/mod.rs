//! Core data models for the spot booking marketplace.
//!
//! One struct per table: accounts, bookable spots and their catalog tags,
//! published availability and slots, and the booking/review rows that tie
//! them together. Each derives `sqlx::FromRow` for reads and `serde` for
//! the wire, with camelCase field names on the way out.

pub mod availability;
pub mod booking;
pub mod city;
pub mod review;
pub mod slot;
pub mod spot;
pub mod style;
pub mod user;
