//! Route table for the HTTP surface.

pub mod routes;
