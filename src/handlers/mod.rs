//! HTTP layer — request DTOs, response envelopes, and the mapping from
//! service results onto status codes.

pub mod account_handlers;
pub mod booking_handlers;
pub mod health_handlers;
pub mod spot_handlers;
