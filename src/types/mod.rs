//! Data types for HTD zone events.

pub mod zone;

pub use zone::{Level, ZONE_COUNT, ZoneState, ZoneStatus, on_off};
