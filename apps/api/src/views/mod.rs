// Read-only views over the current incident index, consumed by dashboards.

pub mod handlers;
pub mod historical;
pub mod zones;
