// Resources, volunteers and the assignment engine that pairs them.
// Every mutation of assignment state goes through a ReliefStore implementation.

pub mod engine;
pub mod handlers;
pub mod memory;
pub mod postgres;
pub mod store;
