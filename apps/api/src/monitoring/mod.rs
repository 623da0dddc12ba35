// Field monitoring: reported disaster alerts and raw sensor readings.
// Independent of the incident index; alerts only borrow the coordinate resolver.

pub mod handlers;
