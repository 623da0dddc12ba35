// Report ingestion: zone resolution, classification and severity aggregation.
// Pure and synchronous except for the shared index handle; no network calls.

pub mod classifier;
pub mod handlers;
pub mod index;
pub mod location;
pub mod records;
pub mod severity;
