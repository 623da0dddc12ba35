pub mod monitoring;
pub mod relief;
