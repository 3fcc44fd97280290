pub mod csv;
pub mod fabric;
