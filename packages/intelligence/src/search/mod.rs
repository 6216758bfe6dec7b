//! Search provider clients.

pub mod brave;

pub use brave::BraveSearch;
