pub mod ad;
pub mod adapters;
pub mod campaign;
pub mod context;
