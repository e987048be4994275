// src/lib.rs

use std::sync::Arc;

pub mod allocation;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

use allocation::engine::AllocationEngine;
use logging::runtime_logger::RuntimeLogger;

#[derive(Clone)]
pub struct AppState {
    pub runtime_logger: Arc<RuntimeLogger>,
    pub engine: Arc<AllocationEngine>,
}
