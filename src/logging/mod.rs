pub mod allocation_log;
pub mod runtime_logger;
