pub mod allocator;
pub mod engine;
pub mod filter;
pub mod resolver;
