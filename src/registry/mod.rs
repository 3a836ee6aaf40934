mod core;

pub use core::PageRegistry;
