pub mod registry;

pub use registry::SlotRegistry;
