pub mod reconciler;
pub mod scanner;
pub mod tabs;

pub use reconciler::Reconciler;
pub use scanner::RosterScanner;
pub use tabs::{ShiftTabResolver, TabFilter};
