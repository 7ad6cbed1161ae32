pub mod attempt;
pub mod fallback;
pub mod pool;
pub mod redirect;
pub mod retry;

mod engine;

pub use engine::{ProbeEngine, TargetItem, TechDetector};
