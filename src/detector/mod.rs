pub mod classifier;
pub mod clock;

pub use classifier::classify_with_stats;
