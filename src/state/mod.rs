pub mod notified;

pub use notified::NotifiedSet;
