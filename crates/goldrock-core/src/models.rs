pub mod attempt;
pub mod case;
pub mod progress;
pub mod traversal;
pub mod tree;
pub mod usage;
