pub mod checks;
pub mod reports;
pub mod roster;
pub mod tester;

pub use tester::*;
