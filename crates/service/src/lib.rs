pub mod clock;
pub mod costs;
pub mod errors;
