pub mod errors;
pub mod db;
pub mod cost;
pub mod report;
pub mod users;
