pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod observability;
pub mod proxy;
pub mod routes;
pub mod routing;
