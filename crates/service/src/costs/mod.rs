pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;
pub mod users_client;
pub mod validation;
