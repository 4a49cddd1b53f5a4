pub mod collections;
pub mod repository;
pub mod sqlite;
