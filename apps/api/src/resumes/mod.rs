pub mod form;
pub mod handlers;
pub mod query;
pub mod repository;
pub mod schema;
pub mod store;
pub mod wire;

#[cfg(test)]
pub mod testing;
