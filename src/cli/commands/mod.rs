pub mod routes;
pub mod server;
pub mod token;
