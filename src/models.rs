pub mod auth;
pub mod client;
pub mod lead;
pub mod objective;
pub mod space;
