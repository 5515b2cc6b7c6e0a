pub mod auth;
pub mod clients;
pub mod leads;
pub mod objectives;
pub mod spaces;
