pub mod error;
pub mod events;
pub mod nullable;
pub mod validation;
