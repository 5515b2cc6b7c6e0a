pub mod auth;
pub mod client_service;
pub mod lead_service;
pub mod objective_engine;
pub mod objective_service;
pub mod progress_grid;
pub mod space_service;
pub mod stage_automation;
