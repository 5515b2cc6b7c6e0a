pub mod user_repo;
pub use user_repo::UserRepository;
pub mod space_repo;
pub use space_repo::SpaceRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod objective_repo;
pub use objective_repo::ObjectiveRepository;
