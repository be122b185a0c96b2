/// Use cases module containing application business logic orchestration
mod generate_bom;

pub use generate_bom::{GenerateBomUseCase, STDOUT_DESTINATION};
