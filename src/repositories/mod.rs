pub mod session_repo;
pub mod token_repo;
pub mod user_repo;
pub mod workout_repo;

pub use session_repo::SessionRepository;
pub use token_repo::TokenRepository;
pub use user_repo::UserRepository;
pub use workout_repo::{SortOrder, WorkoutRepository};
