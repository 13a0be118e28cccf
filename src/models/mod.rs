mod from_row;
mod token;
mod user;
mod workout;

pub use from_row::FromSqliteRow;
pub use token::{AccessTokenRecord, RefreshTokenRecord, TokenGrant};
pub use user::{LoginForm, RegisterForm, User, UserRole};
pub use workout::{Workout, WorkoutFields, WorkoutForm};
