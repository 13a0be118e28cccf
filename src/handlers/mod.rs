pub mod account;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod strava;
pub mod workouts;
