pub mod activity_logs;
pub mod health;
pub mod resources;
pub mod users;
