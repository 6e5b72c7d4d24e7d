pub mod events;
pub mod jobs;
pub mod users;
pub mod wallet;
