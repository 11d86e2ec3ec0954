pub mod chat;
pub mod collaborators;
pub mod flock;
pub mod invites;
pub mod trips;
