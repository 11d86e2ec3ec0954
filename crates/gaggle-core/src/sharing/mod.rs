//! Sharing and collaboration: public share codes, invite links,
//! collaborators and flock (friend) connections.

mod codes;
mod error;
pub mod collaborators;
pub mod flock;
pub mod invites;
pub mod share;

pub use codes::{INVITE_CODE_BYTES, SHARE_CODE_LEN, generate_invite_code, generate_share_code};
pub use error::SharingError;
