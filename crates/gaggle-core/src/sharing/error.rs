use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SharingError {
    #[error("trip {0} not found")]
    TripNotFound(Uuid),

    #[error("only the trip owner can do that")]
    NotOwner,

    #[error("you don't have access to this trip")]
    Forbidden,

    #[error("invite not found")]
    InviteNotFound,

    #[error("this invite has expired")]
    InviteExpired,

    #[error("this invite has already been used")]
    InviteClaimed,

    #[error("you already own this trip")]
    OwnInvite,

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("you can't flock with yourself")]
    SelfRequest,

    #[error("a flock request between you already exists")]
    DuplicateRequest,

    #[error("flock request not found")]
    RequestNotFound,

    #[error("only the recipient can answer this request")]
    NotAddressee,

    #[error("this request has already been answered")]
    AlreadyAnswered,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}
