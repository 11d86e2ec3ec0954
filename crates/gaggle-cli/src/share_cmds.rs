//! `gaggle share`, `invite`, `collaborator` and `flock` commands.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_core::sharing::{collaborators, flock, invites, share};
use gaggle_db::models::FlockStatus;

use crate::config::GaggleConfig;
use crate::trip_cmds::parse_trip_id;
use crate::{CollaboratorCommands, FlockCommands, InviteCommands};

pub async fn run_share(
    pool: &PgPool,
    config: &GaggleConfig,
    trip_id: &str,
    private: bool,
) -> Result<()> {
    let user = config.require_user()?;
    let id = parse_trip_id(trip_id)?;
    let record = share::share_trip(pool, id, user, !private).await?;
    let code = record.share_code.as_deref().unwrap_or_default();
    if record.is_public {
        println!("Share code: {code}");
        println!("Link: {}/api/shared/{code}", config.public_url.trim_end_matches('/'));
    } else {
        println!("Sharing turned off for {} (code {code} kept).", record.location);
    }
    Ok(())
}

pub async fn run_invite_command(
    command: InviteCommands,
    pool: &PgPool,
    config: &GaggleConfig,
) -> Result<()> {
    let user = config.require_user()?;
    match command {
        InviteCommands::Create { trip_id, role } => {
            let id = parse_trip_id(&trip_id)?;
            let link = invites::create_invite(pool, id, user, role, &config.public_url).await?;
            println!("{}", link.url);
            println!(
                "Role: {}, expires {}",
                link.invite.role,
                link.invite.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        InviteCommands::Claim { code } => {
            let collaborator = invites::claim_invite(pool, &code, user).await?;
            println!(
                "Joined trip {} as {}.",
                collaborator.trip_id, collaborator.role
            );
        }
    }
    Ok(())
}

pub async fn run_collaborator_command(
    command: CollaboratorCommands,
    pool: &PgPool,
    config: &GaggleConfig,
) -> Result<()> {
    let user = config.require_user()?;
    match command {
        CollaboratorCommands::Add {
            trip_id,
            email,
            role,
        } => {
            let id = parse_trip_id(&trip_id)?;
            let c = collaborators::add_collaborator(pool, id, user, &email, role).await?;
            println!("Invited {} as {}.", c.email, c.role);
        }
        CollaboratorCommands::List { trip_id } => {
            let id = parse_trip_id(&trip_id)?;
            let list = collaborators::list_collaborators(pool, id, user).await?;
            if list.is_empty() {
                println!("No collaborators.");
            }
            for c in &list {
                let state = if c.accepted_at.is_some() {
                    "joined"
                } else {
                    "invited"
                };
                println!("  {:<32} {:<7} {state}", c.email, c.role.to_string());
            }
        }
    }
    Ok(())
}

pub async fn run_flock_command(
    command: FlockCommands,
    pool: &PgPool,
    config: &GaggleConfig,
) -> Result<()> {
    let user = config.require_user()?;
    match command {
        FlockCommands::Request { email } => {
            let conn = flock::request(pool, user, &email).await?;
            println!("Sent flock request {} to {}.", conn.id, conn.addressee);
        }
        FlockCommands::Respond { id, decline } => {
            let id = Uuid::parse_str(&id).with_context(|| format!("invalid request ID: {id}"))?;
            let conn = flock::respond(pool, id, user, !decline).await?;
            println!("Request from {} {}.", conn.requester, conn.status);
        }
        FlockCommands::List => {
            let conns = flock::list(pool, user).await?;
            if conns.is_empty() {
                println!("Your flock is empty.");
            }
            for c in &conns {
                let direction = if c.requester == user { "->" } else { "<-" };
                let marker = match c.status {
                    FlockStatus::Pending => "?",
                    FlockStatus::Accepted => "+",
                    FlockStatus::Declined => "x",
                };
                println!("  [{marker}] {direction} {:<32} {}", c.peer_of(user), c.id);
            }
        }
    }
    Ok(())
}
