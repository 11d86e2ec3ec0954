use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Access level granted to a trip collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
}

impl CollaboratorRole {
    /// Whether this role may change the itinerary or its progress.
    pub fn can_edit(self) -> bool {
        matches!(self, Self::Editor)
    }
}

impl fmt::Display for CollaboratorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
        })
    }
}

impl FromStr for CollaboratorRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            other => Err(ParseEnumError::new("collaborator role", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// State of a flock (friend) connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlockStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for FlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        })
    }
}

impl FromStr for FlockStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(ParseEnumError::new("flock status", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Author of a stored chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

impl FromStr for ChatRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(ParseEnumError::new("chat role", other)),
        }
    }
}

/// Error returned when a stored or user-supplied enum string is unknown.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A saved trip. Structured columns (`families`, `itinerary`, ...) are JSONB
/// and decoded into domain types by `gaggle-core`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub owner: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub families: serde_json::Value,
    pub nest: Option<serde_json::Value>,
    pub meal_preferences: Option<serde_json::Value>,
    pub itinerary: serde_json::Value,
    pub progress: serde_json::Value,
    pub share_code: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub trip_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collaborator {
    pub trip_id: Uuid,
    pub email: String,
    pub role: CollaboratorRole,
    pub invited_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// A claimable invite code for a trip.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripInvite {
    pub code: String,
    pub trip_id: Uuid,
    pub role: CollaboratorRole,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl TripInvite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlockConnection {
    pub id: Uuid,
    pub requester: String,
    pub addressee: String,
    pub status: FlockStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl FlockConnection {
    /// The other side of the connection, seen from `user`.
    pub fn peer_of(&self, user: &str) -> &str {
        if self.requester == user {
            &self.addressee
        } else {
            &self.requester
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn collaborator_role_display_roundtrip() {
        for v in [CollaboratorRole::Viewer, CollaboratorRole::Editor] {
            let parsed: CollaboratorRole = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn collaborator_role_invalid() {
        let err = "owner".parse::<CollaboratorRole>().unwrap_err();
        assert_eq!(err.to_string(), "invalid collaborator role: \"owner\"");
    }

    #[test]
    fn only_editors_can_edit() {
        assert!(CollaboratorRole::Editor.can_edit());
        assert!(!CollaboratorRole::Viewer.can_edit());
    }

    #[test]
    fn flock_status_display_roundtrip() {
        for v in [
            FlockStatus::Pending,
            FlockStatus::Accepted,
            FlockStatus::Declined,
        ] {
            let parsed: FlockStatus = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn chat_role_invalid() {
        assert!("system".parse::<ChatRole>().is_err());
    }

    #[test]
    fn invite_expiry_is_inclusive() {
        let now = Utc::now();
        let invite = TripInvite {
            code: "abc".into(),
            trip_id: Uuid::nil(),
            role: CollaboratorRole::Viewer,
            created_by: "owner@example.com".into(),
            created_at: now - Duration::days(7),
            expires_at: now,
            claimed_by: None,
            claimed_at: None,
        };
        assert!(invite.is_expired(now));
        assert!(!invite.is_expired(now - Duration::seconds(1)));
        assert!(!invite.is_claimed());
    }

    #[test]
    fn flock_peer_resolution() {
        let conn = FlockConnection {
            id: Uuid::nil(),
            requester: "a@example.com".into(),
            addressee: "b@example.com".into(),
            status: FlockStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        assert_eq!(conn.peer_of("a@example.com"), "b@example.com");
        assert_eq!(conn.peer_of("b@example.com"), "a@example.com");
    }
}
