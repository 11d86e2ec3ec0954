//! Integration tests for the trip service and sharing flows against a real
//! PostgreSQL database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use gaggle_core::itinerary::{Category, DateRange, ItineraryItem};
use gaggle_core::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use gaggle_core::notice::Notices;
use gaggle_core::planner::Planner;
use gaggle_core::setup::{Family, MealPreferences, Member, TripSetup};
use gaggle_core::sharing::{self, SharingError, collaborators, flock, invites, share};
use gaggle_core::store::{PgTripStore, TripStore};
use gaggle_core::trip;
use gaggle_db::models::CollaboratorRole;
use gaggle_test_utils::TestDb;

const OWNER: &str = "owner@example.com";
const GUEST: &str = "guest@example.com";

struct CannedLlm {
    replies: Mutex<Vec<Result<CompletionResponse, LlmError>>>,
}

impl CannedLlm {
    fn new(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                texts
                    .iter()
                    .rev()
                    .map(|t| Ok(CompletionResponse::text(*t)))
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl LlmClient for CannedLlm {
    fn model(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("out of replies".into())))
    }
}

fn setup() -> TripSetup {
    TripSetup {
        location: "Portland, OR".into(),
        dates: DateRange::new(
            NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
            Some(NaiveDate::from_ymd_opt(2026, 10, 3).unwrap()),
        ),
        families: vec![Family {
            name: "Lee".into(),
            members: vec![Member::adult("Jo"), Member::kid("Sam", Some(3), Some("1-3 PM"))],
            dietary_restrictions: vec!["gluten-free".into()],
        }],
        nest: None,
        meals: MealPreferences::default(),
    }
}

fn itinerary() -> Vec<ItineraryItem> {
    vec![
        ItineraryItem::new("9:00 AM", "Zoo", Category::Activity).on_day(1),
        ItineraryItem::new("12:00 PM", "Lunch", Category::Meal).on_day(1),
        ItineraryItem::new("10:00 AM", "Science museum", Category::Activity).on_day(2),
    ]
}

#[tokio::test]
async fn create_load_and_toggle_round_trip() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();
    assert_eq!(created.itinerary.len(), 3);
    assert!(created.completed.is_empty());

    let store: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.pool.clone()));
    let mut tracker = created.into_tracker(Arc::clone(&store));
    let mut notices = Notices::new();
    tracker.toggle(1, &mut notices).await;
    assert!(notices.is_empty());

    let loaded = trip::load_trip(&db.pool, tracker.trip_id())
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.completed.contains(1));
    assert_eq!(loaded.dates.duration_days(), 2);
    assert_eq!(loaded.families[0].members[1].age, Some(3));

    let listed = trip::list_trips(&db.pool, OWNER).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(trip::list_trips(&db.pool, GUEST).await.unwrap().is_empty());

    db.finish().await;
}

#[tokio::test]
async fn toggles_from_two_sessions_both_stick() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();

    let store: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.pool.clone()));
    let mut first = created.clone().into_tracker(Arc::clone(&store));
    let mut second = created.into_tracker(Arc::clone(&store));
    let mut notices = Notices::new();

    assert!(first.toggle(0, &mut notices).await);
    assert!(second.toggle(2, &mut notices).await);
    assert!(notices.is_empty());
    // The later toggle picks up the earlier one from the store.
    assert!(second.completed().contains(0));
    assert!(!first.completed().contains(2));

    let loaded = trip::load_trip(&db.pool, first.trip_id())
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.completed.contains(0));
    assert!(loaded.completed.contains(2));
    assert_eq!(loaded.completed.len(), 2);

    // Unchecking from the stale session removes only its own item.
    assert!(!first.toggle(0, &mut notices).await);
    assert_eq!(first.completed().indices().collect::<Vec<_>>(), vec![2]);

    db.finish().await;
}

#[tokio::test]
async fn chat_turn_replaces_itinerary_and_records_history() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();
    let trip_id = created.id;
    let store: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.pool.clone()));
    let mut tracker = created.into_tracker(store);

    let llm = CannedLlm::new(&[
        "Lunch is gluten-free friendly.",
        r#"{"message":"Dropped the museum.","itinerary":[{"time":"9:00 AM","title":"Zoo","category":"activity","day":1}]}"#,
    ]);
    let planner = Planner::new(llm);
    let mut notices = Notices::new();

    let first = trip::chat_turn(&db.pool, &planner, &mut tracker, "Portland, OR", "is lunch ok?", &mut notices)
        .await
        .unwrap();
    assert!(!first.replaced);
    assert_eq!(tracker.itinerary().len(), 3);

    let second = trip::chat_turn(&db.pool, &planner, &mut tracker, "Portland, OR", "skip the museum", &mut notices)
        .await
        .unwrap();
    assert!(second.replaced);
    assert_eq!(second.reply.as_deref(), Some("Dropped the museum."));

    let loaded = trip::load_trip(&db.pool, trip_id).await.unwrap().unwrap();
    assert_eq!(loaded.itinerary.len(), 1);

    let history = gaggle_db::queries::chat::list_recent_messages(&db.pool, trip_id, 10)
        .await
        .unwrap();
    assert_eq!(history.len(), 4);

    let third = trip::chat_turn(&db.pool, &planner, &mut tracker, "Portland, OR", "more?", &mut notices)
        .await
        .unwrap();
    assert!(third.reply.is_none());
    assert_eq!(notices.len(), 1);

    db.finish().await;
}

#[tokio::test]
async fn chat_history_write_failure_keeps_replacement() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();
    let trip_id = created.id;
    let store: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.pool.clone()));
    let mut tracker = created.into_tracker(store);

    // Reads still work; every new history row is rejected.
    sqlx::query("ALTER TABLE chat_messages ADD CONSTRAINT reject_rows CHECK (false) NOT VALID")
        .execute(&db.pool)
        .await
        .unwrap();

    let planner = Planner::new(CannedLlm::new(&[
        r#"{"message":"Dropped the museum.","itinerary":[{"time":"9:00 AM","title":"Zoo","category":"activity","day":1}]}"#,
    ]));
    let mut notices = Notices::new();
    let outcome = trip::chat_turn(&db.pool, &planner, &mut tracker, "Portland, OR", "skip the museum", &mut notices)
        .await
        .unwrap();

    assert!(outcome.replaced);
    assert_eq!(outcome.reply.as_deref(), Some("Dropped the museum."));
    assert_eq!(tracker.itinerary().len(), 1);
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices.iter().next().unwrap().level,
        gaggle_core::notice::NoticeLevel::Warning
    );

    let loaded = trip::load_trip(&db.pool, trip_id).await.unwrap().unwrap();
    assert_eq!(loaded.itinerary.len(), 1);
    let history = gaggle_db::queries::chat::list_recent_messages(&db.pool, trip_id, 10)
        .await
        .unwrap();
    assert!(history.is_empty());

    db.finish().await;
}

#[tokio::test]
async fn share_codes_are_stable_and_respect_visibility() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();

    let err = share::share_trip(&db.pool, created.id, GUEST, true).await.unwrap_err();
    assert!(matches!(err, SharingError::NotOwner));

    let shared = share::share_trip(&db.pool, created.id, OWNER, true).await.unwrap();
    let code = shared.share_code.clone().unwrap();
    assert_eq!(code.len(), sharing::SHARE_CODE_LEN);

    let found = share::find_shared(&db.pool, &code.to_lowercase()).await.unwrap();
    assert_eq!(found.unwrap().id, created.id);

    let hidden = share::share_trip(&db.pool, created.id, OWNER, false).await.unwrap();
    assert_eq!(hidden.share_code.as_deref(), Some(code.as_str()));
    assert!(share::find_shared(&db.pool, &code).await.unwrap().is_none());

    db.finish().await;
}

#[tokio::test]
async fn invite_claim_rules() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();

    let link = invites::create_invite(
        &db.pool,
        created.id,
        OWNER,
        CollaboratorRole::Editor,
        "https://gaggle.example",
    )
    .await
    .unwrap();
    assert_eq!(
        link.url,
        format!("https://gaggle.example/invite/{}", link.invite.code)
    );

    let own = invites::claim_invite(&db.pool, &link.invite.code, OWNER).await;
    assert!(matches!(own, Err(SharingError::OwnInvite)));

    let collaborator = invites::claim_invite(&db.pool, &link.invite.code, GUEST)
        .await
        .unwrap();
    assert_eq!(collaborator.role, CollaboratorRole::Editor);

    let again = invites::claim_invite(&db.pool, &link.invite.code, "third@example.com").await;
    assert!(matches!(again, Err(SharingError::InviteClaimed)));

    let missing = invites::claim_invite(&db.pool, "nope", GUEST).await;
    assert!(matches!(missing, Err(SharingError::InviteNotFound)));

    let access = collaborators::require_edit(&db.pool, created.id, GUEST).await.unwrap();
    assert!(access.can_edit());
    assert_eq!(trip::list_trips(&db.pool, GUEST).await.unwrap().len(), 1);

    db.finish().await;
}

#[tokio::test]
async fn collaborators_by_email() {
    let db = TestDb::new().await;
    let created = trip::create_trip(&db.pool, OWNER, &setup(), &itinerary())
        .await
        .unwrap();

    let added = collaborators::add_collaborator(
        &db.pool,
        created.id,
        OWNER,
        " Viewer@Example.com ",
        CollaboratorRole::Viewer,
    )
    .await
    .unwrap();
    assert_eq!(added.email, "viewer@example.com");
    assert!(added.accepted_at.is_none());

    let view = collaborators::require_view(&db.pool, created.id, "viewer@example.com").await;
    assert!(view.is_ok());
    let edit = collaborators::require_edit(&db.pool, created.id, "viewer@example.com").await;
    assert!(matches!(edit, Err(SharingError::Forbidden)));

    let listed = collaborators::list_collaborators(&db.pool, created.id, OWNER)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let stranger = collaborators::list_collaborators(&db.pool, created.id, "x@example.com").await;
    assert!(matches!(stranger, Err(SharingError::Forbidden)));

    db.finish().await;
}

#[tokio::test]
async fn flock_requests() {
    let db = TestDb::new().await;

    let self_req = flock::request(&db.pool, OWNER, OWNER).await;
    assert!(matches!(self_req, Err(SharingError::SelfRequest)));

    let conn = flock::request(&db.pool, OWNER, GUEST).await.unwrap();
    let dup = flock::request(&db.pool, GUEST, OWNER).await;
    assert!(matches!(dup, Err(SharingError::DuplicateRequest)));

    let wrong = flock::respond(&db.pool, conn.id, OWNER, true).await;
    assert!(matches!(wrong, Err(SharingError::NotAddressee)));

    let accepted = flock::respond(&db.pool, conn.id, GUEST, true).await.unwrap();
    assert_eq!(accepted.peer_of(GUEST), OWNER);

    let twice = flock::respond(&db.pool, conn.id, GUEST, false).await;
    assert!(matches!(twice, Err(SharingError::AlreadyAnswered)));

    assert_eq!(flock::list(&db.pool, OWNER).await.unwrap().len(), 1);

    db.finish().await;
}
