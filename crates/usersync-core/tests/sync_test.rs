//! Integration tests for applying lifecycle events to the user store.
//!
//! Drives `apply_event` with decoded payloads against the in-memory store
//! and checks the record-level guarantees: idempotent creates, full
//! replacement on update and total deletes.

use usersync_core::{
    apply_event, storage::memory::InMemoryUserStore, SyncOutcome, UserEvent, UserId, UserRecord,
    UserStore,
};

const CREATED_U1: &[u8] = br#"{"type":"user.created","data":{"id":"u1","email_addresses":[{"email_address":"a@x.com"}],"first_name":"A","last_name":"B","image_url":"http://img"}}"#;
const DELETED_U1: &[u8] = br#"{"type":"user.deleted","data":{"id":"u1"}}"#;

fn expected_u1() -> UserRecord {
    UserRecord {
        id: UserId::from("u1"),
        email: Some("a@x.com".to_string()),
        name: "A B".to_string(),
        image: Some("http://img".to_string()),
    }
}

async fn apply(store: &InMemoryUserStore, body: &[u8]) -> SyncOutcome {
    let event = UserEvent::from_slice(body).expect("decode event");
    apply_event(store, event).await.expect("apply event")
}

#[tokio::test]
async fn created_event_stores_derived_fields() {
    let store = InMemoryUserStore::new();

    let outcome = apply(&store, CREATED_U1).await;

    assert_eq!(outcome, SyncOutcome::Created { id: UserId::from("u1") });
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(&UserId::from("u1")).await, Some(expected_u1()));
}

#[tokio::test]
async fn redelivered_create_keeps_single_identical_record() {
    let store = InMemoryUserStore::new();

    apply(&store, CREATED_U1).await;
    apply(&store, CREATED_U1).await;

    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(&UserId::from("u1")).await, Some(expected_u1()));
}

#[tokio::test]
async fn update_replaces_every_field() {
    let store = InMemoryUserStore::new();
    apply(&store, CREATED_U1).await;

    let update = br#"{"type":"user.updated","data":{"id":"u1","email_addresses":[],"first_name":"Ann"}}"#;
    apply(&store, update).await;

    let stored = store.get(&UserId::from("u1")).await.expect("record present");
    assert_eq!(
        stored,
        UserRecord { id: UserId::from("u1"), email: None, name: "Ann".to_string(), image: None }
    );
}

#[tokio::test]
async fn update_for_unknown_user_creates_it() {
    let store = InMemoryUserStore::new();

    let update = br#"{"type":"user.updated","data":{"id":"late","first_name":"Late","last_name":"Arrival"}}"#;
    let outcome = apply(&store, update).await;

    assert_eq!(outcome, SyncOutcome::Updated { id: UserId::from("late") });
    let stored = store.find_by_id(UserId::from("late")).await.unwrap().expect("created");
    assert_eq!(stored.name, "Late Arrival");
}

#[tokio::test]
async fn delete_removes_and_redelivery_is_harmless() {
    let store = InMemoryUserStore::new();
    apply(&store, CREATED_U1).await;

    let first = apply(&store, DELETED_U1).await;
    let second = apply(&store, DELETED_U1).await;

    assert_eq!(first, SyncOutcome::Deleted { id: UserId::from("u1"), existed: true });
    assert_eq!(second, SyncOutcome::Deleted { id: UserId::from("u1"), existed: false });
    assert!(store.get(&UserId::from("u1")).await.is_none());
}

#[tokio::test]
async fn each_known_event_is_one_mutation() {
    let store = InMemoryUserStore::new();

    apply(&store, CREATED_U1).await;
    apply(&store, br#"{"type":"user.updated","data":{"id":"u1"}}"#).await;
    apply(&store, DELETED_U1).await;
    apply(&store, br#"{"type":"session.ended","data":{"id":"sess_1"}}"#).await;

    assert_eq!(store.mutation_count(), 3);
}
