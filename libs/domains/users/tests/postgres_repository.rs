//! PostgreSQL repository tests against a real database.
//!
//! Run with: `cargo test -p domain_users -- --ignored`

use domain_users::{PostgresUserRepository, UpdateUser, UserRepository};
use serde_json::{Map, json};
use test_utils::{TestDataBuilder, TestDatabase};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_lookup_by_id_and_update() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("test_lookup_by_id_and_update");
    let email = data.email("ada");
    let id = db.insert_user(&data.name("ada"), 36, &email).await;

    let repo = PostgresUserRepository::new(db.connection());

    let user = repo.get_by_id(id).await.unwrap().expect("seeded user");
    assert_eq!(user.email, email);
    assert_eq!(user.md, json!({}));

    let mut md = Map::new();
    md.insert("plan".to_string(), json!("pro"));
    let updated = repo
        .update(UpdateUser {
            id,
            name: "Ada L.".to_string(),
            age: 37,
            md,
            email: email.clone(),
        })
        .await
        .unwrap()
        .expect("row matches id and email");

    assert_eq!(updated.age, 37);
    assert_eq!(updated.md["plan"], "pro");
    assert!(updated.modify_date >= user.modify_date);
    assert_eq!(updated.created_date, user.created_date);

    assert!(repo.get_by_id(id + 10_000).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_reports_unique_violation_as_conflict() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("test_create_reports_unique_violation");
    let email = data.email("grace");
    db.insert_user("Grace", 45, &email).await;

    let repo = PostgresUserRepository::new(db.connection());
    let result = repo
        .create(domain_users::CreateUser {
            name: "Grace".to_string(),
            age: 45,
            md: Map::new(),
            email,
        })
        .await;

    assert!(matches!(result, Err(domain_users::UserError::Conflict(_))));
}
