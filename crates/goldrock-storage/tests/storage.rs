//! Storage tests.
//!
//! Key validation runs before any request, so those tests use an offline
//! client. The round trip against a real bucket needs credentials and
//! `GOLDROCK_TEST_BUCKET`.
//!
//! Run with: `cargo test -p goldrock-storage --test storage -- --ignored`

use goldrock_core::models::attempt::{AttemptRecord, AttemptResult};
use goldrock_storage::error::StorageError;
use goldrock_storage::{attempts, trees};
use goldrock_trainer::catalog::chest_pain;
use goldrock_trainer::{Engine, Step};

fn offline_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version_latest()
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

fn finished_attempt() -> AttemptResult {
    let tree = chest_pain::tree();
    let engine = Engine::default();
    let mut state = engine.start(tree).unwrap();
    engine.decide(&mut state, tree, 0).unwrap();
    match engine.decide(&mut state, tree, 0).unwrap() {
        Step::Completed(result) => result,
        Step::Advanced => panic!("expected completion"),
    }
}

#[tokio::test]
async fn unsafe_user_id_is_rejected_before_any_request() {
    let client = offline_client();
    let record = AttemptRecord::new("../admin", finished_attempt());
    let err = attempts::record_attempt(&client, "bucket", &record)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(_)));
}

#[tokio::test]
async fn unsafe_tree_id_is_rejected_before_any_request() {
    let client = offline_client();
    let err = trees::load_tree(&client, "bucket", "trees/../x").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(_)));
}

#[tokio::test]
async fn malformed_tree_is_not_saved() {
    let client = offline_client();
    let mut tree = chest_pain::tree().clone();
    tree.root_node_id = "missing".to_string();

    let err = trees::save_tree(&client, "bucket", &tree).await.unwrap_err();
    assert!(matches!(err, StorageError::MalformedTree(_)));
}

#[tokio::test]
#[ignore]
async fn round_trip_against_bucket() {
    let bucket = std::env::var("GOLDROCK_TEST_BUCKET").expect("set GOLDROCK_TEST_BUCKET");
    let client = goldrock_storage::client::build_client().await;
    let user = format!("test-{}", uuid::Uuid::new_v4());

    trees::save_tree(&client, &bucket, chest_pain::tree()).await.unwrap();
    let loaded = trees::load_tree(&client, &bucket, chest_pain::ID).await.unwrap();
    assert_eq!(&loaded, chest_pain::tree());
    assert!(
        trees::list_tree_ids(&client, &bucket)
            .await
            .unwrap()
            .contains(&chest_pain::ID.to_string())
    );

    // Submitting the same record twice stores it once
    let first = AttemptRecord::new(&user, finished_attempt());
    attempts::record_attempt(&client, &bucket, &first).await.unwrap();
    let again = attempts::record_attempt(&client, &bucket, &first).await.unwrap();
    assert_eq!(again.id, first.id);

    let progress = attempts::load_progress(&client, &bucket, &user, chest_pain::ID)
        .await
        .unwrap();
    assert_eq!(progress.attempt_count, 1);

    let second = AttemptRecord::new(&user, finished_attempt());
    attempts::record_attempt(&client, &bucket, &second).await.unwrap();

    let progress = attempts::load_progress(&client, &bucket, &user, chest_pain::ID)
        .await
        .unwrap();
    assert_eq!(progress.attempt_count, 2);
    assert_eq!(progress.best_score, Some(first.result.score));

    let history = attempts::list_attempts(&client, &bucket, &user, chest_pain::ID)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}
