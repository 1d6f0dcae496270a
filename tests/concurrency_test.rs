//! Concurrency tests: per-user serialization of uploads and deletions,
//! quota under contention, and tenant isolation.

mod common;

use stratus::Caller;
use stratus_core::config::engine::EngineConfig;
use stratus_core::error::ErrorKind;

#[tokio::test]
async fn test_concurrent_uploads_to_one_file_respect_retention() {
    let t = common::TestEngine::new().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let coordinator = t.coordinator.clone();
        let caller = t.caller();
        handles.push(tokio::spawn(async move {
            let content = format!("copy {i}");
            coordinator
                .upload(
                    &caller,
                    common::plain_upload("shared.txt", content.as_bytes()),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let files = t.coordinator.list_files(&t.caller()).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].revisions.len(), 5);

    // Eight serialized uploads number one through eight; the cap keeps
    // the newest five and each number is handed out exactly once.
    let mut numbers: Vec<u32> = files[0]
        .revisions
        .iter()
        .map(|r| r.revision_number().unwrap())
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![4, 5, 6, 7, 8]);
    assert_eq!(t.objects.len(), 5);
}

#[tokio::test]
async fn test_concurrent_uploads_never_overspend_quota() {
    let config = EngineConfig {
        max_revisions: 5,
        quota_bytes: 25,
    };
    let t = common::TestEngine::with_config(config).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let coordinator = t.coordinator.clone();
        let caller = t.caller();
        handles.push(tokio::spawn(async move {
            coordinator
                .upload(
                    &caller,
                    common::plain_upload(&format!("f{i}.txt"), b"0123456789"),
                )
                .await
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => {
                assert_eq!(err.kind, ErrorKind::QuotaExceeded);
                rejected += 1;
            }
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(rejected, 8);

    let quota = t.coordinator.quota(&t.caller()).await.unwrap();
    assert_eq!(quota.used_bytes, 20);
    assert_eq!(t.objects.len(), 2);
}

#[tokio::test]
async fn test_interleaved_upload_and_delete_stay_consistent() {
    let t = common::TestEngine::new().await;

    for content in [b"v1".as_slice(), b"v2", b"v3"] {
        t.coordinator
            .upload(&t.caller(), common::plain_upload("shared.txt", content))
            .await
            .unwrap();
    }
    let files = t.coordinator.list_files(&t.caller()).await.unwrap();
    let file_id = files[0].file.id;

    let upload = {
        let coordinator = t.coordinator.clone();
        let caller = t.caller();
        tokio::spawn(async move {
            coordinator
                .upload(&caller, common::plain_upload("shared.txt", b"v4"))
                .await
        })
    };
    let delete = {
        let coordinator = t.coordinator.clone();
        let caller = t.caller();
        tokio::spawn(async move { coordinator.delete_file(&caller, file_id).await })
    };

    // The user lock serializes the two tasks; both succeed regardless
    // of which one wins the race.
    upload.await.unwrap().unwrap();
    delete.await.unwrap().unwrap();

    // Whichever order they ran in, metadata and blobs agree.
    let files = t.coordinator.list_files(&t.caller()).await.unwrap();
    let total_revisions: usize = files.iter().map(|f| f.revisions.len()).sum();
    assert_eq!(total_revisions, t.objects.len());
    assert!(total_revisions <= 1);
    if let Some(file) = files.first() {
        // Delete won: the later upload recreated the file from scratch.
        assert_eq!(file.revisions[0].object_key, "alice@shared.txt@1");
    }
}

#[tokio::test]
async fn test_users_are_isolated() {
    let config = EngineConfig {
        max_revisions: 5,
        quota_bytes: 15,
    };
    let t = common::TestEngine::with_config(config).await;
    t.create_user("bob", "bob@example.com").await;
    let bob = Caller::new("bob");

    t.coordinator
        .upload(&t.caller(), common::plain_upload("data.txt", b"0123456789"))
        .await
        .unwrap();
    // Bob's quota is his own; alice's ten bytes do not count against it.
    t.coordinator
        .upload(&bob, common::plain_upload("data.txt", b"0123456789"))
        .await
        .unwrap();

    assert!(t.objects.contains("alice@data.txt@1"));
    assert!(t.objects.contains("bob@data.txt@1"));

    let alice_files = t.coordinator.list_files(&t.caller()).await.unwrap();
    let bob_files = t.coordinator.list_files(&bob).await.unwrap();
    assert_eq!(alice_files.len(), 1);
    assert_eq!(bob_files.len(), 1);
    assert_ne!(alice_files[0].file.id, bob_files[0].file.id);
}
