use chrono::Duration;
use spell_core::model::{AttemptRecord, ResultDetails, TestResult, WordListDraft};
use spell_core::time::fixed_now;
use storage::repository::{StorageError, TestResultRepository, WordListRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(name: &str, words: &str) -> WordListDraft {
    WordListDraft::parse(name, words).unwrap()
}

#[tokio::test]
async fn sqlite_lists_roundtrip_and_filter_active() {
    let repo = connect("memdb_lists").await;
    let now = fixed_now();

    let older = repo
        .insert_new_list(&draft("Week 1", "cat, dog"), now - Duration::days(2))
        .await
        .unwrap();
    let newer = repo
        .insert_new_list(&draft("Week 2", "ship, shop, chip"), now)
        .await
        .unwrap();
    let removed = repo
        .insert_new_list(&draft("Old", "a"), now)
        .await
        .unwrap();

    let fetched = repo.get_list(newer).await.unwrap().expect("list exists");
    assert_eq!(fetched.name(), "Week 2");
    assert_eq!(fetched.words().len(), 3);
    assert!(!fetched.is_active());

    repo.set_active(older, true).await.unwrap();
    repo.set_active(newer, true).await.unwrap();
    repo.set_active(removed, true).await.unwrap();
    repo.soft_delete(removed, now).await.unwrap();

    let active: Vec<_> = repo
        .get_active_lists()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id())
        .collect();
    assert_eq!(active, vec![newer, older]);

    let all = repo.list_lists().await.unwrap();
    assert_eq!(all.len(), 2);

    let err = repo.update_list(removed, &draft("x", "y")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_update_resets_mastery() {
    let repo = connect("memdb_update").await;
    let id = repo
        .insert_new_list(&draft("Week 3", "rain"), fixed_now())
        .await
        .unwrap();

    sqlx::query(r#"UPDATE word_lists SET words = '[{"text":"rain","mastered":true}]' WHERE id = ?1"#)
        .bind(i64::try_from(id.value()).unwrap())
        .execute(repo.pool())
        .await
        .unwrap();
    assert!(repo.get_list(id).await.unwrap().unwrap().words()[0].mastered);

    let updated = repo
        .update_list(id, &draft("Week 3", "rain, train"))
        .await
        .unwrap();
    assert_eq!(updated.words().len(), 2);
    assert!(updated.words().iter().all(|w| !w.mastered));
}

#[tokio::test]
async fn sqlite_results_link_every_source_list() {
    let repo = connect("memdb_results").await;
    let now = fixed_now();
    let a = repo.insert_new_list(&draft("A", "cat"), now).await.unwrap();
    let b = repo.insert_new_list(&draft("B", "dog"), now).await.unwrap();

    let details = ResultDetails::Detailed(vec![
        AttemptRecord {
            word: "cat".into(),
            user_answer: "cat".into(),
            correct: true,
        },
        AttemptRecord {
            word: "dog".into(),
            user_answer: "dgo".into(),
            correct: false,
        },
    ]);
    let first = TestResult::new([a, b], 1, 2, details, now).unwrap();
    let first_id = repo.append_result(&first).await.unwrap();

    let second = TestResult::new(
        [a],
        1,
        1,
        ResultDetails::minimal(),
        now + Duration::minutes(5),
    )
    .unwrap();
    let second_id = repo.append_result(&second).await.unwrap();

    assert_eq!(repo.get_result(first_id).await.unwrap(), first);

    let for_a = repo.list_results_for_list(a, 10).await.unwrap();
    assert_eq!(
        for_a.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second_id, first_id]
    );
    let for_b = repo.list_results_for_list(b, 10).await.unwrap();
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].result.list_ids(), &[a, b]);

    let limited = repo.list_results_for_list(a, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}
