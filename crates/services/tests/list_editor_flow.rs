use std::sync::Arc;

use services::{Clock, ListService};
use spell_core::time::fixed_now;
use storage::repository::Storage;

#[tokio::test]
async fn list_editor_flow_create_edit_activate_delete() {
    let storage = Storage::sqlite("sqlite:file:memdb_list_editor_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let service = ListService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.lists),
        Arc::clone(&storage.results),
    );

    let id = service
        .create_list("Week 1", "cat, dog")
        .await
        .expect("create list");
    assert!(service.get_active_lists().await.unwrap().is_empty());

    let edited = service
        .update_list(id, "Week 1 (revised)", "cat, dog, hen")
        .await
        .expect("update list");
    assert_eq!(edited.name(), "Week 1 (revised)");
    assert_eq!(edited.words().len(), 3);
    assert!(edited.words().iter().all(|w| !w.mastered));

    service.set_active(id, true).await.expect("activate");
    let active = service.get_active_lists().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), id);

    service.delete_list(id).await.expect("delete");
    assert!(service.list_lists().await.unwrap().is_empty());
    assert!(service.get_active_lists().await.unwrap().is_empty());
}
