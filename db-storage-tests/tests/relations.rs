#![allow(clippy::unwrap_used)]

use db_storage::{Filters, Related};
use db_storage_tests::{
    mail::{Folder, Letter, Person},
    storage,
};

async fn seed_letters(storage: &db_storage::DbStorage) {
    let mut letters = vec![
        Letter::new("hello", Person::new("Ann"), Person::new("Ben")),
        Letter::new("reply", Person::new("Ben"), Person::new("Cid")),
    ];
    storage.store(&mut letters, true).await.unwrap();
}

#[tokio::test]
async fn filter_applies_to_the_named_relation() {
    let storage = storage().await.unwrap();
    seed_letters(&storage).await;

    let to_ben = storage
        .pickup::<Letter>(&Filters::new().with("receiver", Filters::new().with("name", "Ben")))
        .await
        .unwrap();

    assert_eq!(to_ben.len(), 1);
    assert_eq!(to_ben[0].subject, "hello");
    assert_eq!(to_ben[0].sender.get().map(|e| e.name.as_str()), Some("Ann"));
    assert_eq!(to_ben[0].receiver.get().map(|e| e.name.as_str()), Some("Ben"));

    let to_ann = storage
        .pickup::<Letter>(&Filters::new().with("receiver", Filters::new().with("name", "Ann")))
        .await
        .unwrap();

    assert!(to_ann.is_empty());
}

#[tokio::test]
async fn filters_on_both_relations_must_all_hold() {
    let storage = storage().await.unwrap();
    seed_letters(&storage).await;

    let both = |sender: &str, receiver: &str| {
        Filters::new()
            .with("sender", Filters::new().with("name", sender))
            .with("receiver", Filters::new().with("name", receiver))
    };

    let found = storage.pickup::<Letter>(&both("Ann", "Ben")).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].subject, "hello");

    assert!(storage.pickup::<Letter>(&both("Ann", "Cid")).await.unwrap().is_empty());
}

#[tokio::test]
async fn self_reference_filters_the_parent_row() {
    let storage = storage().await.unwrap();

    let mut folders = vec![
        Folder::within("a", Folder::new("x")),
        Folder::new("a"),
        Folder::within("b", Folder::new("y")),
    ];
    storage.store(&mut folders, true).await.unwrap();

    let found = storage
        .pickup::<Folder>(
            &Filters::new()
                .with("name", "a")
                .with("parent", Filters::new().with("name", "x")),
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, folders[0].id);

    let parent = found[0].parent.get().unwrap();

    assert_eq!(parent.name, "x");
    assert_eq!(parent.parent, Related::Null);
}

#[tokio::test]
async fn row_that_is_its_own_parent_is_left_to_a_proxy() {
    let storage = storage().await.unwrap();

    let mut folders = vec![Folder::new("loop")];
    storage.store(&mut folders, false).await.unwrap();

    folders[0].parent = Related::new(folders[0].clone());
    storage.update(&mut folders, false).await.unwrap();

    let mut found = storage
        .pickup::<Folder>(&Filters::new().with("parent", Filters::new().with("name", "loop")))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].parent.key(), folders[0].id);

    let parent = found[0].parent.fetch(&storage).await.unwrap().unwrap();

    assert_eq!(parent.name, "loop");
}
