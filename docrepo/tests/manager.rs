mod common;

use common::*;
use docrepo::error::DocumentStoreError;

#[tokio::test]
async fn stats_require_an_existing_collection() {
    let endpoint = endpoint("manager-stats");
    let manager = docrepo::manager_at::<Customer>(&endpoint).await.unwrap();
    let customers = docrepo::repository_at::<Customer>(&endpoint).await.unwrap();

    assert_eq!(manager.name(), "Customer");
    assert!(matches!(
        manager.stats().await,
        Err(DocumentStoreError::CollectionNotFound(_))
    ));

    customers
        .add_many(vec![Customer::named("A"), Customer::named("B")])
        .await
        .unwrap();

    let stats = manager.stats().await.unwrap();
    assert_eq!(stats.document_count, 2);
    assert!(manager.total_data_size().await.unwrap() > 0);
    assert!(manager.total_storage_size().await.unwrap() >= manager.total_data_size().await.unwrap());
}

#[tokio::test]
async fn drop_is_idempotent() {
    let endpoint = endpoint("manager-drop");
    let manager = docrepo::manager_at::<IntCustomer>(&endpoint).await.unwrap();
    let customers = docrepo::repository_at::<IntCustomer>(&endpoint).await.unwrap();

    manager.drop().await.unwrap();

    customers.add(IntCustomer { id: 1, name: "x".into() }).await.unwrap();
    assert!(manager.exists().await.unwrap());

    manager.drop().await.unwrap();
    manager.drop().await.unwrap();
    assert!(!manager.exists().await.unwrap());
}

#[tokio::test]
async fn unique_indexes_reject_duplicates() {
    let endpoint = endpoint("manager-indexes");
    let manager = docrepo::manager_at::<Customer>(&endpoint).await.unwrap();
    let customers = docrepo::repository_at::<Customer>(&endpoint).await.unwrap();

    assert!(!manager.index_exists("email").await.unwrap());

    manager.ensure_index("email", true).await.unwrap();
    manager.ensure_index("email", true).await.unwrap();
    assert!(manager.index_exists("email").await.unwrap());

    let indexes = manager.list_indexes().await.unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].field, "email");
    assert!(indexes[0].unique);

    let with_email = |name: &str| Customer {
        email: "shared@example.com".into(),
        ..Customer::named(name)
    };
    customers.add(with_email("First")).await.unwrap();
    let err = customers.add(with_email("Second")).await.unwrap_err();
    assert!(err.is_duplicate_key());

    manager.drop_index("email").await.unwrap();
    manager.drop_index("email").await.unwrap();
    assert!(!manager.index_exists("email").await.unwrap());

    customers.add(with_email("Third")).await.unwrap();
    assert_eq!(customers.count().await.unwrap(), 2);
}

#[tokio::test]
async fn managers_follow_repository_naming() {
    let endpoint = endpoint("manager-naming");

    let lions = docrepo::manager_at::<Lion>(&endpoint).await.unwrap();
    assert_eq!(lions.name(), "Catlikes");

    let custom = docrepo::manager_named::<Customer>(&endpoint, "TestCustomers123")
        .await
        .unwrap();
    assert_eq!(custom.name(), "TestCustomers123");

    let err = docrepo::manager_at::<Unnamed>(&endpoint).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::Configuration(_)));
}
