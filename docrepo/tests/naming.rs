mod common;

use common::*;
use docrepo::{
    endpoint::Endpoint, error::DocumentStoreError, resolver::CollectionNameResolver,
};

#[test]
fn resolves_collection_names_from_types() {
    let resolve = |name: docrepo::error::DocumentStoreResult<String>| name.unwrap();

    assert_eq!(resolve(CollectionNameResolver::resolve::<Customer>()), "Customer");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Animal>()), "AnimalsTest");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Dog>()), "AnimalsTest");
    assert_eq!(resolve(CollectionNameResolver::resolve::<CatLike>()), "Catlikes");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Lion>()), "Catlikes");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Bird>()), "Birds");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Macaw>()), "Birds");
    assert_eq!(resolve(CollectionNameResolver::resolve::<Whale>()), "Whale");
    assert_eq!(resolve(CollectionNameResolver::resolve::<CustomIdEntity>()), "CustomIdEntity");
    assert_eq!(
        resolve(CollectionNameResolver::resolve::<CustomIdEntityCustomCollection>()),
        "MyTestCollection"
    );
}

#[test]
fn siblings_share_their_root_ancestor() {
    assert_eq!(CollectionNameResolver::resolve::<Sheep>().unwrap(), "Livestock");
    assert_eq!(CollectionNameResolver::resolve::<Goat>().unwrap(), "Livestock");
    assert_eq!(CollectionNameResolver::resolve::<ClassB>().unwrap(), "ClassA");
    assert_eq!(CollectionNameResolver::resolve::<ClassC>().unwrap(), "ClassA");
}

#[test]
fn identity_only_types_keep_their_own_name() {
    assert_eq!(CollectionNameResolver::resolve::<SpecialA>().unwrap(), "SpecialA");
}

#[test]
fn empty_marker_is_a_configuration_error() {
    assert!(matches!(
        CollectionNameResolver::resolve::<Unnamed>(),
        Err(DocumentStoreError::Configuration(_))
    ));
}

#[tokio::test]
async fn empty_names_fail_before_connecting() {
    let unsupported = Endpoint::parse("redis://localhost").unwrap();

    let err = docrepo::repository_at::<Unnamed>(&unsupported).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::Configuration(_)));

    let err = docrepo::manager_named::<Customer>(&endpoint("naming-empty"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Configuration(_)));
}

#[tokio::test]
async fn unsupported_or_malformed_endpoints_fail_to_connect() {
    let err = docrepo::repository_at::<Customer>(&Endpoint::parse("redis://localhost").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Connection(_)));

    assert!(matches!(
        Endpoint::parse("not a connection string"),
        Err(DocumentStoreError::Connection(_))
    ));
}

#[tokio::test]
async fn memory_endpoints_with_the_same_name_share_data() {
    let first = docrepo::repository_at::<IntCustomer>(&endpoint("naming-shared")).await.unwrap();
    let second = docrepo::repository_at::<IntCustomer>(&endpoint("naming-shared")).await.unwrap();
    let other = docrepo::repository_at::<IntCustomer>(&endpoint("naming-other")).await.unwrap();

    first.add(IntCustomer { id: 1, name: "shared".into() }).await.unwrap();

    assert_eq!(second.count().await.unwrap(), 1);
    assert_eq!(other.count().await.unwrap(), 0);
}
