mod common;

use bson::oid::ObjectId;
use common::*;
use docrepo::{entity::Entity as _, provider::StoreProvider, query::Filter};

fn class_b() -> ClassB {
    ClassB { id: None, prop1: "A".into(), prop2: "B".into() }
}

fn class_c() -> ClassC {
    ClassC { id: None, prop1: "A".into(), prop3: "C".into() }
}

#[tokio::test]
async fn subtypes_share_a_collection_and_are_told_apart() {
    let endpoint = endpoint("poly-classes");
    let classes = docrepo::repository_at::<ClassA>(&endpoint).await.unwrap();

    classes.add(ClassA::ClassB(class_b())).await.unwrap();
    classes.add(ClassA::ClassC(class_c())).await.unwrap();

    assert_eq!(classes.count().await.unwrap(), 2);
    assert_eq!(classes.of_type::<ClassA>().count().await.unwrap(), 2);
    assert_eq!(classes.of_type::<ClassB>().count().await.unwrap(), 1);
    assert_eq!(classes.of_type::<ClassC>().count().await.unwrap(), 1);

    let only_b = classes.of_type::<ClassB>().to_vec().await.unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0].prop2, "B");

    let all = classes.all().to_vec().await.unwrap();
    assert!(all.iter().any(|item| matches!(item, ClassA::ClassB(_))));
    assert!(all.iter().any(|item| matches!(item, ClassA::ClassC(_))));
}

#[tokio::test]
async fn subtype_repositories_only_see_their_own_documents() {
    let endpoint = endpoint("poly-subtype-repos");
    let b_repo = docrepo::repository_at::<ClassB>(&endpoint).await.unwrap();
    let c_repo = docrepo::repository_at::<ClassC>(&endpoint).await.unwrap();

    assert_eq!(b_repo.collection_name(), c_repo.collection_name());

    let b = b_repo.add(class_b()).await.unwrap();
    let c = c_repo.add(class_c()).await.unwrap();

    assert_eq!(b_repo.count().await.unwrap(), 2);
    assert_eq!(b_repo.all().count().await.unwrap(), 1);
    assert!(b_repo.get_by_id(&b.id).await.unwrap().is_some());
    assert_eq!(b_repo.get_by_id(&c.id).await.unwrap(), None);

    let shared = b_repo.filter(Filter::eq("prop1", "A")).to_vec().await.unwrap();
    assert_eq!(shared, [b]);
}

#[tokio::test]
async fn animals_resolve_to_their_variants() {
    let endpoint = endpoint("poly-animals");
    let animals = docrepo::repository_at::<Animal>(&endpoint).await.unwrap();
    let dogs = docrepo::repository_at::<Dog>(&endpoint).await.unwrap();
    let catlikes = docrepo::repository_at::<CatLike>(&endpoint).await.unwrap();

    assert_eq!(animals.collection_name(), "AnimalsTest");
    assert_eq!(catlikes.collection_name(), "Catlikes");

    let dog = dogs.add(Dog { id: None, name: "Rex".into() }).await.unwrap();
    let lion = animals
        .add(Animal::Lion(Lion { id: None, pride: "Serengeti".into() }))
        .await
        .unwrap();

    match animals.get_by_id(&dog.id).await.unwrap() {
        Some(Animal::Dog(found)) => assert_eq!(found, dog),
        other => panic!("expected a dog, got {other:?}"),
    }
    match animals.get_by_id(lion.id()).await.unwrap() {
        Some(Animal::Lion(found)) => assert_eq!(found.pride, "Serengeti"),
        other => panic!("expected a lion, got {other:?}"),
    }

    // Lions added through the animal repository live with the animals.
    assert_eq!(catlikes.count().await.unwrap(), 0);

    catlikes
        .add(CatLike::Lion(Lion { id: None, pride: "Masai Mara".into() }))
        .await
        .unwrap();
    assert_eq!(catlikes.of_type::<Lion>().count().await.unwrap(), 1);
}

#[tokio::test]
async fn base_and_derived_types_share_a_marker() {
    let endpoint = endpoint("poly-birds");
    let birds = docrepo::repository_at::<AnyBird>(&endpoint).await.unwrap();
    let macaws = docrepo::repository_at::<Macaw>(&endpoint).await.unwrap();

    let macaw = macaws
        .add(Macaw { id: None, name: "Blu".into(), colour: "blue".into() })
        .await
        .unwrap();
    birds
        .add(AnyBird::Bird(Bird { id: None, name: "Generic".into() }))
        .await
        .unwrap();

    match birds.get_by_id(&macaw.id).await.unwrap() {
        Some(AnyBird::Macaw(found)) => assert_eq!(found.colour, "blue"),
        other => panic!("expected a macaw, got {other:?}"),
    }
    assert_eq!(birds.count().await.unwrap(), 2);
    assert_eq!(macaws.all().count().await.unwrap(), 1);
}

#[tokio::test]
async fn documents_without_a_discriminator_match_every_type() {
    let endpoint = endpoint("poly-untagged");
    let store = docrepo::DefaultProvider.open(&endpoint).await.unwrap();
    let whales = docrepo::repository_at::<Whale>(&endpoint).await.unwrap();

    let id = ObjectId::new();
    store
        .collection("Whale")
        .unwrap()
        .insert(vec![(
            bson::Bson::ObjectId(id),
            bson::bson!({ "id": id, "length": 25.5 }),
        )])
        .await
        .unwrap();

    let found = whales.get_by_id(&Some(id)).await.unwrap().unwrap();
    assert_eq!(found.length, 25.5);
    assert_eq!(whales.all().count().await.unwrap(), 1);
    assert_eq!(whales.of_type::<Whale>().count().await.unwrap(), 0);
}

#[tokio::test]
async fn subtypes_partition_the_collection_despite_untagged_documents() {
    let endpoint = endpoint("poly-partition");
    let store = docrepo::DefaultProvider.open(&endpoint).await.unwrap();
    let classes = docrepo::repository_at::<ClassA>(&endpoint).await.unwrap();

    classes.add(ClassA::ClassB(class_b())).await.unwrap();
    classes.add(ClassA::ClassC(class_c())).await.unwrap();

    let id = ObjectId::new();
    store
        .collection(classes.collection_name())
        .unwrap()
        .insert(vec![(
            bson::Bson::ObjectId(id),
            bson::bson!({ "id": id, "prop1": "untagged" }),
        )])
        .await
        .unwrap();

    let b = classes.of_type::<ClassB>().count().await.unwrap();
    let c = classes.of_type::<ClassC>().count().await.unwrap();

    assert_eq!((b, c), (1, 1));
    assert_eq!(classes.of_type::<ClassB>().to_vec().await.unwrap().len(), 1);
    let filtered_c = classes
        .all()
        .filter(Filter::eq("prop1", "A"))
        .of_type::<ClassC>();
    assert_eq!(filtered_c.count().await.unwrap(), 1);

    // The untagged document is still part of the collection.
    assert_eq!(classes.count().await.unwrap(), 3);
    assert_eq!(classes.of_type::<ClassA>().count().await.unwrap(), b + c);
}
