#![allow(dead_code)]

use bson::{DateTime, oid::ObjectId};
use docrepo::{Entity, endpoint::Endpoint};
use serde::{Deserialize, Serialize};

/// A private in-memory endpoint, so tests never share data.
pub fn endpoint(name: &str) -> Endpoint {
    Endpoint::parse(&format!("memory://{name}")).unwrap()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    pub address2: String,
    pub post_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(entity_base)]
pub struct Customer {
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub home_address: Option<Address>,
    pub orders: Vec<Order>,
}

impl Customer {
    pub fn named(first_name: &str) -> Self {
        Self { first_name: first_name.to_string(), ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub purchase_date: DateTime,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(entity_base)]
pub struct Product {
    pub id: Option<ObjectId>,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "AnimalsTest", ancestors(Animal), entity_base)]
pub struct Dog {
    pub id: Option<ObjectId>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "Catlikes", ancestors(CatLike, Animal), entity_base)]
pub struct Lion {
    pub id: Option<ObjectId>,
    pub pride: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(tag = "_t")]
#[entity(collection = "AnimalsTest", entity_base)]
pub enum Animal {
    Dog(Dog),
    Lion(Lion),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(tag = "_t")]
#[entity(collection = "Catlikes", ancestors(Animal), entity_base)]
pub enum CatLike {
    Lion(Lion),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "Birds", entity_base)]
pub struct Bird {
    pub id: Option<ObjectId>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "Birds", ancestors(Bird), entity_base)]
pub struct Macaw {
    pub id: Option<ObjectId>,
    pub name: String,
    pub colour: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(tag = "_t")]
#[entity(collection = "Birds", entity_base)]
pub enum AnyBird {
    Bird(Bird),
    Macaw(Macaw),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(entity_base)]
pub struct Whale {
    pub id: Option<ObjectId>,
    pub length: f64,
}

/// Siblings without markers share their root ancestor's collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(ancestors(Livestock), entity_base)]
pub struct Sheep {
    pub id: Option<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(ancestors(Livestock), entity_base)]
pub struct Goat {
    pub id: Option<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
pub struct CustomIdEntity {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "MyTestCollection")]
pub struct CustomIdEntityCustomCollection {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
pub struct IntCustomer {
    pub id: i32,
    pub name: String,
}

/// Identity-only hierarchy: the type's own name wins over its ancestors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(ancestors(BaseA, BaseItem))]
pub struct SpecialA {
    #[entity(id)]
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(ancestors(ClassA), entity_base)]
pub struct ClassB {
    pub id: Option<ObjectId>,
    pub prop1: String,
    pub prop2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(ancestors(ClassA), entity_base)]
pub struct ClassC {
    pub id: Option<ObjectId>,
    pub prop1: String,
    pub prop3: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(tag = "_t")]
#[entity(entity_base)]
pub enum ClassA {
    ClassB(ClassB),
    ClassC(ClassC),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "")]
pub struct Unnamed {
    pub id: String,
}
