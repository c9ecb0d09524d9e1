// SPDX-License-Identifier: MIT

use relmap::{Entity, SchemaExport};

#[derive(Entity)]
#[entity(table = "owner")]
pub struct Owner {
    #[key]
    #[serial]
    pub id: i32,

    #[not_null]
    pub name: String,
}

#[derive(Entity)]
#[entity(table = "pet")]
pub struct Pet {
    #[key]
    #[serial]
    pub id: i32,

    pub name: String,

    #[not_null]
    #[references(Owner)]
    pub owner_id: i32,
}

fn main() {
    let script = SchemaExport::new()
        .entity::<Pet>()
        .entity::<Owner>()
        .export()
        .unwrap();

    assert!(script.contains("    owner_id INTEGER NOT NULL REFERENCES owner"));
    assert!(script.find("CREATE TABLE owner").unwrap() < script.find("CREATE TABLE pet").unwrap());
    assert!(
        script.find("DROP TABLE IF EXISTS pet;").unwrap()
            < script.find("DROP TABLE IF EXISTS owner;").unwrap()
    );
}
