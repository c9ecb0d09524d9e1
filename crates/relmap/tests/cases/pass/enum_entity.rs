// SPDX-License-Identifier: MIT

use relmap::{DbEnum, Entity, Operation, build, describe};

#[derive(DbEnum, Debug, PartialEq)]
#[db_enum(name = "mood_type")]
pub enum Mood {
    Happy,
    Grumpy,
}

#[derive(Entity)]
#[entity(table = "person")]
pub struct Person {
    #[key]
    #[serial]
    pub id: i32,

    #[not_null]
    pub name: String,

    pub mood: Mood,
}

fn main() {
    let meta = Mood::enum_meta();
    assert_eq!(meta.type_name, "mood_type");
    assert_eq!(meta.symbols, ["Happy", "Grumpy"]);
    assert_eq!(Mood::Grumpy.symbol(), "Grumpy");
    assert_eq!(Mood::from_symbol("Happy").unwrap(), Mood::Happy);
    assert!(Mood::from_symbol("Sad").is_err());

    let template = build(&describe::<Person>(), Operation::Update).unwrap();
    assert_eq!(
        template.sql,
        "UPDATE person SET name=?, mood=?::mood_type WHERE id=?"
    );
}
