// SPDX-License-Identifier: MIT

use chrono::NaiveDateTime;
use relmap::{Entity, FieldKind, Operation, build, describe};

#[derive(Entity)]
#[entity(table = "article")]
pub struct Article {
    #[key]
    #[serial]
    pub id: i32,

    #[not_null]
    pub title: String,

    #[unique]
    pub slug: String,

    pub published: bool,

    pub views: i64,

    pub created_at: NaiveDateTime,
}

fn main() {
    let meta = describe::<Article>();
    assert_eq!(meta.entity, "Article");
    assert_eq!(meta.table, "article");

    let names: Vec<_> = meta.fields.iter().map(|f| f.name).collect();
    assert_eq!(names, ["id", "title", "slug", "published", "views", "created_at"]);

    let id = meta.key_field().unwrap();
    assert!(id.is_serial);
    assert_eq!(id.kind, FieldKind::Integer);
    assert!(meta.field("title").unwrap().not_null);
    assert!(meta.field("slug").unwrap().is_unique);
    assert_eq!(meta.field("views").unwrap().kind, FieldKind::BigInt);
    assert_eq!(meta.field("created_at").unwrap().kind, FieldKind::Timestamp);

    let template = build(&meta, Operation::Create).unwrap();
    assert_eq!(
        template.sql,
        "INSERT INTO article (title, slug, published, views, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING *"
    );
}
