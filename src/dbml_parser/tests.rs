use super::parser::{dedent, unescape};
use super::*;
use crate::error::TabledefError;
use crate::types::RefType;

const BLOG_DBML: &str = r#"
Project blog {
  database_type: 'PostgreSQL'
  Note: 'Blogging platform'
}

// Authors of posts
Table users as U {
  id integer [pk, increment]
  username varchar(255) [not null, unique, note: 'login name']
  created_at timestamp [default: `now()`]
  Note: 'Registered users'
}

Table posts {
  id integer [primary key]
  title varchar
  body text [note: 'Content of the post']
  user_id integer [ref: > U.id, not null]
  status post_status
}

/* standalone relationship */
Ref fk_posts_users: posts.user_id > users.id

Enum post_status {
  draft
  published [note: 'visible to everyone']
  "in review"
}

TableGroup content {
  posts
  users
}
"#;

fn parse(input: &str) -> DbmlDocument {
    DbmlParser::new()
        .parse_document(input)
        .expect("DBML should parse")
}

#[test]
fn test_parse_tables_and_columns() {
    let document = parse(BLOG_DBML);

    assert_eq!(document.tables.len(), 2);
    let users = &document.tables[0];
    assert_eq!(users.name, "users");
    assert_eq!(users.alias.as_deref(), Some("U"));
    assert_eq!(users.note.as_deref(), Some("Registered users"));
    assert_eq!(users.columns.len(), 3);

    let id = users.column("id").unwrap();
    assert_eq!(id.column_type, "integer");
    assert!(id.pk);
    assert!(id.increment);

    let username = users.column("username").unwrap();
    assert_eq!(username.column_type, "varchar(255)");
    assert!(username.not_null);
    assert!(username.unique);
    assert!(!username.pk);
    assert_eq!(username.note.as_deref(), Some("login name"));

    let created_at = users.column("created_at").unwrap();
    assert_eq!(created_at.default.as_deref(), Some("`now()`"));

    let posts = &document.tables[1];
    assert!(posts.column("id").unwrap().pk);
    assert_eq!(posts.column("status").unwrap().column_type, "post_status");
    assert_eq!(posts.note, None);
}

#[test]
fn test_parse_inline_and_standalone_refs() {
    let document = parse(BLOG_DBML);

    assert_eq!(document.refs.len(), 2);
    for reference in &document.refs {
        assert_eq!(reference.ref_type, RefType::ManyToOne);
        assert_eq!(
            reference.left,
            vec![ColumnPointer { table: "posts".into(), column: "user_id".into() }]
        );
        assert_eq!(
            reference.right,
            vec![ColumnPointer { table: "users".into(), column: "id".into() }]
        );
    }
    assert_eq!(document.refs[0].name, None);
    assert_eq!(document.refs[1].name.as_deref(), Some("fk_posts_users"));
}

#[test]
fn test_parse_project_enum_and_group() {
    let document = parse(BLOG_DBML);

    let project = document.project.expect("project block");
    assert_eq!(project.name.as_deref(), Some("blog"));
    assert_eq!(project.note.as_deref(), Some("Blogging platform"));
    assert_eq!(project.settings.get("database_type").map(String::as_str), Some("PostgreSQL"));

    assert_eq!(document.enums.len(), 1);
    assert_eq!(document.enums[0].name, "post_status");
    assert_eq!(document.enums[0].values, vec!["draft", "published", "in review"]);

    assert_eq!(document.table_groups.len(), 1);
    assert_eq!(document.table_groups[0].tables, vec!["posts", "users"]);
}

#[test]
fn test_parse_single_line_table() {
    let document = parse(
        "Table users { id int [pk] name varchar } Table posts { id int user_id int [ref: > users.id] }",
    );

    assert_eq!(document.tables.len(), 2);
    assert_eq!(document.tables[0].columns.len(), 2);
    assert_eq!(document.tables[0].columns[1].name, "name");
    assert_eq!(document.tables[1].columns.len(), 2);
    assert_eq!(document.refs.len(), 1);
}

#[test]
fn test_parse_all_relationship_symbols() {
    let document = parse(
        r#"
        Table a { id int x int y int z int w int }
        Table b { id int }
        Ref: a.x > b.id
        Ref: a.y < b.id
        Ref: a.z - b.id
        Ref: a.w <> b.id
        "#,
    );

    let symbols: Vec<&str> = document.refs.iter().map(|r| r.ref_type.symbol()).collect();
    assert_eq!(symbols, vec![">", "<", "-", "<>"]);
}

#[test]
fn test_parse_ref_block_with_settings() {
    let document = parse(
        r#"
        Table orders { id int customer_id int }
        Table customers { id int }
        Ref orders_customers {
          orders.customer_id > customers.id [delete: cascade, update: no action]
        }
        "#,
    );

    assert_eq!(document.refs.len(), 1);
    assert_eq!(document.refs[0].name.as_deref(), Some("orders_customers"));
}

#[test]
fn test_parse_composite_ref() {
    let document = parse(
        r#"
        Table merchant_periods { merchant_id int country_code varchar }
        Table merchants { id int country_code varchar }
        Ref: merchant_periods.(merchant_id, country_code) > merchants.(id, country_code)
        "#,
    );

    let reference = &document.refs[0];
    assert_eq!(reference.left.len(), 2);
    assert_eq!(reference.right[0].column, "id");
    assert_eq!(reference.right[1].column, "country_code");
}

#[test]
fn test_parse_schema_qualified_names() {
    let document = parse(
        r#"
        Table core.accounts { id int }
        Table billing.invoices { account_id int [ref: > core.accounts.id] }
        "#,
    );

    assert_eq!(document.tables[0].schema.as_deref(), Some("core"));
    assert_eq!(document.tables[0].name, "accounts");
    assert_eq!(document.refs[0].right[0].table, "accounts");
}

#[test]
fn test_parse_quoted_names_and_types() {
    let document = parse(
        r#"
        Table "Order Items" {
          "Item ID" int [pk]
          price decimal(10, 2)
          tags varchar[]
          shipped_at "timestamp with time zone"
        }
        "#,
    );

    let table = &document.tables[0];
    assert_eq!(table.name, "Order Items");
    assert_eq!(table.columns[0].name, "Item ID");
    assert_eq!(table.columns[1].column_type, "decimal(10, 2)");
    assert_eq!(table.columns[2].column_type, "varchar[]");
    assert_eq!(table.columns[3].column_type, "timestamp with time zone");
}

#[test]
fn test_parse_notes_and_indexes() {
    let document = parse(
        r#"
        Table events [headercolor: #3498DB, note: 'settings note'] {
          id int
          kind varchar [note: 'it\'s the kind']
          indexes {
            (id, kind) [unique]
            kind [name: 'kind_idx']
            `lower(kind)`
          }
          Note {
            '''
              Multi-line
              table note
            '''
          }
        }
        "#,
    );

    let table = &document.tables[0];
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.columns[1].note.as_deref(), Some("it's the kind"));
    assert_eq!(table.note.as_deref(), Some("Multi-line\ntable note"));
}

#[test]
fn test_keyword_prefixed_column_names() {
    let document = parse(
        r#"
        Table messages {
          notes text
          note varchar
          reference int
          tablet varchar
        }
        "#,
    );

    let names: Vec<&str> = document.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["notes", "note", "reference", "tablet"]);
}

#[test]
fn test_unterminated_table_is_parse_error() {
    let result = DbmlParser::new().parse_document("Table users {\n  id int\n");
    assert!(matches!(result, Err(TabledefError::Parse { .. })));
}

#[test]
fn test_unknown_table_reference_is_error() {
    let result = DbmlParser::new().parse_document(
        "Table posts { id int user_id int [ref: > users.id] }",
    );
    match result {
        Err(TabledefError::Reference { message }) => assert!(message.contains("users")),
        other => panic!("expected reference error, got {:?}", other),
    }
}

#[test]
fn test_unknown_column_reference_is_error() {
    let result = DbmlParser::new().parse_document(
        "Table users { id int } Table posts { user_id int }\nRef: posts.user_id > users.uuid",
    );
    assert!(matches!(result, Err(TabledefError::Reference { .. })));
}

#[test]
fn test_mismatched_composite_reference_is_error() {
    let result = DbmlParser::new().parse_document(
        "Table a { x int y int } Table b { id int }\nRef: a.(x, y) > b.(id)",
    );
    assert!(matches!(result, Err(TabledefError::Reference { .. })));
}

#[test]
fn test_reference_resolution_is_case_insensitive_fallback() {
    let document = parse("Table Users { ID int } Table posts { user_id int [ref: > users.id] }");
    assert_eq!(
        document.refs[0].right,
        vec![ColumnPointer { table: "Users".into(), column: "ID".into() }]
    );
}

#[test]
fn test_empty_document() {
    let document = parse("  // nothing here\n");
    assert!(document.tables.is_empty());
    assert!(document.refs.is_empty());
}

#[test]
fn test_unescape_and_dedent() {
    assert_eq!(unescape(r"it\'s"), "it's");
    assert_eq!(unescape(r"a\\b"), r"a\b");
    assert_eq!(unescape(r"keep \d"), r"keep \d");
    assert_eq!(dedent("\n    first\n      second\n    "), "first\n  second");
}
