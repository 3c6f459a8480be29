//! End-to-end walk through the pipeline: register a schema, take the JSON
//! rows a database view would emit, and print the finished response bytes.
//!
//! Run with: `cargo run --example blog`

use graphql_rowset::MutationShape;
use graphql_rowset::Projection;
use graphql_rowset::ResponseBuilder;
use graphql_rowset::SchemaRegistry;

fn main() -> Result<(), graphql_rowset::Error> {
    let mut registry = SchemaRegistry::new();
    registry.register_type(
        "User",
        [
            ("id".to_string(), "Int"),
            ("user_name".to_string(), "String"),
            ("posts".to_string(), "[Post]"),
        ],
    )?;
    registry.register_type(
        "Post",
        [
            ("id".to_string(), "Int"),
            ("post_title".to_string(), "String"),
            ("view_count".to_string(), "Int"),
        ],
    )?;

    let builder = ResponseBuilder::new().registry(&registry);

    // What `SELECT data FROM v_user` hands back: one JSON text per row.
    let rows = [
        r#"{"id":1,"user_name":"Ada","posts":[{"id":10,"post_title":"Hello","view_count":41}]}"#,
        r#"{"id":2,"user_name":"Grace","posts":[]}"#,
    ];

    // query { users { userName posts { postTitle } } }
    let plan = Projection::from_paths([
        vec!["user_name"],
        vec!["posts", "post_title"],
    ]);
    let response = builder.list(&rows, "users", Some("User"), Some(&plan))?;
    println!("{}", String::from_utf8_lossy(response.as_bytes()));

    // mutation { createPost(...) { ... } }
    let mutation_result = r#"{
        "status": "new",
        "message": "Post created",
        "entity": {"id": 11, "post_title": "Fresh", "view_count": 0},
        "entity_type": "Post"
    }"#;
    let shape = MutationShape::new("createPost", "CreatePostSuccess", "CreatePostError")
        .entity("post", Some("Post"));
    let response = builder.mutation(mutation_result, &shape)?;
    println!("{}", String::from_utf8_lossy(response.as_bytes()));

    Ok(())
}
