use criterion::*;
use graphql_rowset::Projection;
use graphql_rowset::ResponseBuilder;
use graphql_rowset::SchemaRegistry;

/// One ~1 KB row shaped like a JSONB-composing view's output.
fn sample_row(i: usize) -> String {
    let mut tags = String::new();
    for t in 0..20 {
        if t > 0 {
            tags.push(',');
        }
        tags.push_str(&format!(r#""tag_{t}""#));
    }
    format!(
        r#"{{"order_id":{i},"customer_name":"Customer {i}","email_address":"customer{i}@example.com","total_amount":1234.56,"line_items":[{{"item_id":1,"product_name":"Widget","unit_price":9.99,"quantity_ordered":3}},{{"item_id":2,"product_name":"Gadget","unit_price":19.99,"quantity_ordered":1}}],"shipping_address":{{"street_line_1":"1 Main St","postal_code":"10001","country_code":"US"}},"search_tags":[{tags}],"created_at":"2024-01-01T00:00:00Z","internal_audit_note":"{}"}}"#,
        "x".repeat(320),
    )
}

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register_type(
            "Order",
            [
                ("order_id".to_string(), "Int"),
                ("customer_name".to_string(), "String"),
                ("line_items".to_string(), "[LineItem]"),
                ("shipping_address".to_string(), "Address"),
            ],
        )
        .unwrap();
    registry
        .register_type(
            "LineItem",
            [
                ("item_id".to_string(), "Int"),
                ("product_name".to_string(), "String"),
            ],
        )
        .unwrap();
    registry
        .register_type(
            "Address",
            [("street_line_1".to_string(), "String")],
        )
        .unwrap();
    registry
}

fn bench_list_response(c: &mut Criterion) {
    let rows: Vec<String> = (0..100).map(sample_row).collect();
    let builder = ResponseBuilder::new();

    c.bench_function("list_response_100x1kb", move |b| {
        b.iter(|| {
            let response = builder
                .list(&rows, "orders", None, None)
                .expect("rows are well-formed");
            black_box(response);
        })
    });
}

fn bench_list_response_typed(c: &mut Criterion) {
    let rows: Vec<String> = (0..100).map(sample_row).collect();
    let registry = registry();

    c.bench_function("list_response_100x1kb_typed", move |b| {
        let builder = ResponseBuilder::new().registry(&registry);
        b.iter(|| {
            let response = builder
                .list(&rows, "orders", Some("Order"), None)
                .expect("rows are well-formed");
            black_box(response);
        })
    });
}

fn bench_projected_response(c: &mut Criterion) {
    let rows: Vec<String> = (0..100).map(sample_row).collect();
    let plan = Projection::from_paths([
        vec!["order_id"],
        vec!["customer_name"],
        vec!["line_items", "product_name"],
    ]);
    let builder = ResponseBuilder::new();

    c.bench_function("list_response_100x1kb_projected", move |b| {
        b.iter(|| {
            let response = builder
                .list(&rows, "orders", None, Some(&plan))
                .expect("rows are well-formed");
            black_box(response);
        })
    });
}

criterion_group!(
    benches,
    bench_list_response,
    bench_list_response_typed,
    bench_projected_response
);
criterion_main!(benches);
