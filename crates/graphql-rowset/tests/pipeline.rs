//! Whole-pipeline scenarios: one registry, realistic rows, and the exact
//! bytes a client receives.

use expect_test::expect;
use graphql_rowset::MutationShape;
use graphql_rowset::Projection;
use graphql_rowset::ResponseBuilder;
use graphql_rowset::SchemaRegistry;

fn commerce_registry() -> SchemaRegistry {
    let registry = SchemaRegistry::from_json(
        r#"{
            "version": "2024.1",
            "features": ["type_resolution"],
            "types": {
                "Customer": {
                    "fields": {
                        "id": "ID",
                        "customer_name": "String",
                        "billing_address": "Address?",
                        "orders": "[Order]"
                    }
                },
                "Order": {
                    "fields": {
                        "id": "ID",
                        "total_amount": "Float",
                        "line_items": "[LineItem]"
                    }
                },
                "LineItem": {
                    "fields": {
                        "sku_code": "String",
                        "unit_price": "Float"
                    }
                },
                "Address": {
                    "fields": {
                        "street_line_1": "String",
                        "postal_code": "String"
                    }
                }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(registry.version(), "2024.1");
    registry
}

fn text(response: graphql_rowset::ResponseBytes) -> String {
    String::from_utf8(response.into_bytes()).unwrap()
}

/// query { customers { customerName billingAddress { postalCode } orders { totalAmount } } }
#[test]
fn projected_typed_list_end_to_end() {
    let registry = commerce_registry();
    let rows = [
        r#"{"id":"c1","customer_name":"Ada","internal_score":9,"billing_address":{"street_line_1":"1 Main","postal_code":"10001"},"orders":[{"id":"o1","total_amount":12.50,"line_items":[{"sku_code":"A","unit_price":1.25}]}]}"#,
        r#"{"id":"c2","customer_name":"Grace","billing_address":null,"orders":[]}"#,
    ];
    let plan = Projection::from_paths([
        vec!["customer_name"],
        vec!["billing_address", "postal_code"],
        vec!["orders", "total_amount"],
    ]);

    let response = ResponseBuilder::new()
        .registry(&registry)
        .list(&rows, "customers", Some("Customer"), Some(&plan))
        .unwrap();

    expect![[
        r#"{"data":{"customers":[{"__typename":"Customer","customerName":"Ada","billingAddress":{"__typename":"Address","postalCode":"10001"},"orders":[{"__typename":"Order","totalAmount":12.50}]},{"__typename":"Customer","customerName":"Grace","billingAddress":null,"orders":[]}]}}"#
    ]]
    .assert_eq(&text(response));
}

/// query { customer { ...everything } } — no projection, full row.
#[test]
fn full_single_end_to_end() {
    let registry = commerce_registry();
    let row = r#"{"id":"c1","customer_name":"Ada","orders":[{"id":"o1","total_amount":3.00,"line_items":[{"sku_code":"A","unit_price":1.00},{"sku_code":"B","unit_price":2.00}]}]}"#;

    let response = ResponseBuilder::new()
        .registry(&registry)
        .single(row, "customer", Some("Customer"), None)
        .unwrap();

    expect![[
        r#"{"data":{"customer":{"__typename":"Customer","id":"c1","customerName":"Ada","orders":[{"__typename":"Order","id":"o1","totalAmount":3.00,"lineItems":[{"__typename":"LineItem","skuCode":"A","unitPrice":1.00},{"__typename":"LineItem","skuCode":"B","unitPrice":2.00}]}]}}}"#
    ]]
    .assert_eq(&text(response));
}

/// mutation { placeOrder(...) } with a cascade touching other entities.
#[test]
fn mutation_with_cascade_end_to_end() {
    let registry = commerce_registry();
    let payload = r#"{
        "status": "new",
        "message": "Order placed",
        "entity": {"id":"o9","total_amount":20.00,"line_items":[{"sku_code":"Z","unit_price":20.00}]},
        "entity_type": "Order",
        "entity_id": "o9",
        "cascade": {"customer_totals":{"lifetime_value":320.00},"audit_ref":"ignore-me"}
    }"#;

    let entity_plan = Projection::from_paths([vec!["id"], vec!["line_items", "sku_code"]]);
    let cascade_plan = Projection::from_paths([vec!["customer_totals"]]);
    let shape = MutationShape::new("placeOrder", "PlaceOrderSuccess", "PlaceOrderError")
        .entity("order", Some("Order"))
        .entity_selection(&entity_plan)
        .cascade_selections(&cascade_plan);

    let response = ResponseBuilder::new()
        .registry(&registry)
        .mutation(payload, &shape)
        .unwrap();

    expect![[
        r#"{"data":{"placeOrder":{"__typename":"PlaceOrderSuccess","status":"new","message":"Order placed","order":{"__typename":"Order","id":"o9","lineItems":[{"__typename":"LineItem","skuCode":"Z"}]},"entityId":"o9","cascade":{"customerTotals":{"lifetimeValue":320.00}}}}}"#
    ]]
    .assert_eq(&text(response));
}

/// The same registry serves list, single, empty, null, and mutation shapes
/// without interference.
#[test]
fn one_registry_many_shapes() {
    let registry = commerce_registry();
    let builder = ResponseBuilder::new().registry(&registry);

    assert!(builder
        .list(&[r#"{"id":"c1"}"#], "customers", Some("Customer"), None)
        .is_ok());
    assert!(builder
        .single(r#"{"id":"c1"}"#, "customer", Some("Customer"), None)
        .is_ok());
    assert_eq!(
        builder.empty_list("customers").as_bytes(),
        br#"{"data":{"customers":[]}}"#
    );
    assert_eq!(
        builder.null("customer").as_bytes(),
        br#"{"data":{"customer":null}}"#
    );

    let failed = builder
        .mutation(
            r#"{"status":"failed:authorization","message":"No"}"#,
            &MutationShape::new("placeOrder", "PlaceOrderSuccess", "PlaceOrderError"),
        )
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(failed.as_bytes()).unwrap();
    assert_eq!(parsed["data"]["placeOrder"]["code"], 403);
}
