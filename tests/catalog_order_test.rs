//! Catalog and order costing end to end: component derivation, charge
//! aggregation, pricing reconciliation, and catalog-to-order cloning.

use std::sync::Arc;

use rust_decimal_macros::dec;
use assert_matches::assert_matches;
use tokio::sync::mpsc;

use bagforge_api::{
    db::{establish_connection, run_migrations, DbPool},
    errors::ServiceError,
    events::EventSender,
    services::catalog::{CatalogService, CreateCatalogRequest},
    services::components::ComponentRequest,
    services::inventory::{CreateItemRequest, InventoryService},
    services::orders::{CreateOrderRequest, OrderService, UpdateOrderRequest},
};
use uuid::Uuid;

struct TestCtx {
    catalog: CatalogService,
    orders: OrderService,
    inventory: InventoryService,
    _event_rx: mpsc::Receiver<bagforge_api::events::Event>,
}

async fn setup(db_name: &str) -> TestCtx {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);
    let db = establish_connection(&url).await.expect("connect sqlite");
    run_migrations(&db).await.expect("run migrations");
    let db: Arc<DbPool> = Arc::new(db);

    let (tx, rx) = mpsc::channel(256);
    let events = Some(Arc::new(EventSender::new(tx)));

    TestCtx {
        catalog: CatalogService::new(db.clone(), events.clone()),
        orders: OrderService::new(db.clone(), events.clone()),
        inventory: InventoryService::new(db, events),
        _event_rx: rx,
    }
}

async fn seed_material(ctx: &TestCtx) -> Uuid {
    ctx.inventory
        .create_item(CreateItemRequest {
            name: "Canvas 12oz".to_string(),
            material_type: Some("fabric".to_string()),
            unit: "m".to_string(),
            quantity: dec!(1000),
            min_stock_level: dec!(100),
            unit_rate: dec!(62),
            supplier_id: None,
        })
        .await
        .expect("create material")
        .id
}

fn catalog_request(material_id: Uuid) -> CreateCatalogRequest {
    CreateCatalogRequest {
        name: "Canvas tote 40x24".to_string(),
        bag_type: Some("tote".to_string()),
        length: Some(dec!(40)),
        width: Some(dec!(24)),
        default_quantity: 100,
        cutting_charge: dec!(2),
        printing_charge: dec!(1.5),
        stitching_charge: dec!(1),
        transport_charge: dec!(0.5),
        selling_rate: Some(dec!(60)),
        margin: None,
        components: vec![ComponentRequest {
            component_type: "body".to_string(),
            length: Some(dec!(40)),
            width: Some(dec!(24)),
            roll_width: Some(dec!(30)),
            material_id: Some(material_id),
            formula: "standard".to_string(),
            consumption: None,
        }],
        notes: None,
    }
}

#[tokio::test]
async fn catalog_creation_derives_full_costing() {
    let ctx = setup("cat_costing").await;
    let material_id = seed_material(&ctx).await;

    let catalog = ctx
        .catalog
        .create_catalog(catalog_request(material_id))
        .await
        .expect("create catalog");

    // (40 x 24) / (30 x 39.39) = 0.8124 meters per bag.
    assert_eq!(catalog.components.len(), 1);
    let body = &catalog.components[0];
    assert_eq!(body.consumption, Some(dec!(0.8124)));
    assert_eq!(body.material_rate, Some(dec!(62)));
    // 0.8124 * 62 = 50.3688 -> 50.37
    assert_eq!(body.material_cost, Some(dec!(50.37)));

    assert_eq!(catalog.material_cost, dec!(50.37));
    // 50.37 + 2 + 1.5 + 1 + 0.5
    assert_eq!(catalog.total_cost, dec!(55.37));

    // Selling rate was supplied; margin is derived as a percentage of cost.
    assert_eq!(catalog.selling_rate, Some(dec!(60)));
    assert_eq!(catalog.margin, Some(dec!(8.36)));
}

#[tokio::test]
async fn margin_edit_derives_selling_rate() {
    let ctx = setup("cat_margin_edit").await;
    let material_id = seed_material(&ctx).await;

    let mut request = catalog_request(material_id);
    request.selling_rate = None;
    request.margin = Some(dec!(20));

    let catalog = ctx.catalog.create_catalog(request).await.expect("create catalog");

    // 55.37 * 1.20 = 66.444 -> 66.44
    assert_eq!(catalog.selling_rate, Some(dec!(66.44)));
    assert_eq!(catalog.margin, Some(dec!(20)));
}

#[tokio::test]
async fn supplying_both_pricing_fields_is_rejected() {
    let ctx = setup("cat_both_pricing").await;
    let material_id = seed_material(&ctx).await;

    let mut request = catalog_request(material_id);
    request.margin = Some(dec!(20));

    let err = ctx
        .catalog
        .create_catalog(request)
        .await
        .expect_err("both pricing fields must fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn update_keeps_selling_rate_and_recomputes_margin() {
    let ctx = setup("cat_update_pricing").await;
    let material_id = seed_material(&ctx).await;

    let catalog = ctx
        .catalog
        .create_catalog(catalog_request(material_id))
        .await
        .unwrap();

    // Raise the cutting charge without touching either pricing field.
    let mut request = catalog_request(material_id);
    request.cutting_charge = dec!(4);
    request.selling_rate = None;

    let updated = ctx
        .catalog
        .update_catalog(catalog.id, request)
        .await
        .expect("update catalog");

    // Total cost moved to 57.37; the stored rate of 60 is kept and the
    // margin re-derived against the new cost.
    assert_eq!(updated.total_cost, dec!(57.37));
    assert_eq!(updated.selling_rate, Some(dec!(60)));
    assert_eq!(updated.margin, Some(dec!(4.58)));
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn unknown_material_is_a_validation_error() {
    let ctx = setup("cat_unknown_material").await;

    let err = ctx
        .catalog
        .create_catalog(catalog_request(Uuid::new_v4()))
        .await
        .expect_err("unknown material must fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn order_clones_catalog_components_and_scales_consumption() {
    let ctx = setup("order_from_catalog").await;
    let material_id = seed_material(&ctx).await;

    let catalog = ctx
        .catalog
        .create_catalog(catalog_request(material_id))
        .await
        .unwrap();

    let order = ctx
        .orders
        .create_order(CreateOrderRequest {
            order_number: "ORD-2001".to_string(),
            customer_name: "Acme Retail".to_string(),
            catalog_id: Some(catalog.id),
            quantity: 100,
            length: None,
            width: None,
            cutting_charge: None,
            printing_charge: None,
            stitching_charge: None,
            transport_charge: None,
            selling_rate: None,
            margin: None,
            components: None,
            notes: None,
        })
        .await
        .expect("create order from catalog");

    // Charges and dimensions come from the product.
    assert_eq!(order.cutting_charge, dec!(2));
    assert_eq!(order.printing_charge, dec!(1.5));
    assert_eq!(order.stitching_charge, dec!(1));
    assert_eq!(order.transport_charge, dec!(0.5));
    assert_eq!(order.length, Some(dec!(40)));
    assert_eq!(order.width, Some(dec!(24)));

    // The component set is cloned and re-derived, with the production
    // total scaled by the order quantity.
    assert_eq!(order.components.len(), 1);
    let body = &order.components[0];
    assert_eq!(body.consumption, Some(dec!(0.8124)));
    assert_eq!(body.total_consumption, Some(dec!(81.24)));
    assert_eq!(body.material_cost, Some(dec!(50.37)));

    // Costs stay per bag; the catalog selling rate is inherited and its
    // margin re-derived against this order's cost.
    assert_eq!(order.material_cost, dec!(50.37));
    assert_eq!(order.total_cost, dec!(55.37));
    assert_eq!(order.selling_rate, Some(dec!(60)));
    assert_eq!(order.margin, Some(dec!(8.36)));
    assert_eq!(order.status, "pending");
}

#[tokio::test]
async fn order_components_stay_frozen_after_catalog_edits() {
    let ctx = setup("order_frozen_copy").await;
    let material_id = seed_material(&ctx).await;

    let catalog = ctx
        .catalog
        .create_catalog(catalog_request(material_id))
        .await
        .unwrap();

    let order = ctx
        .orders
        .create_order(CreateOrderRequest {
            order_number: "ORD-2002".to_string(),
            customer_name: "Acme Retail".to_string(),
            catalog_id: Some(catalog.id),
            quantity: 50,
            length: None,
            width: None,
            cutting_charge: None,
            printing_charge: None,
            stitching_charge: None,
            transport_charge: None,
            selling_rate: None,
            margin: None,
            components: None,
            notes: None,
        })
        .await
        .unwrap();

    // Deleting the product leaves the order's copies untouched.
    ctx.catalog.delete_catalog(catalog.id).await.expect("delete catalog");

    let order = ctx
        .orders
        .get_order(order.id)
        .await
        .unwrap()
        .expect("order still readable");
    assert_eq!(order.components.len(), 1);
    assert_eq!(order.components[0].consumption, Some(dec!(0.8124)));
    assert_eq!(order.total_cost, dec!(55.37));
}

#[tokio::test]
async fn order_update_keeps_dimensions_when_omitted() {
    let ctx = setup("order_update_dims").await;
    let material_id = seed_material(&ctx).await;

    let catalog = ctx
        .catalog
        .create_catalog(catalog_request(material_id))
        .await
        .unwrap();

    let order = ctx
        .orders
        .create_order(CreateOrderRequest {
            order_number: "ORD-2003".to_string(),
            customer_name: "Acme Retail".to_string(),
            catalog_id: Some(catalog.id),
            quantity: 100,
            length: None,
            width: None,
            cutting_charge: None,
            printing_charge: None,
            stitching_charge: None,
            transport_charge: None,
            selling_rate: None,
            margin: None,
            components: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(order.length, Some(dec!(40)));
    assert_eq!(order.width, Some(dec!(24)));

    // Change the customer and quantity only; the stored dimensions and
    // charges fall back to their current values.
    let updated = ctx
        .orders
        .update_order(
            order.id,
            UpdateOrderRequest {
                customer_name: "Acme Wholesale".to_string(),
                quantity: 120,
                length: None,
                width: None,
                cutting_charge: None,
                printing_charge: None,
                stitching_charge: None,
                transport_charge: None,
                selling_rate: None,
                margin: None,
                components: None,
                notes: None,
            },
        )
        .await
        .expect("update order");

    assert_eq!(updated.customer_name, "Acme Wholesale");
    assert_eq!(updated.quantity, 120);
    assert_eq!(updated.length, Some(dec!(40)));
    assert_eq!(updated.width, Some(dec!(24)));
    assert_eq!(updated.cutting_charge, dec!(2));
}
