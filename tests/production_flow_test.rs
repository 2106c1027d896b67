//! End-to-end production workflow against an in-memory SQLite database:
//! order -> job card (materials deducted once) -> staged jobs -> dispatch.

use std::sync::Arc;

use rust_decimal_macros::dec;
use assert_matches::assert_matches;
use tokio::sync::mpsc;

use bagforge_api::{
    costing::{GatePolicy, Stage},
    db::{establish_connection, run_migrations, DbPool},
    errors::ServiceError,
    events::EventSender,
    services::dispatch::{CreateDispatchRequest, DispatchService},
    services::inventory::{CreateItemRequest, InventoryService},
    services::orders::{CreateOrderRequest, OrderService, UpdateOrderRequest},
    services::production::{
        CreateJobCardRequest, CreateStageJobRequest, ProductionService, UpdateStageJobStatusRequest,
    },
};
use bagforge_api::services::components::ComponentRequest;
use uuid::Uuid;

struct TestCtx {
    inventory: InventoryService,
    orders: OrderService,
    production: ProductionService,
    dispatch: DispatchService,
    _event_rx: mpsc::Receiver<bagforge_api::events::Event>,
}

async fn setup(db_name: &str, gate_policy: GatePolicy) -> TestCtx {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);
    let db = establish_connection(&url).await.expect("connect sqlite");
    run_migrations(&db).await.expect("run migrations");
    let db: Arc<DbPool> = Arc::new(db);

    let (tx, rx) = mpsc::channel(256);
    let events = Some(Arc::new(EventSender::new(tx)));

    let production = ProductionService::new(db.clone(), events.clone(), gate_policy);
    TestCtx {
        inventory: InventoryService::new(db.clone(), events.clone()),
        orders: OrderService::new(db.clone(), events.clone()),
        dispatch: DispatchService::new(db.clone(), events.clone(), production.clone()),
        production,
        _event_rx: rx,
    }
}

async fn seed_material(ctx: &TestCtx, name: &str) -> Uuid {
    ctx.inventory
        .create_item(CreateItemRequest {
            name: name.to_string(),
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

async fn seed_order(ctx: &TestCtx, number: &str, material_id: Uuid, quantity: i32) -> Uuid {
    ctx.orders
        .create_order(CreateOrderRequest {
            order_number: number.to_string(),
            customer_name: "Acme Retail".to_string(),
            catalog_id: None,
            quantity,
            length: None,
            width: None,
            cutting_charge: Some(dec!(2)),
            printing_charge: Some(dec!(1.5)),
            stitching_charge: Some(dec!(1)),
            transport_charge: Some(dec!(0.5)),
            selling_rate: None,
            margin: None,
            components: Some(vec![ComponentRequest {
                component_type: "body".to_string(),
                length: None,
                width: None,
                roll_width: None,
                material_id: Some(material_id),
                formula: "manual".to_string(),
                consumption: Some(dec!(5)),
            }]),
            notes: None,
        })
        .await
        .expect("create order")
        .id
}

#[tokio::test]
async fn job_card_deducts_materials_exactly_once() {
    let ctx = setup("jc_exactly_once", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Canvas 12oz").await;
    let order_id = seed_order(&ctx, "ORD-1001", material_id, 100).await;

    let card = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .expect("create job card");
    assert_eq!(card.card_number, "JC-ORD-1001");
    assert_eq!(card.status, "pending");

    // 5 per bag x 100 bags = 500 deducted from the 1000 on hand.
    let item = ctx
        .inventory
        .get_item(material_id)
        .await
        .unwrap()
        .expect("material exists");
    assert_eq!(item.quantity, dec!(500));

    // The deduction left a ledger line under the card's batch.
    let lines = ctx
        .production
        .consumption_lines(card.id)
        .await
        .expect("consumption lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, dec!(500));
    assert!(!lines[0].reversed);

    // The order moved into production.
    let order = ctx.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "in_production");

    // A second card for the same order is rejected and deducts nothing.
    let err = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .expect_err("duplicate card must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    let item = ctx.inventory.get_item(material_id).await.unwrap().unwrap();
    assert_eq!(item.quantity, dec!(500));
}

#[tokio::test]
async fn order_edits_are_rejected_once_in_production() {
    let ctx = setup("jc_order_frozen", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Canvas 12oz").await;
    let order_id = seed_order(&ctx, "ORD-1002", material_id, 50).await;

    ctx.production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .expect("create job card");

    let err = ctx
        .orders
        .update_order(
            order_id,
            UpdateOrderRequest {
                customer_name: "Acme Retail".to_string(),
                quantity: 75,
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
        .expect_err("edit after deduction must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn reversal_restores_stock_and_is_one_shot() {
    let ctx = setup("jc_reversal", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Liner").await;
    let order_id = seed_order(&ctx, "ORD-1003", material_id, 100).await;

    let card = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .unwrap();

    ctx.production
        .reverse_consumption(card.id)
        .await
        .expect("reverse consumption");

    let item = ctx.inventory.get_item(material_id).await.unwrap().unwrap();
    assert_eq!(item.quantity, dec!(1000));

    let lines = ctx.production.consumption_lines(card.id).await.unwrap();
    assert!(lines.iter().all(|line| line.reversed));

    // Reversing again finds nothing to reverse.
    let err = ctx
        .production
        .reverse_consumption(card.id)
        .await
        .expect_err("second reversal must fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let item = ctx.inventory.get_item(material_id).await.unwrap().unwrap();
    assert_eq!(item.quantity, dec!(1000));
}

#[tokio::test]
async fn stages_gate_on_the_prior_stage() {
    let ctx = setup("jc_stage_gates", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Webbing").await;
    let order_id = seed_order(&ctx, "ORD-1004", material_id, 10).await;

    let card = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .unwrap();

    let stage_request = |stage: Stage| CreateStageJobRequest {
        stage,
        assigned_to: None,
        quantity: Some(10),
        notes: None,
    };

    // Printing before any cutting job exists: gate closed.
    let err = ctx
        .production
        .create_stage_job(card.id, stage_request(Stage::Printing))
        .await
        .expect_err("printing gated on cutting");
    assert_matches!(err, ServiceError::StageNotReady(_));

    // Cutting opens unconditionally.
    let cutting = ctx
        .production
        .create_stage_job(card.id, stage_request(Stage::Cutting))
        .await
        .expect("create cutting job");

    // A pending cutting job still keeps printing closed under the strict rule.
    let err = ctx
        .production
        .create_stage_job(card.id, stage_request(Stage::Printing))
        .await
        .expect_err("pending cutting keeps gate closed");
    assert_matches!(err, ServiceError::StageNotReady(_));

    ctx.production
        .update_stage_job_status(
            cutting.id,
            UpdateStageJobStatusRequest {
                status: "completed".to_string(),
                notes: None,
            },
        )
        .await
        .expect("complete cutting");

    let printing = ctx
        .production
        .create_stage_job(card.id, stage_request(Stage::Printing))
        .await
        .expect("printing opens after cutting completes");

    // Card status is derived: one completed, one pending -> in progress.
    let card = ctx.production.get_job_card(card.id).await.unwrap().unwrap();
    assert_eq!(card.status, "in_progress");

    // Dispatch stays closed until stitching completes.
    assert!(!ctx.production.dispatch_ready(order_id).await.unwrap());

    ctx.production
        .update_stage_job_status(
            printing.id,
            UpdateStageJobStatusRequest {
                status: "completed".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    let stitching = ctx
        .production
        .create_stage_job(card.id, stage_request(Stage::Stitching))
        .await
        .expect("stitching opens after printing completes");
    assert!(!ctx.production.dispatch_ready(order_id).await.unwrap());

    ctx.production
        .update_stage_job_status(
            stitching.id,
            UpdateStageJobStatusRequest {
                status: "completed".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert!(ctx.production.dispatch_ready(order_id).await.unwrap());

    let card = ctx.production.get_job_card(card.id).await.unwrap().unwrap();
    assert_eq!(card.status, "completed");
}

#[tokio::test]
async fn lenient_policy_opens_gate_on_started_jobs() {
    let ctx = setup("jc_any_started", GatePolicy::AnyStarted).await;
    let material_id = seed_material(&ctx, "Cord").await;
    let order_id = seed_order(&ctx, "ORD-1005", material_id, 10).await;

    let card = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .unwrap();

    let cutting = ctx
        .production
        .create_stage_job(
            card.id,
            CreateStageJobRequest {
                stage: Stage::Cutting,
                assigned_to: None,
                quantity: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Merely starting cutting is enough under the lenient rule.
    ctx.production
        .update_stage_job_status(
            cutting.id,
            UpdateStageJobStatusRequest {
                status: "in_progress".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    ctx.production
        .create_stage_job(
            card.id,
            CreateStageJobRequest {
                stage: Stage::Printing,
                assigned_to: None,
                quantity: None,
                notes: None,
            },
        )
        .await
        .expect("printing opens once cutting starts");
}

#[tokio::test]
async fn dispatch_caps_at_order_quantity_and_completes_order() {
    let ctx = setup("jc_dispatch", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Denim").await;
    let order_id = seed_order(&ctx, "ORD-1006", material_id, 100).await;

    let card = ctx
        .production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .unwrap();

    // Walk the card through all three stages.
    for stage in [Stage::Cutting, Stage::Printing, Stage::Stitching] {
        let job = ctx
            .production
            .create_stage_job(
                card.id,
                CreateStageJobRequest {
                    stage,
                    assigned_to: None,
                    quantity: Some(100),
                    notes: None,
                },
            )
            .await
            .unwrap();
        ctx.production
            .update_stage_job_status(
                job.id,
                UpdateStageJobStatusRequest {
                    status: "completed".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    let dispatch_request = |quantity: i32| CreateDispatchRequest {
        order_id,
        batch_id: None,
        quantity,
        dispatch_date: None,
        vehicle_number: Some("KA-01-AB-1234".to_string()),
        notes: None,
    };

    ctx.dispatch
        .create_dispatch(dispatch_request(60))
        .await
        .expect("partial dispatch");

    let summary = ctx.dispatch.dispatch_summary(order_id).await.unwrap();
    assert_eq!(summary.dispatched, 60);
    assert_eq!(summary.remaining, 40);
    assert!(!summary.fully_dispatched);

    // Over-dispatching the remaining 40 is rejected.
    let err = ctx
        .dispatch
        .create_dispatch(dispatch_request(50))
        .await
        .expect_err("over-dispatch must fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    ctx.dispatch
        .create_dispatch(dispatch_request(40))
        .await
        .expect("final dispatch");

    let summary = ctx.dispatch.dispatch_summary(order_id).await.unwrap();
    assert!(summary.fully_dispatched);
    assert_eq!(summary.remaining, 0);

    // The final dispatch completed the order.
    let order = ctx.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, "completed");
}

#[tokio::test]
async fn dispatch_is_gated_on_stitching() {
    let ctx = setup("jc_dispatch_gate", GatePolicy::AllCompleted).await;
    let material_id = seed_material(&ctx, "Mesh").await;
    let order_id = seed_order(&ctx, "ORD-1007", material_id, 10).await;

    ctx.production
        .create_job_card(CreateJobCardRequest {
            order_id,
            card_number: None,
            notes: None,
        })
        .await
        .unwrap();

    let err = ctx
        .dispatch
        .create_dispatch(CreateDispatchRequest {
            order_id,
            batch_id: None,
            quantity: 10,
            dispatch_date: None,
            vehicle_number: None,
            notes: None,
        })
        .await
        .expect_err("dispatch without stitching must fail");
    assert_matches!(err, ServiceError::StageNotReady(_));
}
