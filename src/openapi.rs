use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BagForge API",
        version = "0.3.0",
        description = r#"
# BagForge Manufacturing API

Backend for a bag manufacturing operation: catalog costing, sales orders,
raw-material inventory, and the cutting / printing / stitching production
workflow through to dispatch.

## Costing

Component consumptions are derived server-side from dimensions using the
standard formula `(length x width) / (roll_width x 39.39)` or the linear
formula `length / 39.39`, unless a manual consumption overrides them.
Material cost, total cost, selling rate and margin are all derived figures;
editing the selling rate recomputes the margin and vice versa.

## Production

Creating a job card deducts the order's material consumption from inventory
exactly once, in a single transaction. Stage jobs progress through cutting,
printing and stitching; each stage is gated on the one before it, and
dispatch is gated on stitching.

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20).
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "catalog", description = "Catalog products and costing"),
        (name = "orders", description = "Sales orders"),
        (name = "inventory", description = "Raw-material inventory and ledger"),
        (name = "production", description = "Job cards and stage jobs"),
        (name = "dispatch", description = "Dispatch batches and order dispatches"),
        (name = "suppliers", description = "Material suppliers")
    ),
    paths(
        // Catalog
        crate::handlers::catalog::create_catalog,
        crate::handlers::catalog::get_catalog,
        crate::handlers::catalog::list_catalog,
        crate::handlers::catalog::update_catalog,
        crate::handlers::catalog::delete_catalog,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_by_number,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,

        // Inventory
        crate::handlers::inventory::create_item,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::low_stock_items,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::delete_item,
        crate::handlers::inventory::adjust_stock,
        crate::handlers::inventory::list_transactions,

        // Production
        crate::handlers::production::create_job_card,
        crate::handlers::production::get_job_card,
        crate::handlers::production::list_job_cards,
        crate::handlers::production::consumption_lines,
        crate::handlers::production::reverse_consumption,
        crate::handlers::production::create_stage_job,
        crate::handlers::production::update_stage_job_status,
        crate::handlers::production::dispatch_ready,

        // Dispatch
        crate::handlers::dispatch::create_dispatch,
        crate::handlers::dispatch::create_batch,
        crate::handlers::dispatch::get_batch,
        crate::handlers::dispatch::list_batches,
        crate::handlers::dispatch::list_order_dispatches,
        crate::handlers::dispatch::dispatch_summary,

        // Suppliers
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::costing::Stage,
        crate::services::catalog::CreateCatalogRequest,
        crate::services::catalog::CatalogResponse,
        crate::services::catalog::CatalogComponentResponse,
        crate::services::components::ComponentRequest,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::UpdateOrderRequest,
        crate::services::orders::UpdateOrderStatusRequest,
        crate::handlers::orders::CancelOrderRequest,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderComponentResponse,
        crate::services::inventory::CreateItemRequest,
        crate::services::inventory::UpdateItemRequest,
        crate::services::inventory::AdjustStockRequest,
        crate::services::inventory::ItemResponse,
        crate::services::inventory::TransactionResponse,
        crate::services::production::CreateJobCardRequest,
        crate::services::production::CreateStageJobRequest,
        crate::services::production::UpdateStageJobStatusRequest,
        crate::services::production::JobCardResponse,
        crate::services::production::StageJobResponse,
        crate::services::production::ConsumptionLine,
        crate::services::dispatch::CreateDispatchRequest,
        crate::services::dispatch::CreateDispatchBatchRequest,
        crate::services::dispatch::DispatchResponse,
        crate::services::dispatch::DispatchBatchResponse,
        crate::services::dispatch::DispatchSummary,
        crate::services::suppliers::SupplierRequest,
    ))
)]
pub struct ApiDoc;

/// Swagger UI mounted at /swagger-ui, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
