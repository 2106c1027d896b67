//! Shared component derivation used by the catalog and order services.
//!
//! Both parents carry the same component shape and the same math; this module
//! keeps the request DTO, the rate lookup, and the derivation in one place so
//! the two services cannot drift apart the way the old per-form copies did.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::costing::{component_material_cost, Consumption, Dimensions};
use crate::entities::inventory_item;
use crate::errors::ServiceError;

/// A component as submitted with a catalog product or an order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ComponentRequest {
    #[validate(length(min = 1, max = 100, message = "Component type is required"))]
    pub component_type: String,

    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,

    pub material_id: Option<Uuid>,

    /// "standard", "linear" or "manual".
    #[serde(default = "default_formula")]
    pub formula: String,

    /// Required when `formula` is "manual"; ignored otherwise (the engine
    /// recomputes it from the dimensions).
    pub consumption: Option<Decimal>,
}

fn default_formula() -> String {
    "standard".to_string()
}

/// A component after derivation: resolved per-unit consumption, the material
/// rate snapshotted from inventory, and the resulting material cost.
#[derive(Debug, Clone)]
pub struct DerivedComponent {
    pub component_type: String,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,
    pub material_id: Option<Uuid>,
    pub formula: &'static str,
    pub consumption: Option<Decimal>,
    pub material_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,
}

/// Derives one component against a pre-fetched material rate map.
///
/// A blank consumption (missing dimensions) is not an error; the component is
/// stored without one and contributes nothing to material cost, matching the
/// blank-field behavior users expect from the forms.
pub fn derive_component(
    request: &ComponentRequest,
    rates: &HashMap<Uuid, Decimal>,
) -> Result<DerivedComponent, ServiceError> {
    request.validate()?;

    let mode = Consumption::from_columns(&request.formula, request.consumption)
        .map_err(ServiceError::ValidationError)?;

    let dims = Dimensions::new(request.length, request.width, request.roll_width);
    let consumption = mode.resolve(&dims);
    let material_rate = request
        .material_id
        .and_then(|id| rates.get(&id).copied());
    let material_cost = component_material_cost(consumption, material_rate);

    Ok(DerivedComponent {
        component_type: request.component_type.clone(),
        length: request.length,
        width: request.width,
        roll_width: request.roll_width,
        material_id: request.material_id,
        formula: mode.formula_column(),
        consumption,
        material_rate,
        material_cost,
    })
}

/// Fetches unit rates for every material referenced by the given requests.
/// Referencing an unknown material is a validation error, caught here rather
/// than surfacing later as a silent zero cost.
pub async fn fetch_material_rates<C: ConnectionTrait>(
    db: &C,
    requests: &[ComponentRequest],
) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
    let ids: Vec<Uuid> = requests.iter().filter_map(|c| c.material_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = inventory_item::Entity::find()
        .filter(inventory_item::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;

    let rates: HashMap<Uuid, Decimal> =
        items.into_iter().map(|item| (item.id, item.unit_rate)).collect();

    for id in &ids {
        if !rates.contains_key(id) {
            return Err(ServiceError::ValidationError(format!(
                "Unknown material {}",
                id
            )));
        }
    }

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(formula: &str) -> ComponentRequest {
        ComponentRequest {
            component_type: "body".to_string(),
            length: Some(dec!(40)),
            width: Some(dec!(24)),
            roll_width: Some(dec!(30)),
            material_id: None,
            formula: formula.to_string(),
            consumption: None,
        }
    }

    #[test]
    fn standard_component_derives_consumption() {
        let derived = derive_component(&request("standard"), &HashMap::new()).unwrap();
        assert_eq!(derived.consumption, Some(dec!(0.8124)));
        assert_eq!(derived.formula, "standard");
        // No material attached, so no cost contribution.
        assert_eq!(derived.material_cost, None);
    }

    #[test]
    fn manual_component_keeps_its_value() {
        let mut req = request("manual");
        req.consumption = Some(dec!(1.5));
        let derived = derive_component(&req, &HashMap::new()).unwrap();
        assert_eq!(derived.consumption, Some(dec!(1.5)));
        assert_eq!(derived.formula, "manual");
    }

    #[test]
    fn manual_without_value_is_rejected() {
        let req = request("manual");
        assert!(derive_component(&req, &HashMap::new()).is_err());
    }

    #[test]
    fn material_rate_is_snapshotted_into_cost() {
        let mut req = request("standard");
        let material = Uuid::new_v4();
        req.material_id = Some(material);
        let mut rates = HashMap::new();
        rates.insert(material, dec!(120));

        let derived = derive_component(&req, &rates).unwrap();
        assert_eq!(derived.material_rate, Some(dec!(120)));
        // 0.8124 * 120 = 97.488 -> 97.49
        assert_eq!(derived.material_cost, Some(dec!(97.49)));
    }

    #[test]
    fn missing_dimension_leaves_consumption_blank() {
        let mut req = request("standard");
        req.roll_width = None;
        let derived = derive_component(&req, &HashMap::new()).unwrap();
        assert_eq!(derived.consumption, None);
        assert_eq!(derived.material_cost, None);
    }
}
