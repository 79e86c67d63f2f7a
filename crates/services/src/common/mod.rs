// Path: crates/services/src/common/mod.rs
//! Small helpers shared by every workflow in this crate. Kept deliberately
//! thin: each component still owns its own error enum and role-gating
//! decisions, this module only factors out the parts that are identical
//! everywhere (who is a party to a contract, dotted-path JSON field access).

use rental_types::contract::{Contract, Role};
use rental_types::ids::UserId;
use serde_json::Value as JsonValue;

/// The role `user_id` plays on `contract`, if any (spec §3, "Ownership summary").
pub fn contract_role(contract: &Contract, user_id: UserId) -> Option<Role> {
    if contract.landlord_id == user_id {
        Some(Role::Landlord)
    } else if contract.tenant_id == Some(user_id) {
        Some(Role::Tenant)
    } else if contract.guarantor_id == Some(user_id) {
        Some(Role::Guarantor)
    } else {
        None
    }
}

/// Resolves a dotted path (`economic_terms.monthly_rent`) against one of the
/// contract's opaque JSON maps, or against a scalar field by name (spec §4.6,
/// §9 "Auto-apply objection field path"). Returns `None` if the path's root
/// segment does not name a known target.
pub fn resolve_field<'a>(contract: &'a Contract, field_reference: &str) -> Option<JsonValue> {
    let (root, rest) = split_root(field_reference);
    let map = match root {
        "landlord_data" => &contract.landlord_data,
        "tenant_data" => &contract.tenant_data,
        "economic_terms" => &contract.economic_terms,
        "contract_terms" => &contract.contract_terms,
        "special_clauses" => &contract.special_clauses,
        _ => return scalar_field(contract, field_reference),
    };
    match rest {
        Some(key) => map.get(key).cloned(),
        None => Some(JsonValue::Object(map.clone())),
    }
}

/// Writes `value` at `field_reference`, returning `true` if the path resolved
/// to a known target and the write happened.
pub fn apply_field(contract: &mut Contract, field_reference: &str, value: JsonValue) -> bool {
    let (root, rest) = split_root(field_reference);
    let map = match root {
        "landlord_data" => &mut contract.landlord_data,
        "tenant_data" => &mut contract.tenant_data,
        "economic_terms" => &mut contract.economic_terms,
        "contract_terms" => &mut contract.contract_terms,
        "special_clauses" => &mut contract.special_clauses,
        _ => return apply_scalar_field(contract, field_reference, value),
    };
    match rest {
        Some(key) => {
            map.insert(key.to_string(), value);
            true
        }
        None => false,
    }
}

fn split_root(field_reference: &str) -> (&str, Option<&str>) {
    match field_reference.split_once('.') {
        Some((root, rest)) => (root, Some(rest)),
        None => (field_reference, None),
    }
}

fn scalar_field(contract: &Contract, name: &str) -> Option<JsonValue> {
    match name {
        "start_date" => Some(serde_json::to_value(contract.start_date).ok()?),
        "end_date" => Some(serde_json::to_value(contract.end_date).ok()?),
        _ => None,
    }
}

fn apply_scalar_field(contract: &mut Contract, name: &str, value: JsonValue) -> bool {
    match name {
        "start_date" => match serde_json::from_value(value) {
            Ok(v) => {
                contract.start_date = v;
                true
            }
            Err(_) => false,
        },
        "end_date" => match serde_json::from_value(value) {
            Ok(v) => {
                contract.end_date = v;
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blank_contract() -> Contract {
        use rental_types::contract::{ContractState, ContractType, PartyStatus};
        use rental_types::ids::{ContractId, ContractNumber, PropertyId, UserId};
        use chrono::Utc;

        Contract {
            id: ContractId::new(),
            contract_number: ContractNumber::new(2025, 1),
            contract_type: ContractType::RentalUrban,
            current_state: ContractState::Draft,
            landlord_id: UserId::new(),
            tenant_id: None,
            guarantor_id: None,
            property_id: PropertyId::new(),
            landlord_data: Default::default(),
            tenant_data: Default::default(),
            property_data: Default::default(),
            economic_terms: serde_json::Map::new(),
            contract_terms: Default::default(),
            special_clauses: Default::default(),
            landlord: PartyStatus::default(),
            tenant: PartyStatus::default(),
            guarantor: PartyStatus::default(),
            published: false,
            published_at: None,
            published_by: None,
            start_date: None,
            end_date: None,
            pdf_handle: None,
            objections_count: 0,
            has_pending_objections: false,
            last_objection_date: None,
            history: Vec::new(),
            guarantees: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn resolves_and_applies_nested_field() {
        let mut contract = blank_contract();
        assert!(apply_field(
            &mut contract,
            "economic_terms.monthly_rent",
            json!(1_500_000)
        ));
        assert_eq!(
            resolve_field(&contract, "economic_terms.monthly_rent"),
            Some(json!(1_500_000))
        );
    }

    #[test]
    fn unknown_root_resolves_to_none() {
        let contract = blank_contract();
        assert_eq!(resolve_field(&contract, "nonexistent.field"), None);
    }
}
