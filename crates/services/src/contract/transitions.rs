// Path: crates/services/src/contract/transitions.rs
//! The authoritative transition table (spec §4.8). Two places in the prose
//! (invitation issuance, objection submission) list a narrower set of
//! source states than this table allows; where the two disagree this table
//! wins (see `DESIGN.md`, "transition table vs. prose") since §4.8 calls it
//! authoritative.

use rental_types::contract::{ContractState, Role};

/// One row of the table: the states `to` reachable from `from`, and which
/// roles may drive each of them.
struct Edge {
    from: ContractState,
    to: ContractState,
    roles: &'static [Role],
}

use ContractState::*;
use Role::*;

const EDGES: &[Edge] = &[
    Edge { from: Draft, to: LandlordCompleting, roles: &[Landlord] },
    Edge { from: Draft, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: LandlordCompleting, to: TenantInvited, roles: &[Landlord] },
    Edge { from: LandlordCompleting, to: Draft, roles: &[Landlord] },
    Edge { from: LandlordCompleting, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: TenantInvited, to: TenantReviewing, roles: &[Tenant] },
    Edge { from: TenantInvited, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: TenantReviewing, to: ObjectionsPending, roles: &[Landlord, Tenant] },
    Edge { from: TenantReviewing, to: TenantDataPending, roles: &[Tenant, System] },
    Edge { from: TenantReviewing, to: LandlordReviewing, roles: &[Tenant] },
    Edge { from: TenantReviewing, to: Cancelled, roles: &[Landlord, Tenant, Admin] },
    Edge { from: LandlordReviewing, to: ObjectionsPending, roles: &[Landlord, Tenant] },
    Edge { from: LandlordReviewing, to: BothReviewing, roles: &[Landlord] },
    Edge { from: LandlordReviewing, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: ObjectionsPending, to: NegotiationInProgress, roles: &[Landlord, Tenant] },
    Edge { from: ObjectionsPending, to: TenantReviewing, roles: &[System] },
    Edge { from: ObjectionsPending, to: LandlordReviewing, roles: &[System] },
    Edge { from: ObjectionsPending, to: BothReviewing, roles: &[System] },
    Edge { from: ObjectionsPending, to: Cancelled, roles: &[Landlord, Tenant, Admin] },
    Edge { from: NegotiationInProgress, to: TenantReviewing, roles: &[System] },
    Edge { from: NegotiationInProgress, to: ObjectionsPending, roles: &[Landlord, Tenant] },
    Edge { from: NegotiationInProgress, to: BothReviewing, roles: &[System] },
    Edge { from: NegotiationInProgress, to: Cancelled, roles: &[Landlord, Tenant, Admin] },
    Edge { from: TenantDataPending, to: TenantAuthentication, roles: &[Tenant] },
    Edge { from: TenantDataPending, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: BothReviewing, to: ReadyToSign, roles: &[System] },
    Edge { from: BothReviewing, to: ObjectionsPending, roles: &[Landlord, Tenant] },
    Edge { from: BothReviewing, to: Cancelled, roles: &[Landlord, Tenant, Admin] },
    Edge { from: ReadyToSign, to: FullySigned, roles: &[System] },
    Edge { from: ReadyToSign, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: FullySigned, to: Published, roles: &[Landlord] },
    Edge { from: FullySigned, to: Cancelled, roles: &[Landlord, Admin] },
    Edge { from: Published, to: Active, roles: &[System] },
    Edge { from: Published, to: Terminated, roles: &[Landlord, Admin] },
    Edge { from: Active, to: Expired, roles: &[System] },
    Edge { from: Active, to: Terminated, roles: &[Landlord, Admin] },
    Edge { from: Expired, to: Terminated, roles: &[System, Admin] },
];

/// Whether `role` may drive the transition `from -> to` (spec §4.8, "role gating").
pub fn is_allowed(from: ContractState, to: ContractState, role: Role) -> bool {
    EDGES
        .iter()
        .any(|e| e.from == from && e.to == to && e.roles.contains(&role))
}

/// The party the coordinator considers responsible for acting next, given
/// the current state (spec §4.8, `get_current_responsible_party`).
pub fn responsible_party(state: ContractState) -> Role {
    match state {
        Draft | LandlordCompleting => Landlord,
        TenantInvited => Tenant,
        TenantReviewing => Tenant,
        LandlordReviewing => Landlord,
        ObjectionsPending | NegotiationInProgress => Landlord,
        TenantDataPending | TenantAuthentication => Tenant,
        BothReviewing => Tenant,
        ReadyToSign => Tenant,
        FullySigned => Landlord,
        Published | Active | Expired => System,
        Terminated | Cancelled => System,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landlord_alone_drives_draft_completion() {
        assert!(is_allowed(Draft, LandlordCompleting, Landlord));
        assert!(!is_allowed(Draft, LandlordCompleting, Tenant));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        assert!(!is_allowed(Terminated, Active, Admin));
        assert!(!is_allowed(Cancelled, Draft, Admin));
    }

    #[test]
    fn only_landlord_publishes() {
        assert!(is_allowed(FullySigned, Published, Landlord));
        assert!(!is_allowed(FullySigned, Published, Tenant));
    }
}
