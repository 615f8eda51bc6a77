//! Participant plan selection and derived plan amounts.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::{days_between, YearMonth};
use crate::entities::{ParticipantPlan, Property};
use crate::error::CoreError;
use crate::money::{monthly_from_annual, monthly_rrc, RentFrequency};
use crate::types::{Date, DbId, Money};

/// Days ahead a current plan's end date starts to count as expiring.
pub const PLAN_EXPIRY_WARNING_DAYS: i64 = 30;

/// The participant's single `current` plan, if any.
///
/// More than one current plan breaks the plan invariant and is reported as
/// a conflict rather than resolved by guessing.
pub fn current_plan<'a, I>(plans: I, participant_id: DbId) -> Result<Option<&'a ParticipantPlan>, CoreError>
where
    I: IntoIterator<Item = &'a ParticipantPlan>,
{
    let mut found: Option<&ParticipantPlan> = None;
    for plan in plans
        .into_iter()
        .filter(|p| p.participant_id == participant_id && p.is_current())
    {
        if let Some(existing) = found {
            return Err(CoreError::Conflict(format!(
                "Participant {participant_id} has more than one current plan ({} and {})",
                existing.id, plan.id
            )));
        }
        found = Some(plan);
    }
    Ok(found)
}

/// Monthly SDA funding, always derived as `annual_sda_budget / 12`.
pub fn monthly_sda_amount(plan: &ParticipantPlan) -> Money {
    monthly_from_annual(plan.annual_sda_budget)
}

/// The plan's rent contribution as a monthly figure. A missing amount
/// contributes zero; a missing frequency is treated as monthly.
pub fn monthly_rent_contribution(plan: &ParticipantPlan) -> Money {
    match plan.reasonable_rent_contribution {
        Some(amount) => monthly_rrc(amount, plan.rent_contribution_frequency.unwrap_or(RentFrequency::Monthly)),
        None => Decimal::ZERO,
    }
}

/// Whether the plan has started by `month`. Plans beginning after the
/// target month generate no income for it.
pub fn plan_active_in_month(plan: &ParticipantPlan, month: YearMonth) -> bool {
    YearMonth::of(plan.plan_start_date) <= month
}

/// Management fee percentage for a participant: the plan's override, then
/// the property's setting, then `default`.
pub fn resolve_management_fee(plan: &ParticipantPlan, property: &Property, default: Money) -> Money {
    plan.management_fee_percent
        .or(property.management_fee_percent)
        .unwrap_or(default)
}

/// A current plan ending within the look-ahead window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpiringPlan<'a> {
    pub plan: &'a ParticipantPlan,
    pub days_until_expiry: i64,
}

/// Current plans whose end date falls between `today` and `days_ahead`
/// days from now (inclusive), soonest first.
pub fn expiring_plans(plans: &[ParticipantPlan], today: Date, days_ahead: i64) -> Vec<ExpiringPlan<'_>> {
    let mut expiring: Vec<ExpiringPlan<'_>> = plans
        .iter()
        .filter(|p| p.is_current())
        .map(|plan| ExpiringPlan {
            plan,
            days_until_expiry: days_between(today, plan.plan_end_date),
        })
        .filter(|e| (0..=days_ahead).contains(&e.days_until_expiry))
        .collect();
    expiring.sort_by_key(|e| (e.days_until_expiry, e.plan.id));
    expiring
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;

    use super::*;
    use crate::entities::{FundingManagementType, OwnershipType, PlanStatus};

    fn m(s: &str) -> Money {
        Decimal::from_str(s).unwrap()
    }

    fn plan(id: DbId, participant_id: DbId, status: PlanStatus) -> ParticipantPlan {
        ParticipantPlan {
            id,
            participant_id,
            plan_start_date: Date::from_ymd_opt(2024, 7, 1).unwrap(),
            plan_end_date: Date::from_ymd_opt(2025, 6, 30).unwrap(),
            plan_status: status,
            funding_management_type: FundingManagementType::NdiaManaged,
            annual_sda_budget: m("66431.04"),
            monthly_sda_amount: Some(m("1.00")),
            reasonable_rent_contribution: Some(m("381.15")),
            rent_contribution_frequency: Some(RentFrequency::Fortnightly),
            management_fee_percent: None,
        }
    }

    fn property(fee: Option<&str>) -> Property {
        Property {
            id: 1,
            owner_id: 1,
            property_name: None,
            address_line1: "1 Test St".to_string(),
            suburb: "Testville".to_string(),
            state: "VIC".to_string(),
            postcode: "3000".to_string(),
            ownership_type: OwnershipType::Investor,
            management_fee_percent: fee.map(m),
            is_active: true,
        }
    }

    // -- current_plan ----------------------------------------------------

    #[test]
    fn picks_the_current_plan_for_the_participant() {
        let plans = vec![
            plan(1, 7, PlanStatus::Expired),
            plan(2, 7, PlanStatus::Current),
            plan(3, 8, PlanStatus::Current),
        ];
        assert_eq!(current_plan(&plans, 7).unwrap().map(|p| p.id), Some(2));
    }

    #[test]
    fn no_current_plan_is_none() {
        let plans = vec![plan(1, 7, PlanStatus::Pending)];
        assert!(current_plan(&plans, 7).unwrap().is_none());
    }

    #[test]
    fn two_current_plans_conflict() {
        let plans = vec![plan(1, 7, PlanStatus::Current), plan(2, 7, PlanStatus::Current)];
        assert_matches!(current_plan(&plans, 7), Err(CoreError::Conflict(_)));
    }

    // -- amounts ---------------------------------------------------------

    #[test]
    fn monthly_sda_ignores_stored_cache() {
        assert_eq!(monthly_sda_amount(&plan(1, 1, PlanStatus::Current)), m("5535.92"));
    }

    #[test]
    fn missing_rrc_contributes_zero() {
        let mut p = plan(1, 1, PlanStatus::Current);
        p.reasonable_rent_contribution = None;
        assert_eq!(monthly_rent_contribution(&p), Decimal::ZERO);
    }

    #[test]
    fn rrc_without_frequency_is_monthly() {
        let mut p = plan(1, 1, PlanStatus::Current);
        p.rent_contribution_frequency = None;
        assert_eq!(monthly_rent_contribution(&p), m("381.15"));
    }

    // -- month gating ----------------------------------------------------

    #[test]
    fn plan_counts_from_its_start_month() {
        let p = plan(1, 1, PlanStatus::Current);
        assert!(!plan_active_in_month(&p, YearMonth::new(2024, 6).unwrap()));
        assert!(plan_active_in_month(&p, YearMonth::new(2024, 7).unwrap()));
        assert!(plan_active_in_month(&p, YearMonth::new(2025, 1).unwrap()));
    }

    // -- management fee --------------------------------------------------

    #[test]
    fn fee_prefers_plan_then_property_then_default() {
        let mut p = plan(1, 1, PlanStatus::Current);
        assert_eq!(resolve_management_fee(&p, &property(None), m("5")), m("5"));
        assert_eq!(resolve_management_fee(&p, &property(Some("30")), m("5")), m("30"));
        p.management_fee_percent = Some(m("12.5"));
        assert_eq!(resolve_management_fee(&p, &property(Some("30")), m("5")), m("12.5"));
    }

    // -- expiring_plans --------------------------------------------------

    fn ending(id: DbId, status: PlanStatus, end: Date) -> ParticipantPlan {
        let mut p = plan(id, id, status);
        p.plan_end_date = end;
        p
    }

    #[test]
    fn plans_ending_today_and_at_window_edge_are_expiring() {
        let today = Date::from_ymd_opt(2025, 6, 1).unwrap();
        let plans = vec![
            ending(1, PlanStatus::Current, Date::from_ymd_opt(2025, 7, 1).unwrap()),
            ending(2, PlanStatus::Current, today),
            ending(3, PlanStatus::Current, Date::from_ymd_opt(2025, 7, 2).unwrap()),
            ending(4, PlanStatus::Current, Date::from_ymd_opt(2025, 5, 31).unwrap()),
        ];

        let rows: Vec<(DbId, i64)> = expiring_plans(&plans, today, PLAN_EXPIRY_WARNING_DAYS)
            .iter()
            .map(|e| (e.plan.id, e.days_until_expiry))
            .collect();
        assert_eq!(rows, vec![(2, 0), (1, 30)]);
    }

    #[test]
    fn only_current_plans_can_be_expiring() {
        let today = Date::from_ymd_opt(2025, 6, 1).unwrap();
        let end = Date::from_ymd_opt(2025, 6, 10).unwrap();
        let plans = vec![
            ending(1, PlanStatus::Pending, end),
            ending(2, PlanStatus::Expired, end),
            ending(3, PlanStatus::Current, end),
        ];
        let ids: Vec<DbId> = expiring_plans(&plans, today, 30).iter().map(|e| e.plan.id).collect();
        assert_eq!(ids, vec![3]);
    }
}
