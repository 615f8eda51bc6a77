//! Monthly owner distributions.
//!
//! For a target month, each active participant with a current plan
//! produces one row:
//!
//! ```text
//! monthly_sda    = annual_sda_budget / 12
//! monthly_rrc    = rrc normalised to a month (x52/12, x26/12, x1)
//! total_income   = monthly_sda + monthly_rrc
//! management_fee = total_income x fee_percent / 100
//! owner_payment  = total_income - management_fee
//! ```
//!
//! Rows roll up to property, owner and company totals. Every total is the
//! exact sum of its children; rounding to cents is applied only by the
//! `rounded` presentation helpers.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::YearMonth;
use crate::entities::{Owner, Participant, Property};
use crate::error::CoreError;
use crate::money::{percent_of, round_cents};
use crate::plans::{
    current_plan, monthly_rent_contribution, monthly_sda_amount, plan_active_in_month,
    resolve_management_fee,
};
use crate::snapshot::EntitySource;
use crate::types::{Date, DbId, Money};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Whether owners with no billable participants this month are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleOwnerPolicy {
    #[default]
    Omit,
    /// List every active owner, idle ones with zero totals.
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionOptions {
    /// Used when neither the plan nor the property sets a fee.
    pub default_fee_percent: Money,
    pub idle_owners: IdleOwnerPolicy,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            default_fee_percent: Decimal::ZERO,
            idle_owners: IdleOwnerPolicy::Omit,
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantDistribution {
    pub participant_id: DbId,
    pub participant_name: String,
    pub ndis_number: String,
    pub dwelling_id: DbId,
    pub dwelling_name: String,
    pub plan_id: DbId,
    pub management_fee_percent: Money,
    pub monthly_sda: Money,
    pub monthly_rrc: Money,
    pub total_income: Money,
    pub management_fee: Money,
    pub owner_payment: Money,
}

impl ParticipantDistribution {
    pub fn rounded(&self) -> Self {
        Self {
            monthly_sda: round_cents(self.monthly_sda),
            monthly_rrc: round_cents(self.monthly_rrc),
            total_income: round_cents(self.total_income),
            management_fee: round_cents(self.management_fee),
            owner_payment: round_cents(self.owner_payment),
            ..self.clone()
        }
    }
}

/// The five aggregate columns shared by every roll-up level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DistributionTotals {
    pub total_sda: Money,
    pub total_rrc: Money,
    pub total_income: Money,
    pub total_management_fee: Money,
    pub total_owner_payment: Money,
}

impl DistributionTotals {
    pub fn add_participant(&mut self, row: &ParticipantDistribution) {
        self.total_sda += row.monthly_sda;
        self.total_rrc += row.monthly_rrc;
        self.total_income += row.total_income;
        self.total_management_fee += row.management_fee;
        self.total_owner_payment += row.owner_payment;
    }

    pub fn add_totals(&mut self, other: &DistributionTotals) {
        self.total_sda += other.total_sda;
        self.total_rrc += other.total_rrc;
        self.total_income += other.total_income;
        self.total_management_fee += other.total_management_fee;
        self.total_owner_payment += other.total_owner_payment;
    }

    /// Each column rounded half-up to cents.
    pub fn rounded(&self) -> Self {
        Self {
            total_sda: round_cents(self.total_sda),
            total_rrc: round_cents(self.total_rrc),
            total_income: round_cents(self.total_income),
            total_management_fee: round_cents(self.total_management_fee),
            total_owner_payment: round_cents(self.total_owner_payment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDistribution {
    pub property_id: DbId,
    pub property_label: String,
    pub participants: Vec<ParticipantDistribution>,
    pub totals: DistributionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerDistribution {
    pub owner_id: DbId,
    pub owner_name: String,
    pub email: String,
    pub properties: Vec<PropertyDistribution>,
    pub totals: DistributionTotals,
}

/// Something in the data worth a human look. The affected participant is
/// still computed (degenerate values) or skipped (missing links).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionWarning {
    MissingLink {
        participant_id: DbId,
        entity: &'static str,
        id: DbId,
    },
    FeeOutOfRange {
        participant_id: DbId,
        management_fee_percent: Money,
    },
    NonPositiveBudget {
        participant_id: DbId,
        plan_id: DbId,
        annual_sda_budget: Money,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub month: YearMonth,
    pub period_start: Date,
    pub period_end: Date,
    pub owners: Vec<OwnerDistribution>,
    pub company_totals: DistributionTotals,
    pub warnings: Vec<DistributionWarning>,
}

impl DistributionReport {
    /// Copy of the report with every amount rounded to cents, for display.
    ///
    /// Rounded totals are rounded sums, not sums of rounded rows, so they
    /// can differ from a manual re-add by a cent.
    pub fn rounded(&self) -> Self {
        let owners = self
            .owners
            .iter()
            .map(|owner| OwnerDistribution {
                properties: owner
                    .properties
                    .iter()
                    .map(|property| PropertyDistribution {
                        participants: property
                            .participants
                            .iter()
                            .map(ParticipantDistribution::rounded)
                            .collect(),
                        totals: property.totals.rounded(),
                        ..property.clone()
                    })
                    .collect(),
                totals: owner.totals.rounded(),
                ..owner.clone()
            })
            .collect();
        Self {
            owners,
            company_totals: self.company_totals.rounded(),
            ..self.clone()
        }
    }

    pub fn participant_count(&self) -> usize {
        self.owners
            .iter()
            .flat_map(|o| &o.properties)
            .map(|p| p.participants.len())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

struct SortedRow {
    key: (String, String, DbId),
    row: ParticipantDistribution,
}

/// Compute the distribution report for `month`.
///
/// Participants that are not active, have no current plan, or whose plan
/// starts after `month` are left out silently. Missing links skip the
/// participant with a warning. Only a broken snapshot invariant (two
/// current plans) fails the whole report.
pub fn calculate_distributions(
    source: &impl EntitySource,
    month: YearMonth,
    options: &DistributionOptions,
) -> Result<DistributionReport, CoreError> {
    let mut warnings = Vec::new();
    let mut rows_by_property: HashMap<DbId, Vec<SortedRow>> = HashMap::new();
    let mut billing_owners: HashSet<DbId> = HashSet::new();

    for participant in source.participants() {
        if !participant.is_active() {
            continue;
        }
        let Some(plan) = current_plan(source.plans_for_participant(participant.id), participant.id)?
        else {
            tracing::debug!(participant_id = participant.id, "No current plan, excluded");
            continue;
        };
        if !plan_active_in_month(plan, month) {
            tracing::debug!(
                participant_id = participant.id,
                plan_id = plan.id,
                %month,
                "Plan starts after target month, excluded"
            );
            continue;
        }

        let Some(dwelling) = source.dwelling(participant.dwelling_id) else {
            warnings.push(missing_link(participant, "dwelling", participant.dwelling_id));
            continue;
        };
        let Some(property) = source.property(dwelling.property_id) else {
            warnings.push(missing_link(participant, "property", dwelling.property_id));
            continue;
        };
        if source.owner(property.owner_id).is_none() {
            warnings.push(missing_link(participant, "owner", property.owner_id));
            continue;
        }

        let fee_percent = resolve_management_fee(plan, property, options.default_fee_percent);
        if fee_percent < Decimal::ZERO || fee_percent > Decimal::ONE_HUNDRED {
            tracing::warn!(participant_id = participant.id, %fee_percent, "Management fee outside 0-100%");
            warnings.push(DistributionWarning::FeeOutOfRange {
                participant_id: participant.id,
                management_fee_percent: fee_percent,
            });
        }
        if plan.annual_sda_budget <= Decimal::ZERO {
            tracing::warn!(
                participant_id = participant.id,
                plan_id = plan.id,
                budget = %plan.annual_sda_budget,
                "Non-positive annual SDA budget"
            );
            warnings.push(DistributionWarning::NonPositiveBudget {
                participant_id: participant.id,
                plan_id: plan.id,
                annual_sda_budget: plan.annual_sda_budget,
            });
        }

        let monthly_sda = monthly_sda_amount(plan);
        let monthly_rrc = monthly_rent_contribution(plan);
        let total_income = monthly_sda + monthly_rrc;
        let management_fee = percent_of(total_income, fee_percent);

        rows_by_property
            .entry(property.id)
            .or_default()
            .push(SortedRow {
                key: name_key(participant),
                row: ParticipantDistribution {
                    participant_id: participant.id,
                    participant_name: participant.full_name(),
                    ndis_number: participant.ndis_number.clone(),
                    dwelling_id: dwelling.id,
                    dwelling_name: dwelling.dwelling_name.clone(),
                    plan_id: plan.id,
                    management_fee_percent: fee_percent,
                    monthly_sda,
                    monthly_rrc,
                    total_income,
                    management_fee,
                    owner_payment: total_income - management_fee,
                },
            });
        billing_owners.insert(property.owner_id);
    }

    let mut owners: Vec<&Owner> = source
        .owners()
        .iter()
        .filter(|o| {
            billing_owners.contains(&o.id)
                || (options.idle_owners == IdleOwnerPolicy::Include && o.is_active)
        })
        .collect();
    owners.sort_by_cached_key(|o| (o.display_name().to_lowercase(), o.id));

    let mut company_totals = DistributionTotals::default();
    let owners: Vec<OwnerDistribution> = owners
        .into_iter()
        .map(|owner| {
            let owner_report = owner_distribution(source, owner, &mut rows_by_property);
            company_totals.add_totals(&owner_report.totals);
            owner_report
        })
        .collect();

    tracing::info!(
        %month,
        owners = owners.len(),
        warnings = warnings.len(),
        total_income = %company_totals.total_income,
        "Distribution calculated"
    );

    Ok(DistributionReport {
        month,
        period_start: month.first_day(),
        period_end: month.last_day(),
        owners,
        company_totals,
        warnings,
    })
}

fn owner_distribution(
    source: &impl EntitySource,
    owner: &Owner,
    rows_by_property: &mut HashMap<DbId, Vec<SortedRow>>,
) -> OwnerDistribution {
    let mut properties: Vec<&Property> = source
        .properties_for_owner(owner.id)
        .into_iter()
        .filter(|p| p.is_active || rows_by_property.contains_key(&p.id))
        .collect();
    properties.sort_by_cached_key(|p| (p.label().to_lowercase(), p.id));

    let mut totals = DistributionTotals::default();
    let properties: Vec<PropertyDistribution> = properties
        .into_iter()
        .map(|property| {
            let mut rows = rows_by_property.remove(&property.id).unwrap_or_default();
            rows.sort_by(|a, b| a.key.cmp(&b.key));

            let mut property_totals = DistributionTotals::default();
            let participants: Vec<ParticipantDistribution> = rows
                .into_iter()
                .map(|sorted| {
                    property_totals.add_participant(&sorted.row);
                    sorted.row
                })
                .collect();
            totals.add_totals(&property_totals);

            PropertyDistribution {
                property_id: property.id,
                property_label: property.label(),
                participants,
                totals: property_totals,
            }
        })
        .collect();

    OwnerDistribution {
        owner_id: owner.id,
        owner_name: owner.display_name(),
        email: owner.email.clone(),
        properties,
        totals,
    }
}

fn name_key(participant: &Participant) -> (String, String, DbId) {
    (
        participant.last_name.trim().to_lowercase(),
        participant.first_name.trim().to_lowercase(),
        participant.id,
    )
}

fn missing_link(participant: &Participant, entity: &'static str, id: DbId) -> DistributionWarning {
    tracing::warn!(participant_id = participant.id, entity, id, "Dangling link, participant skipped");
    DistributionWarning::MissingLink {
        participant_id: participant.id,
        entity,
        id,
    }
}
