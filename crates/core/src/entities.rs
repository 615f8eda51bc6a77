//! Typed entity records consumed by the core.
//!
//! These are read-only snapshots of what the host application stores.
//! Each record can [`validate`](Owner::validate) itself so malformed data
//! is rejected at the boundary instead of leaking into calculations.

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceStatus;
use crate::error::CoreError;
use crate::money::RentFrequency;
use crate::occupancy::OccupancyStatus;
use crate::recurrence::{Frequency, FrequencyType, ScheduleCategory};
use crate::types::{Date, DbId, Money};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Legal form of a property owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Individual,
    Company,
    Trust,
    #[serde(rename = "self")]
    SelfOwned,
}

/// Whether a property is held by an investor or by the provider itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipType {
    Investor,
    SelfOwned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellingType {
    House,
    Villa,
    Apartment,
    Unit,
}

/// SDA design category the dwelling is enrolled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdaDesignCategory {
    ImprovedLiveability,
    FullyAccessible,
    Robust,
    HighPhysicalSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Inactive,
    PendingMoveIn,
    MovedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Current,
    Expired,
    Pending,
}

/// Who manages the participant's NDIS funding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingManagementType {
    NdiaManaged,
    PlanManaged,
    SelfManaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    PublicLiability,
    ProfessionalIndemnity,
    Building,
    Contents,
    WorkersCompensation,
    Cyber,
    DirectorsOfficers,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationType {
    NdisPracticeStandards,
    NdisVerificationAudit,
    SdaDesignStandard,
    SdaRegistration,
    NdisWorkerScreening,
    FireSafety,
    BuildingCompliance,
    Other,
}

// ---------------------------------------------------------------------------
// Owners, properties, dwellings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: DbId,
    pub owner_type: OwnerType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl Owner {
    /// Name shown on statements: the company name for companies and
    /// trusts, otherwise the person's name. Falls back to the email.
    pub fn display_name(&self) -> String {
        let company = self.company_name.as_deref().map(str::trim).unwrap_or("");
        let person = join_names(self.first_name.as_deref(), self.last_name.as_deref());

        let preferred = match self.owner_type {
            OwnerType::Company | OwnerType::Trust => [company, person.as_str()],
            OwnerType::Individual | OwnerType::SelfOwned => [person.as_str(), company],
        };
        let name = preferred
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.email.clone());
        name
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.email.contains('@') {
            return Err(CoreError::InvalidInput(format!(
                "Owner {}: email '{}' is not a valid address",
                self.id, self.email
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: DbId,
    pub owner_id: DbId,
    pub property_name: Option<String>,
    pub address_line1: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub ownership_type: OwnershipType,
    /// Percentage of gross income kept as a management fee (0-100).
    pub management_fee_percent: Option<Money>,
    pub is_active: bool,
}

impl Property {
    /// The property's name if it has one, otherwise its street address.
    pub fn label(&self) -> String {
        match self.property_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}, {}", self.address_line1.trim(), self.suburb.trim()),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.address_line1.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "Property {}: address must not be empty",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dwelling {
    pub id: DbId,
    pub property_id: DbId,
    pub dwelling_name: String,
    pub dwelling_type: DwellingType,
    pub sda_design_category: SdaDesignCategory,
    pub max_participants: u32,
    pub current_occupancy: u32,
    /// Cached value of [`crate::occupancy::derive_occupancy_status`].
    pub occupancy_status: OccupancyStatus,
    pub vacancy_date: Option<Date>,
    pub is_active: bool,
}

impl Dwelling {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_participants == 0 {
            return Err(CoreError::InvalidInput(format!(
                "Dwelling {}: max participants must be at least 1",
                self.id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Participants and plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: DbId,
    pub ndis_number: String,
    pub first_name: String,
    pub last_name: String,
    pub dwelling_id: DbId,
    pub move_in_date: Option<Date>,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn full_name(&self) -> String {
        join_names(Some(&self.first_name), Some(&self.last_name))
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ndis_number.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "Participant {}: NDIS number must not be empty",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantPlan {
    pub id: DbId,
    pub participant_id: DbId,
    pub plan_start_date: Date,
    pub plan_end_date: Date,
    pub plan_status: PlanStatus,
    pub funding_management_type: FundingManagementType,
    pub annual_sda_budget: Money,
    /// Stored copy of `annual_sda_budget / 12`. Never read by calculations.
    pub monthly_sda_amount: Option<Money>,
    pub reasonable_rent_contribution: Option<Money>,
    pub rent_contribution_frequency: Option<RentFrequency>,
    /// Per-participant override of the property's management fee.
    pub management_fee_percent: Option<Money>,
}

impl ParticipantPlan {
    pub fn is_current(&self) -> bool {
        self.plan_status == PlanStatus::Current
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.plan_end_date < self.plan_start_date {
            return Err(CoreError::InvalidInput(format!(
                "Plan {}: end date {} is before start date {}",
                self.id, self.plan_end_date, self.plan_start_date
            )));
        }
        if let Some(rrc) = self.reasonable_rent_contribution {
            if rrc.is_sign_negative() {
                return Err(CoreError::InvalidInput(format!(
                    "Plan {}: rent contribution must not be negative",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Time-bounded compliance records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub id: DbId,
    pub insurance_type: InsuranceType,
    pub policy_name: String,
    pub insurer: String,
    pub policy_number: String,
    pub coverage_amount: Money,
    pub property_id: Option<DbId>,
    #[serde(default)]
    pub is_organization_wide: bool,
    pub start_date: Date,
    pub end_date: Date,
    /// Cached status; refreshed by the sweep.
    pub status: ComplianceStatus,
}

impl InsurancePolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.end_date < self.start_date {
            return Err(CoreError::InvalidInput(format!(
                "Insurance policy {}: end date {} is before start date {}",
                self.id, self.end_date, self.start_date
            )));
        }
        if self.coverage_amount.is_sign_negative() {
            return Err(CoreError::InvalidInput(format!(
                "Insurance policy {}: coverage amount must not be negative",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCertification {
    pub id: DbId,
    pub certification_type: CertificationType,
    pub certification_name: String,
    pub property_id: Option<DbId>,
    pub dwelling_id: Option<DbId>,
    #[serde(default)]
    pub is_organization_wide: bool,
    pub issue_date: Date,
    pub expiry_date: Date,
    /// Cached status; refreshed by the sweep.
    pub status: ComplianceStatus,
}

impl ComplianceCertification {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.expiry_date < self.issue_date {
            return Err(CoreError::InvalidInput(format!(
                "Certification {}: expiry date {} is before issue date {}",
                self.id, self.expiry_date, self.issue_date
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Preventative maintenance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreventativeScheduleEntry {
    pub id: DbId,
    pub property_id: DbId,
    pub dwelling_id: Option<DbId>,
    pub task_name: String,
    pub description: Option<String>,
    pub category: ScheduleCategory,
    pub frequency_type: FrequencyType,
    /// Multiplier on the base frequency. Must be at least 1.
    pub frequency_interval: i32,
    pub last_completed_date: Option<Date>,
    pub next_due_date: Date,
    pub contractor_name: Option<String>,
    pub is_active: bool,
}

impl PreventativeScheduleEntry {
    pub fn frequency(&self) -> Result<Frequency, CoreError> {
        Frequency::new(self.frequency_type, self.frequency_interval)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.frequency().map(|_| ()).map_err(|e| match e {
            CoreError::InvalidInput(msg) => CoreError::InvalidInput(format!("Schedule {}: {msg}", self.id)),
            other => other,
        })
    }
}

fn join_names(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(owner_type: OwnerType) -> Owner {
        Owner {
            id: 1,
            owner_type,
            first_name: Some("Anne".to_string()),
            last_name: Some("Marie".to_string()),
            company_name: Some("Harbour Holdings Pty Ltd".to_string()),
            email: "anne@example.com".to_string(),
            phone: None,
            is_active: true,
        }
    }

    // -- Owner -----------------------------------------------------------

    #[test]
    fn company_owner_displays_company_name() {
        assert_eq!(owner(OwnerType::Company).display_name(), "Harbour Holdings Pty Ltd");
        assert_eq!(owner(OwnerType::Trust).display_name(), "Harbour Holdings Pty Ltd");
    }

    #[test]
    fn individual_owner_displays_person_name() {
        assert_eq!(owner(OwnerType::Individual).display_name(), "Anne Marie");
    }

    #[test]
    fn owner_without_names_falls_back_to_email() {
        let mut o = owner(OwnerType::Company);
        o.company_name = None;
        o.first_name = None;
        o.last_name = Some("  ".to_string());
        assert_eq!(o.display_name(), "anne@example.com");
    }

    #[test]
    fn company_owner_without_company_name_uses_person() {
        let mut o = owner(OwnerType::Trust);
        o.company_name = Some("   ".to_string());
        assert_eq!(o.display_name(), "Anne Marie");
    }

    #[test]
    fn owner_requires_plausible_email() {
        let mut o = owner(OwnerType::Individual);
        assert!(o.validate().is_ok());
        o.email = "nobody".to_string();
        assert!(o.validate().is_err());
    }

    #[test]
    fn owner_type_self_uses_reserved_word() {
        let parsed: OwnerType = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(parsed, OwnerType::SelfOwned);
    }

    // -- Property --------------------------------------------------------

    #[test]
    fn property_label_prefers_name() {
        let mut p = Property {
            id: 3,
            owner_id: 1,
            property_name: Some("Banksia House".to_string()),
            address_line1: "12 Wattle St".to_string(),
            suburb: "Newtown".to_string(),
            state: "NSW".to_string(),
            postcode: "2042".to_string(),
            ownership_type: OwnershipType::Investor,
            management_fee_percent: None,
            is_active: true,
        };
        assert_eq!(p.label(), "Banksia House");
        p.property_name = Some(String::new());
        assert_eq!(p.label(), "12 Wattle St, Newtown");
    }

    // -- Plans -----------------------------------------------------------

    #[test]
    fn plan_end_before_start_is_invalid() {
        let plan = ParticipantPlan {
            id: 9,
            participant_id: 4,
            plan_start_date: Date::from_ymd_opt(2025, 7, 1).unwrap(),
            plan_end_date: Date::from_ymd_opt(2025, 6, 30).unwrap(),
            plan_status: PlanStatus::Current,
            funding_management_type: FundingManagementType::NdiaManaged,
            annual_sda_budget: Money::from(60_000),
            monthly_sda_amount: None,
            reasonable_rent_contribution: None,
            rent_contribution_frequency: None,
            management_fee_percent: None,
        };
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("before start date"));
    }

    // -- Schedules -------------------------------------------------------

    #[test]
    fn schedule_with_zero_interval_names_the_schedule_once() {
        let entry = PreventativeScheduleEntry {
            id: 1,
            property_id: 2,
            dwelling_id: None,
            task_name: "Smoke alarm test".to_string(),
            description: None,
            category: ScheduleCategory::Safety,
            frequency_type: FrequencyType::Monthly,
            frequency_interval: 0,
            last_completed_date: None,
            next_due_date: Date::from_ymd_opt(2025, 2, 1).unwrap(),
            contractor_name: None,
            is_active: true,
        };
        let message = entry.validate().unwrap_err().to_string();
        assert!(message.starts_with("Invalid input: Schedule 1: "));
        assert_eq!(message.matches("Invalid input").count(), 1);
    }

    #[test]
    fn participant_full_name_trims() {
        let p = Participant {
            id: 1,
            ndis_number: "430000001".to_string(),
            first_name: " Josh ".to_string(),
            last_name: "Ross".to_string(),
            dwelling_id: 2,
            move_in_date: None,
            status: ParticipantStatus::PendingMoveIn,
        };
        assert_eq!(p.full_name(), "Josh Ross");
        assert!(!p.is_active());
    }
}
