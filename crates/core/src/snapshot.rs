//! Entity read access.
//!
//! [`EntitySnapshot`] is the serde-loadable bundle a host hands over;
//! [`SnapshotStore`] validates it once and answers id lookups through
//! [`EntitySource`], which is all the distribution calculator needs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{
    ComplianceCertification, Dwelling, InsurancePolicy, Owner, Participant, ParticipantPlan,
    PreventativeScheduleEntry, Property,
};
use crate::error::CoreError;
use crate::plans::current_plan;
use crate::types::DbId;

/// Every entity the core reads, as fetched by the host in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(default)]
    pub owners: Vec<Owner>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub dwellings: Vec<Dwelling>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub plans: Vec<ParticipantPlan>,
    #[serde(default)]
    pub insurance_policies: Vec<InsurancePolicy>,
    #[serde(default)]
    pub certifications: Vec<ComplianceCertification>,
    #[serde(default)]
    pub schedules: Vec<PreventativeScheduleEntry>,
}

impl EntitySnapshot {
    /// Validate every record, stopping at the first failure.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.owners.iter().try_for_each(Owner::validate)?;
        self.properties.iter().try_for_each(Property::validate)?;
        self.dwellings.iter().try_for_each(Dwelling::validate)?;
        self.participants.iter().try_for_each(Participant::validate)?;
        self.plans.iter().try_for_each(ParticipantPlan::validate)?;
        self.insurance_policies
            .iter()
            .try_for_each(InsurancePolicy::validate)?;
        self.certifications
            .iter()
            .try_for_each(ComplianceCertification::validate)?;
        self.schedules
            .iter()
            .try_for_each(PreventativeScheduleEntry::validate)?;
        Ok(())
    }
}

/// Read access to the owner -> property -> dwelling -> participant graph.
pub trait EntitySource {
    fn owners(&self) -> &[Owner];
    fn owner(&self, id: DbId) -> Option<&Owner>;
    fn properties_for_owner(&self, owner_id: DbId) -> Vec<&Property>;
    fn property(&self, id: DbId) -> Option<&Property>;
    fn dwelling(&self, id: DbId) -> Option<&Dwelling>;
    fn participants(&self) -> &[Participant];
    fn plans_for_participant(&self, participant_id: DbId) -> Vec<&ParticipantPlan>;
}

/// Unindexed access; fine for small snapshots and tests.
impl EntitySource for EntitySnapshot {
    fn owners(&self) -> &[Owner] {
        &self.owners
    }

    fn owner(&self, id: DbId) -> Option<&Owner> {
        self.owners.iter().find(|o| o.id == id)
    }

    fn properties_for_owner(&self, owner_id: DbId) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .collect()
    }

    fn property(&self, id: DbId) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    fn dwelling(&self, id: DbId) -> Option<&Dwelling> {
        self.dwellings.iter().find(|d| d.id == id)
    }

    fn participants(&self) -> &[Participant] {
        &self.participants
    }

    fn plans_for_participant(&self, participant_id: DbId) -> Vec<&ParticipantPlan> {
        self.plans
            .iter()
            .filter(|p| p.participant_id == participant_id)
            .collect()
    }
}

/// A validated snapshot with id indexes.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: EntitySnapshot,
    owners: HashMap<DbId, usize>,
    properties: HashMap<DbId, usize>,
    dwellings: HashMap<DbId, usize>,
    properties_by_owner: HashMap<DbId, Vec<usize>>,
    plans_by_participant: HashMap<DbId, Vec<usize>>,
}

impl SnapshotStore {
    /// Validate `snapshot` and index it.
    ///
    /// Fails with `InvalidInput` for a malformed record and `Conflict` for
    /// duplicate ids or a participant with more than one current plan.
    pub fn new(snapshot: EntitySnapshot) -> Result<Self, CoreError> {
        snapshot.validate()?;

        let owners = index_by_id(&snapshot.owners, |o| o.id, "owner")?;
        let properties = index_by_id(&snapshot.properties, |p| p.id, "property")?;
        let dwellings = index_by_id(&snapshot.dwellings, |d| d.id, "dwelling")?;
        index_by_id(&snapshot.participants, |p| p.id, "participant")?;
        index_by_id(&snapshot.plans, |p| p.id, "plan")?;

        let properties_by_owner = group_by(&snapshot.properties, |p| p.owner_id);
        let plans_by_participant = group_by(&snapshot.plans, |p| p.participant_id);

        for (&participant_id, positions) in &plans_by_participant {
            current_plan(positions.iter().map(|&i| &snapshot.plans[i]), participant_id)?;
        }

        tracing::debug!(
            owners = snapshot.owners.len(),
            properties = snapshot.properties.len(),
            dwellings = snapshot.dwellings.len(),
            participants = snapshot.participants.len(),
            plans = snapshot.plans.len(),
            "Snapshot indexed"
        );

        Ok(Self {
            snapshot,
            owners,
            properties,
            dwellings,
            properties_by_owner,
            plans_by_participant,
        })
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> EntitySnapshot {
        self.snapshot
    }
}

impl EntitySource for SnapshotStore {
    fn owners(&self) -> &[Owner] {
        &self.snapshot.owners
    }

    fn owner(&self, id: DbId) -> Option<&Owner> {
        self.owners.get(&id).map(|&i| &self.snapshot.owners[i])
    }

    fn properties_for_owner(&self, owner_id: DbId) -> Vec<&Property> {
        self.properties_by_owner
            .get(&owner_id)
            .map(|positions| positions.iter().map(|&i| &self.snapshot.properties[i]).collect())
            .unwrap_or_default()
    }

    fn property(&self, id: DbId) -> Option<&Property> {
        self.properties.get(&id).map(|&i| &self.snapshot.properties[i])
    }

    fn dwelling(&self, id: DbId) -> Option<&Dwelling> {
        self.dwellings.get(&id).map(|&i| &self.snapshot.dwellings[i])
    }

    fn participants(&self) -> &[Participant] {
        &self.snapshot.participants
    }

    fn plans_for_participant(&self, participant_id: DbId) -> Vec<&ParticipantPlan> {
        self.plans_by_participant
            .get(&participant_id)
            .map(|positions| positions.iter().map(|&i| &self.snapshot.plans[i]).collect())
            .unwrap_or_default()
    }
}

fn index_by_id<T>(
    records: &[T],
    id_of: impl Fn(&T) -> DbId,
    entity: &'static str,
) -> Result<HashMap<DbId, usize>, CoreError> {
    let mut index = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let id = id_of(record);
        if index.insert(id, position).is_some() {
            return Err(CoreError::Conflict(format!("Duplicate {entity} id {id}")));
        }
    }
    Ok(index)
}

fn group_by<T>(records: &[T], key_of: impl Fn(&T) -> DbId) -> HashMap<DbId, Vec<usize>> {
    let mut groups: HashMap<DbId, Vec<usize>> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        groups.entry(key_of(record)).or_default().push(position);
    }
    groups
}
