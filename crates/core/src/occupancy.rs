//! Dwelling occupancy derivation.
//!
//! A dwelling's stored `occupancy_status` is a cache of
//! [`derive_occupancy_status`] applied to its occupancy and capacity.

use serde::{Deserialize, Serialize};

use crate::entities::{Dwelling, Participant};
use crate::types::DbId;

pub const OCCUPANCY_VACANT: &str = "vacant";
pub const OCCUPANCY_PARTIALLY_OCCUPIED: &str = "partially_occupied";
pub const OCCUPANCY_FULLY_OCCUPIED: &str = "fully_occupied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    Vacant,
    PartiallyOccupied,
    FullyOccupied,
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vacant => OCCUPANCY_VACANT,
            Self::PartiallyOccupied => OCCUPANCY_PARTIALLY_OCCUPIED,
            Self::FullyOccupied => OCCUPANCY_FULLY_OCCUPIED,
        }
    }
}

/// `Vacant` iff nobody lives there, `FullyOccupied` once occupancy reaches
/// capacity, `PartiallyOccupied` in between.
pub fn derive_occupancy_status(current_occupancy: u32, max_participants: u32) -> OccupancyStatus {
    if current_occupancy == 0 {
        OccupancyStatus::Vacant
    } else if current_occupancy >= max_participants {
        OccupancyStatus::FullyOccupied
    } else {
        OccupancyStatus::PartiallyOccupied
    }
}

/// Occupancy recomputed from the participants actually living in a dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupancySnapshot {
    pub dwelling_id: DbId,
    pub current_occupancy: u32,
    pub occupancy_status: OccupancyStatus,
}

/// Count the dwelling's active participants and derive its status.
pub fn recalculate_occupancy(dwelling: &Dwelling, participants: &[Participant]) -> OccupancySnapshot {
    let current_occupancy = participants
        .iter()
        .filter(|p| p.dwelling_id == dwelling.id && p.is_active())
        .count() as u32;
    OccupancySnapshot {
        dwelling_id: dwelling.id,
        current_occupancy,
        occupancy_status: derive_occupancy_status(current_occupancy, dwelling.max_participants),
    }
}

/// Dwellings whose stored status disagrees with their stored counts.
pub fn stale_occupancy(dwellings: &[Dwelling]) -> Vec<DbId> {
    dwellings
        .iter()
        .filter(|d| {
            d.occupancy_status != derive_occupancy_status(d.current_occupancy, d.max_participants)
        })
        .map(|d| d.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DwellingType, ParticipantStatus, SdaDesignCategory};

    fn dwelling(id: DbId, max: u32, current: u32, status: OccupancyStatus) -> Dwelling {
        Dwelling {
            id,
            property_id: 1,
            dwelling_name: format!("Unit {id}"),
            dwelling_type: DwellingType::Unit,
            sda_design_category: SdaDesignCategory::HighPhysicalSupport,
            max_participants: max,
            current_occupancy: current,
            occupancy_status: status,
            vacancy_date: None,
            is_active: true,
        }
    }

    fn participant(id: DbId, dwelling_id: DbId, status: ParticipantStatus) -> Participant {
        Participant {
            id,
            ndis_number: format!("43000000{id}"),
            first_name: "Test".to_string(),
            last_name: format!("Resident{id}"),
            dwelling_id,
            move_in_date: None,
            status,
        }
    }

    #[test]
    fn zero_occupancy_is_vacant() {
        assert_eq!(derive_occupancy_status(0, 3), OccupancyStatus::Vacant);
    }

    #[test]
    fn below_capacity_is_partial() {
        assert_eq!(derive_occupancy_status(2, 3), OccupancyStatus::PartiallyOccupied);
    }

    #[test]
    fn at_or_over_capacity_is_full() {
        assert_eq!(derive_occupancy_status(3, 3), OccupancyStatus::FullyOccupied);
        assert_eq!(derive_occupancy_status(4, 3), OccupancyStatus::FullyOccupied);
    }

    #[test]
    fn recalculation_counts_only_active_residents_of_that_dwelling() {
        let d = dwelling(10, 2, 0, OccupancyStatus::Vacant);
        let participants = vec![
            participant(1, 10, ParticipantStatus::Active),
            participant(2, 10, ParticipantStatus::PendingMoveIn),
            participant(3, 11, ParticipantStatus::Active),
        ];
        let snap = recalculate_occupancy(&d, &participants);
        assert_eq!(snap.current_occupancy, 1);
        assert_eq!(snap.occupancy_status, OccupancyStatus::PartiallyOccupied);
    }

    #[test]
    fn stale_occupancy_flags_mismatched_cache() {
        let dwellings = vec![
            dwelling(1, 2, 2, OccupancyStatus::FullyOccupied),
            dwelling(2, 2, 0, OccupancyStatus::PartiallyOccupied),
        ];
        assert_eq!(stale_occupancy(&dwellings), vec![2]);
    }
}
