//! Circulation events
//!
//! Upstream feeds report changes to a title's availability as discrete
//! events. Applying an event to the catalog locates (or creates) the keyed
//! license pool and adjusts its counts. Event application is the only
//! mutation path for circulation state.

use chrono::{DateTime, Utc};
use collate_domain::{DataSourceName, ForeignId};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, PoolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CirculationEventType {
    LicenseAdd,
    LicenseRemove,
    CheckOut,
    CheckIn,
    HoldPlace,
    HoldRelease,
    AvailabilityNotify,
}

/// One circulation change reported by a licensing source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CirculationEvent {
    pub source: DataSourceName,
    pub identifier: ForeignId,
    pub event_type: CirculationEventType,
    pub old_value: i64,
    pub new_value: i64,
    pub start: DateTime<Utc>,
}

impl CirculationEvent {
    pub fn delta(&self) -> i64 {
        self.new_value - self.old_value
    }
}

/// Apply an event to its license pool, creating the pool if this is the
/// first event for the title. Returns the pool and whether it was created.
pub fn apply_event(
    catalog: &mut Catalog,
    event: &CirculationEvent,
) -> Result<(PoolId, bool), CatalogError> {
    let (pool_id, was_new) = catalog.pool_for_foreign_id(
        event.source,
        event.identifier.id_type,
        &event.identifier.value,
    )?;
    let pool = catalog.pool_mut(pool_id)?;
    match event.event_type {
        CirculationEventType::LicenseAdd => {
            pool.licenses_owned = event.new_value;
            pool.licenses_available += event.delta();
        }
        CirculationEventType::LicenseRemove => {
            pool.licenses_owned = event.new_value;
            pool.licenses_available = (pool.licenses_available + event.delta()).max(0);
        }
        CirculationEventType::CheckOut | CirculationEventType::CheckIn => {
            // A check-in can leave availability and the hold queue briefly
            // inconsistent; an AvailabilityNotify follows to reserve the
            // copy for the next patron.
            pool.licenses_available = event.new_value;
        }
        CirculationEventType::HoldPlace | CirculationEventType::HoldRelease => {
            pool.patrons_in_hold_queue = event.new_value;
        }
        CirculationEventType::AvailabilityNotify => {
            let delta = event.delta();
            pool.licenses_available = (pool.licenses_available - delta).max(0);
            pool.licenses_reserved += delta;
            pool.patrons_in_hold_queue = (pool.patrons_in_hold_queue - delta).max(0);
        }
    }
    Ok((pool_id, was_new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_domain::IdentifierType;

    fn event(
        event_type: CirculationEventType,
        old_value: i64,
        new_value: i64,
    ) -> CirculationEvent {
        CirculationEvent {
            source: DataSourceName::ThreeM,
            identifier: ForeignId::new(IdentifierType::ThreemId, "a1d45"),
            event_type,
            old_value,
            new_value,
            start: Utc::now(),
        }
    }

    #[test]
    fn new_title_from_license_add() {
        let mut catalog = Catalog::new();
        let e = CirculationEvent {
            source: DataSourceName::Overdrive,
            identifier: ForeignId::new(IdentifierType::OverdriveId, "{1-2-3}"),
            event_type: CirculationEventType::LicenseAdd,
            old_value: 0,
            new_value: 2,
            start: Utc::now(),
        };
        let (pool_id, was_new) = apply_event(&mut catalog, &e).unwrap();
        assert!(was_new);
        let pool = catalog.pool(pool_id).unwrap();
        assert_eq!(DataSourceName::Overdrive, pool.source);
        assert_eq!(2, pool.licenses_owned);
    }

    #[test]
    fn event_round_trips_through_json() {
        let e = event(CirculationEventType::CheckOut, 3, 2);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"CheckOut\""));
        let back: CirculationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(e.event_type, back.event_type);
        assert_eq!(e.identifier, back.identifier);
        assert_eq!(-1, back.delta());
    }

    #[test]
    fn event_keyed_to_wrong_identifier_type_is_rejected() {
        let mut catalog = Catalog::new();
        let e = CirculationEvent {
            source: DataSourceName::Overdrive,
            identifier: ForeignId::new(IdentifierType::Isbn, "9780000000000"),
            event_type: CirculationEventType::LicenseAdd,
            old_value: 0,
            new_value: 1,
            start: Utc::now(),
        };
        assert!(apply_event(&mut catalog, &e).is_err());
    }

    #[test]
    fn full_circulation_sequence() {
        let mut catalog = Catalog::new();

        // A new title, ten copies.
        let (pool_id, _) = apply_event(
            &mut catalog,
            &event(CirculationEventType::LicenseAdd, 0, 10),
        )
        .unwrap();
        assert_eq!(10, catalog.pool(pool_id).unwrap().licenses_available);

        // All ten get checked out.
        apply_event(&mut catalog, &event(CirculationEventType::CheckOut, 10, 0)).unwrap();
        assert_eq!(0, catalog.pool(pool_id).unwrap().licenses_available);

        // Three patrons place holds.
        apply_event(&mut catalog, &event(CirculationEventType::HoldPlace, 0, 3)).unwrap();
        let pool = catalog.pool(pool_id).unwrap();
        assert_eq!(0, pool.licenses_available);
        assert_eq!(3, pool.patrons_in_hold_queue);

        // One leaves the queue.
        apply_event(
            &mut catalog,
            &event(CirculationEventType::HoldRelease, 3, 2),
        )
        .unwrap();
        assert_eq!(2, catalog.pool(pool_id).unwrap().patrons_in_hold_queue);

        // A copy comes back: briefly inconsistent with the hold queue.
        apply_event(&mut catalog, &event(CirculationEventType::CheckIn, 0, 1)).unwrap();
        let pool = catalog.pool(pool_id).unwrap();
        assert_eq!(1, pool.licenses_available);
        assert_eq!(2, pool.patrons_in_hold_queue);

        // The next patron in the queue gets the reserved copy.
        apply_event(
            &mut catalog,
            &event(CirculationEventType::AvailabilityNotify, 0, 1),
        )
        .unwrap();
        let pool = catalog.pool(pool_id).unwrap();
        assert_eq!(0, pool.licenses_available);
        assert_eq!(1, pool.licenses_reserved);
        assert_eq!(1, pool.patrons_in_hold_queue);
    }
}
