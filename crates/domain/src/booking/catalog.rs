//! Service catalog types and the customer's service selection.

use std::collections::BTreeSet;

use common::ServiceId;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// A bookable service offered by the shop.
///
/// Sourced from the remote catalog; immutable from the workflow's
/// perspective and fetched once per booking session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique service identifier.
    pub id: ServiceId,

    /// Human-readable service name.
    pub name: String,

    /// Price charged for the service.
    pub price: Money,

    /// How long the service takes, in minutes. Always positive.
    pub duration_minutes: u32,
}

impl Service {
    /// Creates a new service record.
    pub fn new(
        id: ServiceId,
        name: impl Into<String>,
        price: Money,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            duration_minutes,
        }
    }
}

/// The set of services the actor has picked for a booking.
///
/// Selection is a set: picking the same service twice toggles it back off,
/// and order is irrelevant. Combined duration and price are resolved against
/// the catalog the selection was made from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSelection {
    ids: BTreeSet<ServiceId>,
}

impl ServiceSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles a service in the selection.
    ///
    /// Returns true if the service is selected after the call.
    pub fn toggle(&mut self, id: ServiceId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Returns true if the given service is currently selected.
    pub fn contains(&self, id: ServiceId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the number of selected services.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Removes every selected service.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Iterates over the selected service ids.
    pub fn ids(&self) -> impl Iterator<Item = ServiceId> + '_ {
        self.ids.iter().copied()
    }

    /// Resolves the selection against a catalog, skipping unknown ids.
    pub fn resolve<'a>(&self, catalog: &'a [Service]) -> Vec<&'a Service> {
        catalog.iter().filter(|s| self.ids.contains(&s.id)).collect()
    }

    /// Sum of the selected services' durations, in minutes.
    pub fn combined_duration(&self, catalog: &[Service]) -> u32 {
        self.resolve(catalog)
            .iter()
            .map(|s| s.duration_minutes)
            .sum()
    }

    /// Sum of the selected services' prices.
    pub fn combined_price(&self, catalog: &[Service]) -> Money {
        self.resolve(catalog).iter().map(|s| s.price).sum()
    }
}
