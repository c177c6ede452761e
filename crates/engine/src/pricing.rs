//! Appointment totals from the service catalog.
//!
//! Every occurrence of a service id is priced on its own, in the given order;
//! repeats are never collapsed. An id missing from the catalog is an error,
//! never a zero.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, Service};

/// Price and duration captured for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub total: Money,
    pub duration_minutes: u32,
}

fn lookup<'a>(catalog: &'a HashMap<Uuid, Service>, id: &Uuid) -> ResultEngine<&'a Service> {
    catalog
        .get(id)
        .ok_or_else(|| EngineError::ReferenceNotFound(format!("service {id}")))
}

/// Sums the current price of every referenced service.
pub fn compute_total(service_ids: &[Uuid], catalog: &HashMap<Uuid, Service>) -> ResultEngine<Money> {
    service_ids.iter().try_fold(Money::ZERO, |acc, id| {
        let service = lookup(catalog, id)?;
        acc.checked_add(service.price)
            .ok_or_else(|| EngineError::OutOfRange("appointment total overflows".to_string()))
    })
}

/// Sums the duration of every referenced service.
pub fn total_duration(service_ids: &[Uuid], catalog: &HashMap<Uuid, Service>) -> ResultEngine<u32> {
    service_ids.iter().try_fold(0u32, |acc, id| {
        let service = lookup(catalog, id)?;
        acc.checked_add(service.duration_minutes)
            .ok_or_else(|| EngineError::OutOfRange("appointment duration overflows".to_string()))
    })
}

pub fn quote(service_ids: &[Uuid], catalog: &HashMap<Uuid, Service>) -> ResultEngine<Quote> {
    Ok(Quote {
        total: compute_total(service_ids, catalog)?,
        duration_minutes: total_duration(service_ids, catalog)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(services: &[&Service]) -> HashMap<Uuid, Service> {
        services.iter().map(|s| (s.id, (*s).clone())).collect()
    }

    #[test]
    fn repeated_service_is_counted_twice() {
        let cut = Service::new("cut".to_string(), Money::new(25_00), 30).unwrap();
        let catalog = catalog(&[&cut]);

        let total = compute_total(&[cut.id, cut.id], &catalog).unwrap();
        assert_eq!(total, Money::new(50_00));
        assert_eq!(total_duration(&[cut.id, cut.id], &catalog).unwrap(), 60);
    }

    #[test]
    fn sum_is_exact() {
        let a = Service::new("wash".to_string(), Money::new(19_99), 15).unwrap();
        let b = Service::new("dye".to_string(), Money::new(120_01), 90).unwrap();
        let catalog = catalog(&[&a, &b]);

        assert_eq!(
            compute_total(&[a.id, b.id], &catalog).unwrap(),
            a.price + b.price
        );
        assert_eq!(
            quote(&[b.id, a.id], &catalog).unwrap(),
            Quote {
                total: Money::new(140_00),
                duration_minutes: 105,
            }
        );
    }

    #[test]
    fn unknown_service_is_a_hard_error() {
        let cut = Service::new("cut".to_string(), Money::new(25_00), 30).unwrap();
        let catalog = catalog(&[&cut]);
        let missing = Uuid::new_v4();

        assert_eq!(
            compute_total(&[cut.id, missing], &catalog),
            Err(EngineError::ReferenceNotFound(format!("service {missing}")))
        );
    }

    #[test]
    fn empty_list_totals_zero() {
        assert_eq!(compute_total(&[], &HashMap::new()).unwrap(), Money::ZERO);
    }
}
