// libs/availability-cell/src/services/normalizer.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::Availability;

/// Raw slots grouped by calendar date, one entry per `(startTime, endTime)`
/// on each date, sorted by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSlots {
    by_date: BTreeMap<NaiveDate, Vec<Availability>>,
    open_dates: BTreeSet<NaiveDate>,
}

impl NormalizedSlots {
    pub fn from_slots(slots: &[Availability]) -> Self {
        normalize(slots)
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Dates carrying at least one slot, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.by_date.keys()
    }

    pub fn slots_on(&self, date: NaiveDate) -> &[Availability] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dates with at least one open slot.
    pub fn open_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.open_dates
    }

    pub fn find(&self, availability_id: &str) -> Option<&Availability> {
        self.by_date
            .values()
            .flatten()
            .find(|slot| slot.id == availability_id)
    }
}

pub fn normalize(slots: &[Availability]) -> NormalizedSlots {
    let mut by_date: BTreeMap<NaiveDate, Vec<Availability>> = BTreeMap::new();

    for (date, day_slots) in group_by_date(slots) {
        let mut kept: Vec<Availability> = Vec::with_capacity(day_slots.len());
        let mut index_by_range = HashMap::with_capacity(day_slots.len());

        for slot in day_slots {
            let range = slot.time_range();
            match index_by_range.get(&range).copied() {
                None => {
                    index_by_range.insert(range, kept.len());
                    kept.push(slot);
                }
                // An open slot replaces a booked one with the same range.
                Some(index) if kept[index].is_booked && slot.is_open() => {
                    kept[index] = slot;
                }
                Some(_) => {}
            }
        }

        kept.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.end_time.cmp(&b.end_time)));
        by_date.insert(date, kept);
    }

    let open_dates = by_date
        .iter()
        .filter(|(_, day_slots)| day_slots.iter().any(Availability::is_open))
        .map(|(date, _)| *date)
        .collect();

    NormalizedSlots { by_date, open_dates }
}

/// Plain grouping by `availableDate`, keeping every slot in input order.
pub fn group_by_date(slots: &[Availability]) -> BTreeMap<NaiveDate, Vec<Availability>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Availability>> = BTreeMap::new();
    for slot in slots {
        grouped.entry(slot.available_date).or_default().push(slot.clone());
    }
    grouped
}
