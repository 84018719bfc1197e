// libs/availability-cell/src/services/calendar.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::Availability;
use crate::services::normalizer::NormalizedSlots;

/// One slot as the calendar shows it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub selectable: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub selectable: bool,
    pub open_slots: usize,
    pub slots: Vec<SlotView>,
}

/// Decides which dates and slots a patient may pick.
pub struct CalendarGate<'a> {
    slots: &'a NormalizedSlots,
    today: NaiveDate,
}

impl<'a> CalendarGate<'a> {
    pub fn new(slots: &'a NormalizedSlots, today: NaiveDate) -> Self {
        Self { slots, today }
    }

    pub fn is_selectable(&self, date: NaiveDate) -> bool {
        date >= self.today && self.slots.open_dates().contains(&date)
    }

    pub fn selectable_dates(&self) -> Vec<NaiveDate> {
        self.slots
            .open_dates()
            .range(self.today..)
            .copied()
            .collect()
    }

    /// Every slot on `date`, including booked ones and dates the gate would
    /// not let a patient pick.
    pub fn slots_on(&self, date: NaiveDate) -> Vec<SlotView> {
        let date_selectable = self.is_selectable(date);
        self.slots
            .slots_on(date)
            .iter()
            .map(|slot| SlotView {
                id: slot.id.clone(),
                start_time: slot.start_time,
                end_time: slot.end_time,
                is_booked: slot.is_booked,
                selectable: date_selectable && slot.is_open(),
            })
            .collect()
    }

    pub fn day(&self, date: NaiveDate) -> CalendarDay {
        let slots = self.slots_on(date);
        CalendarDay {
            date,
            selectable: self.is_selectable(date),
            open_slots: slots.iter().filter(|slot| !slot.is_booked).count(),
            slots,
        }
    }

    pub fn calendar(&self) -> Vec<CalendarDay> {
        self.slots.dates().map(|date| self.day(*date)).collect()
    }

    pub fn can_book(&self, slot: &Availability) -> bool {
        slot.is_open() && self.is_selectable(slot.available_date)
    }
}
