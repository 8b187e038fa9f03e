//! Carving weekly availability windows into bookable slots.
//!
//! A candidate `[t, t + slot_duration)` is dropped when it starts at or
//! before `now`, or when it collides with a blocking appointment. An
//! appointment starting at `a` occupies `[a, a + slot_duration)`, and the
//! candidate is extended by `buffer` on its trailing edge before the test.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{AvailabilityWindow, BookedAppointment, Slot};

/// Slots of one doctor for one date. Holds only the prepared inputs, so every
/// call to [`Slots::iter`] walks the schedule again from the start.
#[derive(Debug, Clone)]
pub struct Slots {
    spans: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    blocked: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    slot_duration: Duration,
    buffer: Duration,
    now: DateTime<Utc>,
}

pub fn generate_slots(
    windows: &[AvailabilityWindow],
    booked: &[BookedAppointment],
    date: NaiveDate,
    slot_duration: Duration,
    buffer: Duration,
    now: DateTime<Utc>,
) -> Slots {
    if slot_duration <= Duration::zero() {
        return Slots::empty(now);
    }

    let mut spans: Vec<_> = windows
        .iter()
        .filter(|w| w.applies_to(date))
        .map(|w| w.span_on(date))
        .filter(|(start, end)| start < end)
        .collect();
    spans.sort();

    let blocked = booked
        .iter()
        .filter(|apt| apt.status.blocks_slot())
        .filter_map(|apt| {
            apt.start_time
                .checked_add_signed(slot_duration)
                .map(|end| (apt.start_time, end))
        })
        .collect();

    Slots {
        spans,
        blocked,
        slot_duration,
        buffer: buffer.max(Duration::zero()),
        now,
    }
}

impl Slots {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            spans: Vec::new(),
            blocked: Vec::new(),
            slot_duration: Duration::zero(),
            buffer: Duration::zero(),
            now,
        }
    }

    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            slots: self,
            cursors: self.spans.iter().map(|(start, _)| Some(*start)).collect(),
            last_start: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn is_free(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start <= self.now {
            return false;
        }

        let padded_end = end.checked_add_signed(self.buffer).unwrap_or(DateTime::<Utc>::MAX_UTC);
        !self
            .blocked
            .iter()
            .any(|&(apt_start, apt_end)| collides(start, padded_end, apt_start, apt_end))
    }
}

fn collides(
    start: DateTime<Utc>,
    padded_end: DateTime<Utc>,
    apt_start: DateTime<Utc>,
    apt_end: DateTime<Utc>,
) -> bool {
    !(padded_end <= apt_start || start >= apt_end)
}

impl<'a> IntoIterator for &'a Slots {
    type Item = Slot;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks every window in parallel and always yields the earliest pending
/// candidate, so output stays chronological even for overlapping windows.
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    slots: &'a Slots,
    cursors: Vec<Option<DateTime<Utc>>>,
    last_start: Option<DateTime<Utc>>,
}

impl SlotIter<'_> {
    /// Index of the window whose next candidate starts first and still fits.
    fn earliest_cursor(&mut self) -> Option<(usize, DateTime<Utc>, DateTime<Utc>)> {
        let mut best: Option<(usize, DateTime<Utc>, DateTime<Utc>)> = None;

        for (idx, cursor) in self.cursors.iter_mut().enumerate() {
            let Some(start) = *cursor else { continue };
            let window_end = self.slots.spans[idx].1;

            match start.checked_add_signed(self.slots.slot_duration) {
                Some(end) if end <= window_end => {
                    if best.map_or(true, |(_, best_start, _)| start < best_start) {
                        best = Some((idx, start, end));
                    }
                }
                // Remaining time in this window is shorter than a slot.
                _ => *cursor = None,
            }
        }

        best
    }
}

impl Iterator for SlotIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        loop {
            let (idx, start, end) = self.earliest_cursor()?;
            self.cursors[idx] = Some(end);

            if self.last_start == Some(start) {
                continue;
            }
            self.last_start = Some(start);

            if self.slots.is_free(start, end) {
                return Some(Slot {
                    start_time: start,
                    end_time: end,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use shared_models::AppointmentStatus;
    use uuid::Uuid;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&monday().and_hms_opt(h, m, 0).unwrap())
    }

    fn window(day: i32, start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
        AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: Uuid::nil(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            is_available: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn booking(h: u32, m: u32, status: AppointmentStatus) -> BookedAppointment {
        BookedAppointment {
            doctor_id: Uuid::nil(),
            start_time: at(h, m),
            status,
        }
    }

    fn early() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn starts(slots: &Slots) -> Vec<DateTime<Utc>> {
        slots.iter().map(|s| s.start_time).collect()
    }

    #[test]
    fn test_one_hour_window_yields_two_half_hour_slots() {
        let windows = vec![window(1, (9, 0), (10, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::minutes(10), early());

        let collected: Vec<Slot> = slots.iter().collect();
        assert_eq!(
            collected,
            vec![
                Slot { start_time: at(9, 0), end_time: at(9, 30) },
                Slot { start_time: at(9, 30), end_time: at(10, 0) },
            ]
        );
    }

    #[test]
    fn test_partial_trailing_slot_is_not_emitted() {
        let windows = vec![window(1, (9, 0), (10, 20))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());

        assert_eq!(starts(&slots), vec![at(9, 0), at(9, 30)]);
    }

    #[test]
    fn test_booking_blocks_its_slot_without_buffer() {
        let windows = vec![window(1, (9, 0), (10, 0))];
        let booked = vec![booking(9, 30, AppointmentStatus::Confirmed)];
        let slots = generate_slots(&windows, &booked, monday(), Duration::minutes(30), Duration::zero(), early());

        assert_eq!(starts(&slots), vec![at(9, 0)]);
    }

    #[test]
    fn test_trailing_buffer_also_blocks_the_preceding_slot() {
        let windows = vec![window(1, (9, 0), (10, 0))];
        let booked = vec![booking(9, 30, AppointmentStatus::Pending)];
        let slots = generate_slots(&windows, &booked, monday(), Duration::minutes(30), Duration::minutes(10), early());

        assert!(slots.is_empty());
    }

    #[test]
    fn test_buffer_does_not_apply_before_the_candidate() {
        // A booking at 09:00 ends at 09:30; the 09:30 candidate is still free.
        let windows = vec![window(1, (9, 0), (10, 0))];
        let booked = vec![booking(9, 0, AppointmentStatus::Confirmed)];
        let slots = generate_slots(&windows, &booked, monday(), Duration::minutes(30), Duration::minutes(10), early());

        assert_eq!(starts(&slots), vec![at(9, 30)]);
    }

    #[test]
    fn test_cancelled_bookings_do_not_block() {
        let windows = vec![window(1, (9, 0), (10, 0))];
        let booked = vec![
            booking(9, 0, AppointmentStatus::Cancelled),
            booking(9, 30, AppointmentStatus::NoShow),
        ];
        let slots = generate_slots(&windows, &booked, monday(), Duration::minutes(30), Duration::minutes(10), early());

        assert_eq!(starts(&slots), vec![at(9, 0), at(9, 30)]);
    }

    #[test]
    fn test_past_and_current_slots_are_excluded() {
        let windows = vec![window(1, (9, 0), (11, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), at(9, 30));

        assert_eq!(starts(&slots), vec![at(10, 0), at(10, 30)]);
    }

    #[test]
    fn test_other_weekdays_are_ignored() {
        let windows = vec![window(2, (9, 0), (10, 0)), window(0, (9, 0), (10, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());

        assert!(slots.is_empty());
    }

    #[test]
    fn test_windows_are_merged_in_chronological_order() {
        let windows = vec![window(1, (14, 0), (15, 0)), window(1, (9, 0), (10, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());

        assert_eq!(starts(&slots), vec![at(9, 0), at(9, 30), at(14, 0), at(14, 30)]);
    }

    #[test]
    fn test_overlapping_windows_stay_sorted_without_duplicates() {
        let windows = vec![window(1, (9, 0), (10, 0)), window(1, (9, 0), (11, 0)), window(1, (9, 15), (10, 15))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());

        assert_eq!(
            starts(&slots),
            vec![at(9, 0), at(9, 15), at(9, 30), at(9, 45), at(10, 0), at(10, 30)]
        );
    }

    #[test]
    fn test_malformed_inputs_yield_nothing() {
        let windows = vec![window(1, (10, 0), (9, 0))];
        let inverted = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());
        assert!(inverted.is_empty());

        let ok_windows = vec![window(1, (9, 0), (10, 0))];
        let zero = generate_slots(&ok_windows, &[], monday(), Duration::zero(), Duration::zero(), early());
        assert!(zero.is_empty());

        let negative = generate_slots(&ok_windows, &[], monday(), Duration::minutes(-30), Duration::zero(), early());
        assert!(negative.is_empty());

        let none = generate_slots(&[], &[], monday(), Duration::minutes(30), Duration::zero(), early());
        assert!(none.is_empty());
    }

    #[test]
    fn test_window_ending_at_midnight_runs_to_end_of_day() {
        let windows = vec![window(1, (22, 0), (0, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), early());

        let collected: Vec<Slot> = slots.iter().collect();
        assert_eq!(collected.len(), 4);
        assert_eq!(collected[0].start_time, at(22, 0));
        assert_eq!(collected[3].end_time, at(23, 30) + Duration::minutes(30));
    }

    #[test]
    fn test_negative_buffer_is_treated_as_zero() {
        let windows = vec![window(1, (9, 0), (10, 0))];
        let booked = vec![booking(9, 30, AppointmentStatus::Confirmed)];
        let slots = generate_slots(&windows, &booked, monday(), Duration::minutes(30), Duration::minutes(-30), early());

        assert_eq!(starts(&slots), vec![at(9, 0)]);
    }

    #[test]
    fn test_iteration_is_restartable_and_lazy() {
        let windows = vec![window(1, (8, 0), (18, 0))];
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(15), Duration::zero(), early());

        let mut first = slots.iter();
        assert_eq!(first.next().map(|s| s.start_time), Some(at(8, 0)));

        assert_eq!(slots.iter().count(), 40);
        assert_eq!((&slots).into_iter().count(), 40);
        assert_eq!(first.next().map(|s| s.start_time), Some(at(8, 15)));
    }
}
