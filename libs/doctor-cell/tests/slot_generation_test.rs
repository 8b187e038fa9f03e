use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use doctor_cell::models::{AvailabilityWindow, BookedAppointment, Slot};
use doctor_cell::services::generate_slots;
use shared_models::AppointmentStatus;
use shared_utils::test_utils::{at, hm, long_ago, monday};

fn window(start: NaiveTime, end: NaiveTime) -> AvailabilityWindow {
    AvailabilityWindow {
        id: Uuid::new_v4(),
        doctor_id: Uuid::nil(),
        day_of_week: 1,
        start_time: start,
        end_time: end,
        is_available: true,
        created_at: None,
        updated_at: None,
    }
}

fn booking(start: DateTime<Utc>) -> BookedAppointment {
    BookedAppointment {
        doctor_id: Uuid::nil(),
        start_time: start,
        status: AppointmentStatus::Confirmed,
    }
}

fn schedules() -> Vec<Vec<AvailabilityWindow>> {
    vec![
        vec![window(hm(9, 0), hm(10, 0))],
        vec![window(hm(8, 0), hm(12, 0)), window(hm(13, 0), hm(17, 45))],
        vec![window(hm(7, 10), hm(7, 55)), window(hm(18, 0), hm(20, 0))],
        vec![window(hm(0, 0), hm(23, 59))],
    ]
}

#[test]
fn test_free_schedule_slot_count_matches_window_length() {
    for minutes in [10, 15, 20, 30, 45, 60] {
        let duration = Duration::minutes(minutes);

        for windows in schedules() {
            let slots: Vec<Slot> = generate_slots(&windows, &[], monday(), duration, Duration::minutes(5), long_ago())
                .iter()
                .collect();

            let expected: i64 = windows
                .iter()
                .map(|w| (w.end_time - w.start_time).num_minutes() / minutes)
                .sum();
            assert_eq!(slots.len() as i64, expected, "duration {} windows {:?}", minutes, windows);

            for w in &windows {
                let (start, end) = w.span_on(monday());
                let inside: Vec<&Slot> = slots.iter().filter(|s| s.start_time >= start && s.end_time <= end).collect();

                // Contiguous from the window start.
                for (i, slot) in inside.iter().enumerate() {
                    assert_eq!(slot.start_time, start + duration * i as i32);
                    assert_eq!(slot.end_time - slot.start_time, duration);
                }
            }
        }
    }
}

#[test]
fn test_no_slot_collides_with_padded_booking() {
    let duration = Duration::minutes(30);
    let bookings = vec![booking(at(monday(), 9, 15)), booking(at(monday(), 14, 0)), booking(at(monday(), 16, 50))];

    for buffer_minutes in [0, 5, 10, 30, 45] {
        let buffer = Duration::minutes(buffer_minutes);

        for windows in schedules() {
            let slots = generate_slots(&windows, &bookings, monday(), duration, buffer, long_ago());

            for slot in &slots {
                for apt in &bookings {
                    let apt_end = apt.start_time + duration;
                    assert!(
                        slot.end_time + buffer <= apt.start_time || slot.start_time >= apt_end,
                        "slot {:?} collides with booking at {} (buffer {})",
                        slot,
                        apt.start_time,
                        buffer_minutes
                    );
                }
            }
        }
    }
}

#[test]
fn test_no_slot_starts_at_or_before_now() {
    let windows = vec![window(hm(8, 0), hm(18, 0))];

    for (h, m) in [(7, 0), (8, 0), (8, 1), (12, 30), (17, 30), (18, 0)] {
        let now = at(monday(), h, m);
        let slots = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), now);

        assert!(slots.iter().all(|s| s.start_time > now));
    }
}

#[test]
fn test_output_is_strictly_chronological() {
    let windows = vec![
        window(hm(13, 0), hm(15, 0)),
        window(hm(9, 0), hm(12, 0)),
        window(hm(11, 15), hm(13, 45)),
    ];
    let slots: Vec<Slot> = generate_slots(&windows, &[], monday(), Duration::minutes(30), Duration::zero(), long_ago())
        .iter()
        .collect();

    assert!(!slots.is_empty());
    assert!(slots.windows(2).all(|pair| pair[0].start_time < pair[1].start_time));
}
