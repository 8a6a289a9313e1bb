use chrono::{FixedOffset, TimeZone, Timelike, Utc};
use uuid::Uuid;
use whitestone_core::{DayKey, DayKeyError, Stone, StoneKind, StoneValidationError};

fn tz() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

#[test]
fn new_stone_stamps_local_day_key() {
    // 23:30 UTC is already the next day at +02:00.
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap();
    let stone =
        Stone::new(StoneKind::White, Some("walked".to_string()), timestamp, &tz()).unwrap();

    assert!(!stone.id().is_nil());
    assert_eq!(stone.kind(), StoneKind::White);
    assert_eq!(stone.note(), Some("walked"));
    assert_eq!(stone.timestamp(), timestamp);
    assert_eq!(stone.day_key().to_string(), "2026-10-19");
}

#[test]
fn timestamps_are_truncated_to_milliseconds() {
    let timestamp = Utc.timestamp_opt(1_760_000_000, 123_456_789).unwrap();
    let stone = Stone::new(StoneKind::Black, None, timestamp, &tz()).unwrap();

    assert_eq!(stone.timestamp().nanosecond(), 123_000_000);
}

#[test]
fn reschedule_recomputes_day_key() {
    let original = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let moved = Utc.with_ymd_and_hms(2026, 10, 12, 21, 45, 0).unwrap();
    let mut stone = Stone::new(StoneKind::White, None, original, &tz()).unwrap();

    stone.reschedule(moved, &tz()).unwrap();

    assert_eq!(stone.timestamp(), moved);
    assert_eq!(stone.day_key(), DayKey::for_instant(moved, &tz()));
    assert_eq!(stone.day_key().to_string(), "2026-10-12");
}

#[test]
fn timestamps_without_four_digit_local_year_are_rejected() {
    // Still 9999 in UTC, already year 10000 at +02:00.
    let late = Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap();
    let err = Stone::new(StoneKind::White, None, late, &tz()).unwrap_err();
    assert!(matches!(
        err,
        StoneValidationError::TimestampOutOfRange {
            timestamp,
            reason: DayKeyError::YearOutOfRange(_),
        } if timestamp == late
    ));

    let early = Utc.with_ymd_and_hms(-1, 6, 1, 12, 0, 0).unwrap();
    assert!(Stone::new(StoneKind::Black, None, early, &tz()).is_err());

    let edge = Utc.with_ymd_and_hms(9999, 12, 31, 12, 0, 0).unwrap();
    let stone = Stone::new(StoneKind::White, None, edge, &tz()).unwrap();
    assert_eq!(stone.day_key().to_string(), "9999-12-31");
    assert_eq!(DayKey::parse("9999-12-31").unwrap(), stone.day_key());
}

#[test]
fn failed_reschedule_leaves_stone_unchanged() {
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let mut stone = Stone::new(StoneKind::White, None, timestamp, &tz()).unwrap();
    let before = stone.clone();

    let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    assert!(stone.reschedule(far, &tz()).is_err());
    assert_eq!(stone, before);
}

#[test]
fn blank_notes_are_stored_as_none() {
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let mut stone =
        Stone::new(StoneKind::White, Some("   ".to_string()), timestamp, &tz()).unwrap();
    assert_eq!(stone.note(), None);

    stone.set_note(Some("slept early".to_string()));
    assert_eq!(stone.note(), Some("slept early"));

    stone.set_note(Some(String::new()));
    assert_eq!(stone.note(), None);
}

#[test]
fn with_id_rejects_nil_uuid() {
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let err = Stone::with_id(Uuid::nil(), StoneKind::Black, None, timestamp, &tz()).unwrap_err();
    assert_eq!(err, StoneValidationError::NilId);

    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let stone = Stone::with_id(id, StoneKind::Black, None, timestamp, &tz()).unwrap();
    assert_eq!(stone.id(), id);
}

#[test]
fn stone_kind_round_trips_through_storage_names() {
    for kind in StoneKind::ALL {
        assert_eq!(StoneKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(StoneKind::parse("grey"), None);
}

#[test]
fn stone_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 19, 6, 15, 0).unwrap();
    let stone = Stone::with_id(id, StoneKind::Black, Some("snapped".into()), timestamp, &tz())
        .unwrap();

    let json = serde_json::to_value(&stone).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["kind"], "black");
    assert_eq!(json["timestamp"], "2026-10-19T06:15:00Z");
    assert_eq!(json["note"], "snapped");
    assert_eq!(json["day_key"], "2026-10-19");
}
