use proptest::prelude::*;

use chainwatch_types::{BlockIdFlag, Event, EventCategory, Timestamp};

proptest! {
    /// millis_since is antisymmetric for any pair of timestamps.
    #[test]
    fn millis_since_antisymmetric(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta.millis_since(tb), -tb.millis_since(ta));
    }

    /// Only flag value 2 counts as committed.
    #[test]
    fn only_flag_two_is_committed(raw in 0u8..=255) {
        prop_assert_eq!(BlockIdFlag::from(raw).is_committed(), raw == 2);
    }

    /// Every category survives a trip through its config name.
    #[test]
    fn category_config_name_parses_back(idx in 0usize..5) {
        let category = EventCategory::ALL[idx];
        prop_assert_eq!(category.config_name().parse::<EventCategory>().unwrap(), category);
    }

    /// Serialized events decode to an equal event.
    #[test]
    fn event_json_preserves_identity(text in "[a-zA-Z0-9 ]{0,40}", height in 0u64..10_000_000) {
        let event = Event::warn(EventCategory::Cadence, text).with_meta("height", height);
        let json = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, event);
    }
}
