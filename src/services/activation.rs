use chrono::{DateTime, Utc};

/// `shown_since` value a notification must be written with.
///
/// A shown notification keeps the timestamp it already carries and only gets
/// `now` when it had none; a hidden one always loses it. Deactivating every
/// other notification is the store's job and happens in the same write.
pub fn stamp_shown_since(
    show_this_message: bool,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if show_this_message {
        current.or(Some(now))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_first_activation_stamps_now() {
        assert_eq!(stamp_shown_since(true, None, t0()), Some(t0()));
    }

    #[test]
    fn test_resave_while_shown_keeps_timestamp() {
        let later = t0() + Duration::hours(3);
        assert_eq!(stamp_shown_since(true, Some(t0()), later), Some(t0()));
    }

    #[test]
    fn test_hidden_clears_timestamp() {
        assert_eq!(stamp_shown_since(false, Some(t0()), t0()), None);
        assert_eq!(stamp_shown_since(false, None, t0()), None);
    }

    #[test]
    fn test_reactivation_after_hide_is_later() {
        let first = stamp_shown_since(true, None, t0());
        let hidden = stamp_shown_since(false, first, t0() + Duration::seconds(1));
        let again = stamp_shown_since(true, hidden, t0() + Duration::seconds(2));
        assert!(again > first);
    }
}
