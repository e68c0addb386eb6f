/// Record identifiers are opaque strings assigned by the data store.
pub type RecordId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Return a timestamp that is strictly later than `previous`.
///
/// Wall clocks can repeat a reading across two quick mutations; the result
/// is bumped by one microsecond in that case so `updated_at` always moves.
pub fn next_timestamp(previous: Timestamp) -> Timestamp {
    let now = chrono::Utc::now();
    let floor = previous + chrono::Duration::microseconds(1);
    if now > previous {
        now
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_timestamp_moves_past_future_previous() {
        let future = chrono::Utc::now() + chrono::Duration::hours(1);
        let next = next_timestamp(future);
        assert!(next > future);
    }

    #[test]
    fn next_timestamp_uses_wall_clock_when_ahead() {
        let past = chrono::Utc::now() - chrono::Duration::hours(1);
        let next = next_timestamp(past);
        assert!(next > past + chrono::Duration::minutes(59));
    }
}
