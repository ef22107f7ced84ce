/// Start of an order period: first hour of the year, UTC.
pub(crate) fn period_start(year: i32) -> String {
    format!("{year:04}-01-01T00:00:00Z")
}

/// End of an order period: last hour of the year, UTC.
pub(crate) fn period_end(year: i32) -> String {
    format!("{year:04}-12-31T23:00:00Z")
}

/// File name an artifact is saved under, derived from its order id.
pub(crate) fn artifact_filename(order_id: &str) -> String {
    format!("command_{order_id}_RAW_DATA.csv")
}

/// Closing dates are sometimes absent and sometimes a far-future placeholder;
/// both mean "still active".
pub(crate) fn is_placeholder_date(date: &str) -> bool {
    let date = date.trim();
    if date.is_empty() {
        return true;
    }
    match date.get(..4).and_then(|y| y.parse::<i32>().ok()) {
        Some(year) => year >= 9999,
        None => true,
    }
}

/// Percent-encode the colons of an ISO-8601 timestamp for use in a query
/// string, matching the wire format the order endpoint documents.
pub(crate) fn encode_timestamp(ts: &str) -> String {
    ts.replace(':', "%3A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_boundaries_are_utc_hours() {
        assert_eq!(period_start(2020), "2020-01-01T00:00:00Z");
        assert_eq!(period_end(2021), "2021-12-31T23:00:00Z");
    }

    #[test]
    fn artifact_name_embeds_order_id() {
        assert_eq!(
            artifact_filename("779284600243"),
            "command_779284600243_RAW_DATA.csv"
        );
    }

    #[test]
    fn placeholder_dates_treated_as_open() {
        assert!(is_placeholder_date(""));
        assert!(is_placeholder_date("  "));
        assert!(is_placeholder_date("9999-01-01T00:00:00Z"));
        assert!(!is_placeholder_date("2023-06-12T00:00:00Z"));
    }

    #[test]
    fn timestamps_encode_their_colons() {
        assert_eq!(
            encode_timestamp("2020-01-01T00:00:00Z"),
            "2020-01-01T00%3A00%3A00Z"
        );
    }
}
