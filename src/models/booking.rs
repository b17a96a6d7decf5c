use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::services::timefmt;

/// Booking lifecycle state. The server may define states beyond the two the
/// pages act on; those are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(value),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation of a resource, as returned by `GET /bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub resource_id: i64,
    pub user_id: String,
    #[serde(with = "timefmt::wire")]
    pub start_time: NaiveDateTime,
    #[serde(with = "timefmt::wire")]
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
}

/// Body for `POST /bookings` (a booking without its id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub resource_id: i64,
    pub user_id: String,
    #[serde(with = "timefmt::wire")]
    pub start_time: NaiveDateTime,
    #[serde(with = "timefmt::wire")]
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
}

/// Body for `PUT /bookings/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(BookingStatus::from("CONFIRMED".to_string()), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::from("cancelled".to_string()), BookingStatus::Cancelled);
        assert_eq!(
            BookingStatus::from("PENDING".to_string()),
            BookingStatus::Other("PENDING".to_string())
        );
        assert_eq!(String::from(BookingStatus::Other("PENDING".into())), "PENDING");
    }

    #[test]
    fn booking_reads_either_time_separator() {
        let json = r#"{
            "id": 7,
            "resourceId": 1,
            "userId": "alice",
            "startTime": "2024-01-01 10:00",
            "endTime": "2024-01-01T11:30:00",
            "status": "CONFIRMED"
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.start_time.to_string(), "2024-01-01 10:00:00");
        assert_eq!(booking.end_time.to_string(), "2024-01-01 11:30:00");
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn list_with_offset_timestamp_still_decodes() {
        let json = r#"[
            {"id": 1, "resourceId": 1, "userId": "alice", "startTime": "2024-01-01 10:00", "endTime": "2024-01-01 11:00", "status": "CONFIRMED"},
            {"id": 2, "resourceId": 1, "userId": "bob", "startTime": "2024-01-02T10:00:00Z", "endTime": "2024-01-02T11:00:00Z", "status": "CONFIRMED"}
        ]"#;
        let bookings: Vec<Booking> = serde_json::from_str(json).unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[1].start_time.to_string(), "2024-01-02 10:00:00");
    }

    #[test]
    fn new_booking_is_sent_in_wire_format() {
        let booking = NewBooking {
            resource_id: 3,
            user_id: "bob".to_string(),
            start_time: timefmt::parse("2024-01-01T10:00").unwrap(),
            end_time: timefmt::parse("2024-01-01T12:00").unwrap(),
            status: BookingStatus::Confirmed,
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["resourceId"], 3);
        assert_eq!(value["startTime"], "2024-01-01 10:00");
        assert_eq!(value["endTime"], "2024-01-01 12:00");
        assert_eq!(value["status"], "CONFIRMED");
    }
}
