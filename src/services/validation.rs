//! Form checks run before any request reaches the booking API.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::i18n;
use crate::models::{BookingStatus, NewBooking, ResourceInput};
use crate::services::timefmt::{self, Separator};

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Resource,
    User,
    StartTime,
    EndTime,
    Name,
    Type,
    Capacity,
}

impl Field {
    fn message_key(self) -> &'static str {
        match self {
            Field::Resource => "field.resource",
            Field::User => "field.user",
            Field::StartTime => "field.start_time",
            Field::EndTime => "field.end_time",
            Field::Name => "field.name",
            Field::Type => "field.type",
            Field::Capacity => "field.capacity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0:?}")]
    MissingField(Field),

    #[error("Both start and end times are required")]
    MissingWindow,

    #[error("End time must be after start time")]
    InvalidTimeOrder,

    #[error("Invalid date/time for {field:?}: {value}")]
    InvalidTime { field: Field, value: String },

    #[error("Invalid number for {field:?}: {value}")]
    InvalidNumber { field: Field, value: String },
}

impl ValidationError {
    /// Message shown to the user, one per cause.
    pub fn user_message(&self, lang: &str) -> String {
        let lang = Some(lang);
        match self {
            ValidationError::MissingField(field) => {
                let name = i18n::tr(lang, field.message_key(), None);
                i18n::tr(lang, "validation.missing_field", Some(&[("field", &name)]))
            }
            ValidationError::MissingWindow => i18n::tr(lang, "validation.missing_window", None),
            ValidationError::InvalidTimeOrder => {
                i18n::tr(lang, "validation.end_before_start", None)
            }
            ValidationError::InvalidTime { field, value } => {
                let name = i18n::tr(lang, field.message_key(), None);
                i18n::tr(
                    lang,
                    "validation.invalid_time",
                    Some(&[("field", &name), ("value", value)]),
                )
            }
            ValidationError::InvalidNumber { field, value } => {
                let name = i18n::tr(lang, field.message_key(), None);
                i18n::tr(
                    lang,
                    "validation.invalid_number",
                    Some(&[("field", &name), ("value", value)]),
                )
            }
        }
    }
}

/// A checked time interval; `start < end` holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeOrder);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn start_as(&self, sep: Separator) -> String {
        timefmt::format(&self.start, sep)
    }

    pub fn end_as(&self, sep: Separator) -> String {
        timefmt::format(&self.end, sep)
    }
}

/// A value posted by a form control: numbers may arrive as JSON numbers or text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(i64),
    Text(String),
}

impl FormValue {
    fn is_blank(&self) -> bool {
        matches!(self, FormValue::Text(s) if s.trim().is_empty())
    }

    fn to_i64(&self, field: Field) -> Result<i64, ValidationError> {
        match self {
            FormValue::Number(n) => Ok(*n),
            FormValue::Text(s) => s.trim().parse().map_err(|_| ValidationError::InvalidNumber {
                field,
                value: s.clone(),
            }),
        }
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(n)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_time(value: &str, field: Field) -> Result<NaiveDateTime, ValidationError> {
    timefmt::parse(value).ok_or_else(|| ValidationError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

/// Start/end pair from the availability form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WindowForm {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl WindowForm {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub fn validate(&self) -> Result<TimeWindow, ValidationError> {
        let (Some(start), Some(end)) = (present(&self.start), present(&self.end)) else {
            return Err(ValidationError::MissingWindow);
        };
        let start = parse_time(start, Field::StartTime)?;
        let end = parse_time(end, Field::EndTime)?;
        TimeWindow::new(start, end)
    }
}

/// Fields of the "create booking" form, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    pub resource_id: Option<FormValue>,
    pub user_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl BookingForm {
    /// Parse the resource selection. Unselected (absent, blank or 0) yields `Ok(None)`.
    pub fn resource_id(&self) -> Result<Option<i64>, ValidationError> {
        match &self.resource_id {
            None => Ok(None),
            Some(v) if v.is_blank() => Ok(None),
            Some(v) => v.to_i64(Field::Resource).map(|id| (id != 0).then_some(id)),
        }
    }

    pub fn validate(&self) -> Result<NewBooking, ValidationError> {
        let resource_id = self
            .resource_id()?
            .ok_or(ValidationError::MissingField(Field::Resource))?;
        let user_id = present(&self.user_id).ok_or(ValidationError::MissingField(Field::User))?;
        let start = present(&self.start_time)
            .ok_or(ValidationError::MissingField(Field::StartTime))?;
        let end =
            present(&self.end_time).ok_or(ValidationError::MissingField(Field::EndTime))?;

        let window = TimeWindow::new(
            parse_time(start, Field::StartTime)?,
            parse_time(end, Field::EndTime)?,
        )?;

        Ok(NewBooking {
            resource_id,
            user_id: user_id.to_string(),
            start_time: window.start(),
            end_time: window.end(),
            status: BookingStatus::Confirmed,
        })
    }
}

/// Fields of the add/edit resource form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceForm {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub capacity: Option<FormValue>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ResourceForm {
    pub fn validate(&self) -> Result<ResourceInput, ValidationError> {
        let name = present(&self.name).ok_or(ValidationError::MissingField(Field::Name))?;
        let resource_type =
            present(&self.resource_type).ok_or(ValidationError::MissingField(Field::Type))?;

        let capacity = match &self.capacity {
            None => return Err(ValidationError::MissingField(Field::Capacity)),
            Some(v) if v.is_blank() => {
                return Err(ValidationError::MissingField(Field::Capacity))
            }
            Some(v) => v.to_i64(Field::Capacity)?,
        };
        if capacity < 0 {
            return Err(ValidationError::InvalidNumber {
                field: Field::Capacity,
                value: capacity.to_string(),
            });
        }

        Ok(ResourceInput {
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            capacity,
            location: present(&self.location).map(str::to_string),
            description: present(&self.description).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_form(resource: Option<FormValue>, user: &str, start: &str, end: &str) -> BookingForm {
        BookingForm {
            resource_id: resource,
            user_id: Some(user.to_string()),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let form = booking_form(
            Some(FormValue::Number(1)),
            "alice",
            "2024-01-01T10:00",
            "2024-01-01T09:00",
        );
        assert_eq!(form.validate(), Err(ValidationError::InvalidTimeOrder));
    }

    #[test]
    fn equal_start_and_end_is_rejected() {
        let window = WindowForm::new("2024-01-01T10:00", "2024-01-01T10:00");
        assert_eq!(window.validate(), Err(ValidationError::InvalidTimeOrder));
    }

    #[test]
    fn each_missing_field_is_reported() {
        let mut form = booking_form(None, "alice", "2024-01-01T10:00", "2024-01-01T11:00");
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField(Field::Resource))
        );

        form.resource_id = Some(FormValue::Text("".into()));
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField(Field::Resource))
        );

        form.resource_id = Some(FormValue::Text("2".into()));
        form.user_id = Some("   ".into());
        assert_eq!(form.validate(), Err(ValidationError::MissingField(Field::User)));

        form.user_id = Some("alice".into());
        form.end_time = None;
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField(Field::EndTime))
        );
    }

    #[test]
    fn valid_booking_form_produces_confirmed_booking() {
        let form = booking_form(
            Some(FormValue::Text("4".into())),
            " alice ",
            "2024-01-01T10:00",
            "2024-01-01T11:00",
        );
        let booking = form.validate().unwrap();
        assert_eq!(booking.resource_id, 4);
        assert_eq!(booking.user_id, "alice");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(timefmt::format(&booking.start_time, Separator::Wire), "2024-01-01 10:00");
    }

    #[test]
    fn unparseable_time_is_its_own_error() {
        let window = WindowForm::new("yesterday", "2024-01-01T10:00");
        assert_eq!(
            window.validate(),
            Err(ValidationError::InvalidTime {
                field: Field::StartTime,
                value: "yesterday".into()
            })
        );
    }

    #[test]
    fn missing_window_message() {
        let window = WindowForm {
            start: Some("2024-01-01T10:00".into()),
            end: None,
        };
        let err = window.validate().unwrap_err();
        assert_eq!(err.user_message("en"), "Select both start and end times");
    }

    #[test]
    fn messages_differ_per_cause() {
        let missing = ValidationError::MissingField(Field::User).user_message("en");
        let order = ValidationError::InvalidTimeOrder.user_message("en");
        assert!(missing.contains("User ID"));
        assert_eq!(order, "End time must be after start time");
        assert_ne!(missing, order);
    }

    #[test]
    fn resource_form_validation() {
        let form = ResourceForm {
            name: Some("Room A".into()),
            resource_type: Some("Room".into()),
            capacity: Some(FormValue::Text("12".into())),
            location: Some("  ".into()),
            description: Some("Projector".into()),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.capacity, 12);
        assert_eq!(input.location, None);
        assert_eq!(input.description.as_deref(), Some("Projector"));

        let negative = ResourceForm {
            capacity: Some(FormValue::Number(-1)),
            ..form.clone()
        };
        assert!(matches!(
            negative.validate(),
            Err(ValidationError::InvalidNumber { field: Field::Capacity, .. })
        ));

        let unnamed = ResourceForm {
            name: None,
            ..form
        };
        assert_eq!(unnamed.validate(), Err(ValidationError::MissingField(Field::Name)));
    }

    #[test]
    fn form_values_accept_numbers_or_text() {
        let form: BookingForm = serde_json::from_str(
            r#"{"resourceId": "3", "userId": "u", "startTime": "2024-01-01T10:00", "endTime": "2024-01-01T11:00"}"#,
        )
        .unwrap();
        assert_eq!(form.resource_id().unwrap(), Some(3));

        let form: BookingForm = serde_json::from_str(r#"{"resourceId": 5}"#).unwrap();
        assert_eq!(form.resource_id().unwrap(), Some(5));
    }
}
