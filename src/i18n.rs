/*
Message catalogue for the booking pages.

This module provides:
- A small embedded translations store for EN/RU (compile-time embedded JSON).
- A `tr` function to look up a message by key + optional params.
- A `t` convenience wrapper using the default language (DEFAULT_LANG).

Usage:
    use crate::i18n;
    let msg = i18n::t("booking.created");
    let msg_with = i18n::tr(Some("ru"), "dashboard.resources_count", Some(&[("count", "3")]));

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `en`. If a key is missing for the requested language,
  the default language is used.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "field.resource": "Resource",
  "field.user": "User ID",
  "field.start_time": "Start time",
  "field.end_time": "End time",
  "field.name": "Name",
  "field.type": "Type",
  "field.capacity": "Capacity",
  "validation.missing_field": "Please fill in all required fields ({field} is missing)",
  "validation.missing_window": "Select both start and end times",
  "validation.end_before_start": "End time must be after start time",
  "validation.invalid_time": "{field} is not a valid date and time: {value}",
  "validation.invalid_number": "{field} must be a whole number of at least 0: {value}",
  "api.load_resources_failed": "Failed to load resources",
  "api.load_bookings_failed": "Failed to load bookings",
  "api.create_booking_failed": "Failed to create booking",
  "api.update_booking_failed": "Failed to update booking status",
  "api.delete_booking_failed": "Failed to delete booking",
  "api.check_availability_failed": "Failed to check availability",
  "api.create_resource_failed": "Failed to create resource",
  "api.update_resource_failed": "Failed to update resource",
  "api.delete_resource_failed": "Failed to delete resource",
  "availability.load_resources_failed": "Failed to load resources. Please refresh.",
  "availability.check_completed": "Availability check completed!",
  "availability.check_failed": "Failed to check availability. Try again.",
  "availability.in_progress": "An availability check is already in progress",
  "availability.results_cleared": "Results cleared",
  "availability.redirecting": "Redirecting to book \"{name}\"...",
  "availability.unavailable_during": "Resource \"{name}\" is unavailable during {start} - {end}",
  "booking.created": "Booking created successfully!",
  "booking.cancelled": "Booking cancelled!",
  "booking.updated": "Booking updated!",
  "booking.deleted": "Booking deleted successfully!",
  "booking.available": "Resource is available!",
  "booking.not_available": "Resource is NOT available",
  "resource.created": "Resource created successfully",
  "resource.updated": "Resource updated successfully",
  "resource.deleted": "Resource deleted",
  "dashboard.resources_count": "{count} resource(s) available",
  "dashboard.bookings_count": "{count} booking(s) made",
  "dashboard.resources_error": "Error loading resources",
  "dashboard.bookings_error": "Error loading bookings",
  "render.available": "Available",
  "render.unavailable": "Unavailable",
  "render.type_other": "Other",
  "render.not_applicable": "N/A",
  "render.location_unspecified": "Not specified",
  "render.resource_fallback": "Resource #{id}",
  "not_found.resource": "Resource not found",
  "app.name": "Booking & Reservation System"
}
"#;

const RU_JSON: &str = r#"
{
  "field.resource": "Ресурс",
  "field.user": "ID пользователя",
  "field.start_time": "Время начала",
  "field.end_time": "Время окончания",
  "field.name": "Название",
  "field.type": "Тип",
  "field.capacity": "Вместимость",
  "validation.missing_field": "Пожалуйста, заполните все обязательные поля (не заполнено: {field})",
  "validation.missing_window": "Выберите время начала и окончания",
  "validation.end_before_start": "Время окончания должно быть позже времени начала",
  "validation.invalid_time": "{field}: некорректная дата и время: {value}",
  "validation.invalid_number": "{field}: ожидается целое число не меньше 0: {value}",
  "api.load_resources_failed": "Не удалось загрузить ресурсы",
  "api.load_bookings_failed": "Не удалось загрузить бронирования",
  "api.create_booking_failed": "Не удалось создать бронирование",
  "api.update_booking_failed": "Не удалось обновить статус бронирования",
  "api.delete_booking_failed": "Не удалось удалить бронирование",
  "api.check_availability_failed": "Не удалось проверить доступность",
  "api.create_resource_failed": "Не удалось создать ресурс",
  "api.update_resource_failed": "Не удалось обновить ресурс",
  "api.delete_resource_failed": "Не удалось удалить ресурс",
  "availability.load_resources_failed": "Не удалось загрузить ресурсы. Обновите страницу.",
  "availability.check_completed": "Проверка доступности завершена!",
  "availability.check_failed": "Не удалось проверить доступность. Попробуйте ещё раз.",
  "availability.in_progress": "Проверка доступности уже выполняется",
  "availability.results_cleared": "Результаты очищены",
  "availability.redirecting": "Переход к бронированию «{name}»...",
  "availability.unavailable_during": "Ресурс «{name}» недоступен в период {start} - {end}",
  "booking.created": "Бронирование успешно создано!",
  "booking.cancelled": "Бронирование отменено!",
  "booking.updated": "Бронирование обновлено!",
  "booking.deleted": "Бронирование успешно удалено!",
  "booking.available": "Ресурс доступен!",
  "booking.not_available": "Ресурс НЕ доступен",
  "resource.created": "Ресурс успешно создан",
  "resource.updated": "Ресурс успешно обновлён",
  "resource.deleted": "Ресурс удалён",
  "dashboard.resources_count": "Доступно ресурсов: {count}",
  "dashboard.bookings_count": "Создано бронирований: {count}",
  "dashboard.resources_error": "Ошибка загрузки ресурсов",
  "dashboard.bookings_error": "Ошибка загрузки бронирований",
  "render.available": "Доступен",
  "render.unavailable": "Недоступен",
  "render.type_other": "Другое",
  "render.not_applicable": "Н/Д",
  "render.location_unspecified": "Не указано",
  "render.resource_fallback": "Ресурс #{id}",
  "not_found.resource": "Ресурс не найден",
  "app.name": "Система бронирования"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    // Parse EN
    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    // Parse RU
    let ru_map: HashMap<String, String> = serde_json::from_str(RU_JSON).unwrap_or_else(|e| {
        panic!("failed to parse RU_JSON in i18n module: {}", e);
    });
    out.insert("ru".to_string(), ru_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Normalize a language tag into a short, lowercase code (e.g. "en-US" -> "en").
pub fn normalize_language(lang: &str) -> String {
    lang.split('-').next().unwrap_or(lang).to_lowercase()
}

/// Returns true if the given language code has a translation table.
pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Translate a key using an explicit language (or default if None).
///
/// - `lang`: optional language code (`"en"`, `"ru"`). If None, DEFAULT_LANG is used.
/// - `key`: flat translation key, e.g. `"booking.created"`.
/// - `params`: optional `(name, value)` pairs replacing `{name}` placeholders.
///
/// Falls back to the default language, then to the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        // If still missing, return the key itself (useful in logs)
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}
