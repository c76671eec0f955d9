//! Google Calendar tool surface: calendar list management plus event CRUD
//! against the Calendar v3 API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::envelope::{self, Surface, ToolResult};
use super::{ToolSpec, ToolSurface, validate};
use crate::google::GoogleClient;

const ACCESS_ROLES: &[&str] = &["freeBusyReader", "owner", "reader", "writer"];
const EVENT_SORT_KEYS: &[&str] = &["startTime", "updateTime"];
const EVENT_VISIBILITY: &[&str] = &["default", "public", "private", "confidential"];
const EVENT_TRANSPARENCY: &[&str] = &["transparent", "opaque"];
const EVENT_SEND_UPDATES: &[&str] = &["all", "externalOnly", "none"];

fn check_calendar_id(calendar_id: &str) -> Option<ToolResult> {
    if calendar_id.trim().is_empty() {
        return Some(ToolResult::error("Calendar ID cannot be empty."));
    }
    None
}

fn invalid_timestamp(field: &str, value: &str) -> ToolResult {
    ToolResult::error(format!(
        "Invalid {} format: '{}'. Expected RFC3339 format (e.g., 2023-10-01T12:00:00Z).",
        field, value
    ))
}

fn invalid_timezone(tz: &str) -> ToolResult {
    ToolResult::error(format!(
        "Invalid time zone: '{}'. Please provide a valid IANA time zone (e.g. Asia/Kolkata)",
        tz
    ))
}

#[derive(Deserialize)]
pub struct ListCalendarsArgs {
    pub max_results: i64,
    pub min_access_role: Option<String>,
    pub show_deleted: Option<bool>,
    pub show_hidden: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateCalendarArgs {
    pub summary: String,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct CalendarIdArgs {
    pub calendar_id: String,
}

#[derive(Deserialize)]
pub struct UpdateCalendarArgs {
    pub calendar_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
pub struct ListEventsArgs {
    pub calendar_id: String,
    pub query: Option<String>,
    pub max_results: Option<i64>,
    pub max_attendees: Option<i64>,
    pub show_hidden_invitations: Option<bool>,
    pub show_deleted: Option<bool>,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub time_zone: Option<String>,
    pub updated_min: Option<String>,
    pub single_events: Option<bool>,
    pub order_by: Option<String>,
}

#[derive(Deserialize)]
pub struct GetEventArgs {
    pub calendar_id: String,
    pub event_id: String,
    pub max_attendees: Option<i64>,
    pub time_zone: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateEventArgs {
    pub calendar_id: String,
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    pub time_zone: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub add_google_meet_link: Option<bool>,
    pub attendees: Option<Vec<String>>,
    pub recurrence: Option<Vec<String>>,
    pub visibility: Option<String>,
    pub guests_can_invite_others: Option<bool>,
    pub guests_can_see_other_guests: Option<bool>,
    pub transparency: Option<String>,
    pub send_updates: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateEventArgs {
    pub calendar_id: String,
    pub event_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_zone: Option<String>,
    pub recurrence: Option<Vec<String>>,
    pub visibility: Option<String>,
    pub transparency: Option<String>,
    pub guests_can_invite_others: Option<bool>,
    pub guests_can_see_other_guests: Option<bool>,
    pub send_updates: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteEventArgs {
    pub calendar_id: String,
    pub event_id: String,
    pub send_updates: Option<String>,
}

pub struct CalendarTools {
    client: GoogleClient,
}

impl CalendarTools {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }

    pub async fn list_calendars(&self, args: ListCalendarsArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = validate::check_range("max_results", args.max_results, 1, 250) {
                return Ok(ToolResult::error(err));
            }
            if let Some(role) = &args.min_access_role {
                if !ACCESS_ROLES.contains(&role.as_str()) {
                    return Ok(ToolResult::error(format!(
                        "Invalid calendar access role: {}",
                        role
                    )));
                }
            }
            let mut query = vec![("maxResults", args.max_results.to_string())];
            if let Some(role) = &args.min_access_role {
                query.push(("minAccessRole", role.clone()));
            }
            if let Some(show_deleted) = args.show_deleted {
                query.push(("showDeleted", show_deleted.to_string()));
            }
            if let Some(show_hidden) = args.show_hidden {
                query.push(("showHidden", show_hidden.to_string()));
            }
            let url = self.client.url("calendar/v3/users/me/calendarList", &query)?;
            let response = self.client.get(url).await?;
            let items = response["items"].as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                return Ok(ToolResult::not_found(
                    "No calendars found for this Google account",
                ));
            }
            let calendars: Vec<Value> = items
                .iter()
                .map(|calendar| {
                    json!({
                        "calendar_id": calendar["id"].as_str().unwrap_or_default(),
                        "summary": calendar["summary"].as_str().unwrap_or_default(),
                        "primary": calendar["primary"].as_bool().unwrap_or(false),
                        "hidden": calendar["hidden"].as_bool().unwrap_or(false),
                        "deleted": calendar["deleted"].as_bool().unwrap_or(false),
                    })
                })
                .collect();
            Ok(ToolResult::success().with("calendars", calendars))
        })
        .await
    }

    pub async fn create_calendar(&self, args: CreateCalendarArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if args.summary.trim().is_empty() {
                return Ok(ToolResult::error("Calendar summary cannot be empty."));
            }
            let time_zone = match args.time_zone.as_deref().map(str::trim) {
                Some(tz) if !tz.is_empty() => {
                    if !validate::is_valid_timezone(tz) {
                        return Ok(invalid_timezone(tz));
                    }
                    tz.to_string()
                }
                _ => "UTC".to_string(),
            };
            let mut body = json!({
                "summary": args.summary.trim(),
                "timeZone": time_zone,
            });
            if let Some(description) = args.description.as_deref().map(str::trim) {
                if !description.is_empty() {
                    body["description"] = json!(description);
                }
            }
            if let Some(location) = args.location.as_deref().map(str::trim) {
                if !location.is_empty() {
                    body["location"] = json!(location);
                }
            }
            let url = self.client.url("calendar/v3/calendars", &[])?;
            let calendar = self.client.post(url, &body).await?;
            let id = calendar["id"].as_str().unwrap_or("unavailable");
            Ok(ToolResult::success()
                .with("id", id)
                .with("summary", calendar["summary"].as_str().unwrap_or("unavailable"))
                .with("timeZone", calendar["timeZone"].as_str().unwrap_or("unavailable"))
                .with(
                    "calendar_url",
                    format!("https://calendar.google.com/calendar/u/0/r?cid={}", id),
                ))
        })
        .await
    }

    pub async fn get_calendar(&self, args: CalendarIdArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            let url = self
                .client
                .url(&format!("calendar/v3/calendars/{}", args.calendar_id), &[])?;
            let metadata = self.client.get(url).await?;
            if metadata.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "No metadata found for calendar with id '{}'.",
                    args.calendar_id
                )));
            }
            Ok(ToolResult::success().with("metadata", metadata))
        })
        .await
    }

    pub async fn update_calendar(&self, args: UpdateCalendarArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if args.summary.is_none()
                && args.description.is_none()
                && args.location.is_none()
                && args.timezone.is_none()
            {
                return Ok(ToolResult::error(
                    "No fields provided to update the calendar.",
                ));
            }
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            let mut body = serde_json::Map::new();
            if let Some(summary) = &args.summary {
                if summary.trim().is_empty() {
                    return Ok(ToolResult::error("Summary cannot be empty."));
                }
                body.insert("summary".to_string(), json!(summary));
            }
            if let Some(description) = &args.description {
                body.insert("description".to_string(), json!(description));
            }
            if let Some(location) = &args.location {
                body.insert("location".to_string(), json!(location));
            }
            if let Some(tz) = args.timezone.as_deref().map(str::trim) {
                if !tz.is_empty() {
                    if !validate::is_valid_timezone(tz) {
                        return Ok(invalid_timezone(tz));
                    }
                    body.insert("timeZone".to_string(), json!(tz));
                }
            }
            let url = self.client.url(
                &format!("calendar/v3/calendars/{}", args.calendar_id.trim()),
                &[],
            )?;
            let updated = self.client.patch(url, &Value::Object(body)).await?;
            Ok(ToolResult::success().with(
                "metadata",
                json!({
                    "calendar_id": updated["id"].as_str().unwrap_or_default(),
                    "summary": updated["summary"].as_str().unwrap_or_default(),
                    "description": updated["description"].as_str().unwrap_or_default(),
                    "location": updated["location"].as_str().unwrap_or_default(),
                    "time_zone": updated["timeZone"].as_str().unwrap_or_default(),
                }),
            ))
        })
        .await
    }

    pub async fn delete_calendar(&self, args: CalendarIdArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            // The primary calendar cannot be deleted, only cleared.
            let url = self
                .client
                .url(&format!("calendar/v3/calendars/{}", args.calendar_id), &[])?;
            let calendar = self.client.get(url).await?;
            if calendar["primary"].as_bool().unwrap_or(false) {
                return Ok(ToolResult::error(
                    "Cannot delete the user's primary calendar.",
                ));
            }
            let url = self
                .client
                .url(&format!("calendar/v3/calendars/{}", args.calendar_id), &[])?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Calendar with ID '{}' deleted successfully.",
                args.calendar_id
            )))
        })
        .await
    }

    pub async fn list_events(&self, args: ListEventsArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            if let Some(max_results) = args.max_results {
                if let Some(err) = validate::check_range("max_results", max_results, 1, 250) {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(max_attendees) = args.max_attendees {
                if let Some(err) = validate::check_range("max_attendees", max_attendees, 1, 250) {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(order_by) = &args.order_by {
                if let Some(err) = validate::check_enum("order_by", order_by, EVENT_SORT_KEYS) {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(time_min) = &args.time_min {
                if !validate::validate_rfc3339_timestamp(time_min) {
                    return Ok(invalid_timestamp("time_min", time_min));
                }
            }
            if let Some(time_max) = &args.time_max {
                if !validate::validate_rfc3339_timestamp(time_max) {
                    return Ok(invalid_timestamp("time_max", time_max));
                }
            }
            if let Some(updated_min) = &args.updated_min {
                if !validate::validate_rfc3339_timestamp(updated_min) {
                    return Ok(ToolResult::error(format!(
                        "The provided timestamp '{}' is not in a valid RFC3339 format. \
                         Defaults to calendar's configured timezone.",
                        updated_min
                    )));
                }
            }

            let mut query = Vec::new();
            if let Some(q) = args.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                query.push(("q", q.to_string()));
            }
            if let Some(max_results) = args.max_results {
                query.push(("maxResults", max_results.to_string()));
            }
            if let Some(max_attendees) = args.max_attendees {
                query.push(("maxAttendees", max_attendees.to_string()));
            }
            if let Some(show_hidden) = args.show_hidden_invitations {
                query.push(("showHiddenInvitations", show_hidden.to_string()));
            }
            if let Some(show_deleted) = args.show_deleted {
                query.push(("showDeleted", show_deleted.to_string()));
            }
            if let Some(time_min) = &args.time_min {
                query.push(("timeMin", time_min.clone()));
            }
            if let Some(time_max) = &args.time_max {
                query.push(("timeMax", time_max.clone()));
            }
            // An unknown time zone is dropped with a warning rather than
            // failing the whole listing.
            let mut warning = None;
            if let Some(tz) = &args.time_zone {
                if validate::is_valid_timezone(tz) {
                    query.push(("timeZone", tz.clone()));
                } else {
                    warning = Some(format!(
                        "Passed invalid time zone: '{}'. Defaulted to calendar's configured timezone.",
                        tz
                    ));
                }
            }
            if let Some(updated_min) = &args.updated_min {
                query.push(("updatedMin", updated_min.clone()));
            }
            if let Some(single_events) = args.single_events {
                query.push(("singleEvents", single_events.to_string()));
            }
            if let Some(order_by) = &args.order_by {
                query.push(("orderBy", order_by.clone()));
            }

            let url = self.client.url(
                &format!("calendar/v3/calendars/{}/events", args.calendar_id),
                &query,
            )?;
            let response = self.client.get(url).await?;
            if response.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "No events found for calendar {}.",
                    args.calendar_id
                )));
            }
            let mut result = ToolResult::success()
                .with("events", response["items"].as_array().cloned().unwrap_or_default());
            if let Some(warning) = warning {
                result = result.warning(warning);
            }
            Ok(result)
        })
        .await
    }

    pub async fn get_event(&self, args: GetEventArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            if args.event_id.trim().is_empty() {
                return Ok(ToolResult::error("Event ID cannot be empty."));
            }
            if let Some(max_attendees) = args.max_attendees {
                if let Some(err) = validate::check_range("max_attendees", max_attendees, 1, 250) {
                    return Ok(ToolResult::error(err));
                }
            }
            let mut query = Vec::new();
            if let Some(max_attendees) = args.max_attendees {
                query.push(("maxAttendees", max_attendees.to_string()));
            }
            let mut warning = None;
            if let Some(tz) = &args.time_zone {
                if validate::is_valid_timezone(tz) {
                    query.push(("timeZone", tz.clone()));
                } else {
                    warning = Some(format!(
                        "Passed invalid time zone: '{}'. Defaulted to calendar's configured timezone.",
                        tz
                    ));
                }
            }
            let url = self.client.url(
                &format!(
                    "calendar/v3/calendars/{}/events/{}",
                    args.calendar_id, args.event_id
                ),
                &query,
            )?;
            let event = self.client.get(url).await?;
            if event.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "No event found with ID {} in {}.",
                    args.event_id, args.calendar_id
                )));
            }
            let mut result = ToolResult::success().with("event", event);
            if let Some(warning) = warning {
                result = result.warning(warning);
            }
            Ok(result)
        })
        .await
    }

    pub async fn create_event(&self, args: CreateEventArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            if args.summary.trim().is_empty() {
                return Ok(ToolResult::error("Event summary cannot be empty."));
            }
            if !validate::validate_rfc3339_timestamp(&args.start_time) {
                return Ok(invalid_timestamp("start_time", &args.start_time));
            }
            if !validate::validate_rfc3339_timestamp(&args.end_time) {
                return Ok(invalid_timestamp("end_time", &args.end_time));
            }
            if !validate::is_start_before_end(&args.start_time, &args.end_time) {
                return Ok(ToolResult::error("start_time must be before end_time."));
            }
            if let Some(visibility) = &args.visibility {
                if let Some(err) = validate::check_enum("visibility", visibility, EVENT_VISIBILITY)
                {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(transparency) = &args.transparency {
                if let Some(err) =
                    validate::check_enum("transparency", transparency, EVENT_TRANSPARENCY)
                {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(send_updates) = &args.send_updates {
                if let Some(err) =
                    validate::check_enum("send_updates", send_updates, EVENT_SEND_UPDATES)
                {
                    return Ok(ToolResult::error(err));
                }
            }

            // Unknown time zones quietly fall back to UTC.
            let time_zone = match args.time_zone.as_deref().map(str::trim) {
                Some(tz) if validate::is_valid_timezone(tz) => tz.to_string(),
                _ => "UTC".to_string(),
            };
            let send_updates = args.send_updates.clone().unwrap_or_else(|| "none".to_string());
            let transparency = args.transparency.clone().unwrap_or_else(|| "opaque".to_string());
            let visibility = args.visibility.clone().unwrap_or_else(|| "default".to_string());

            let mut body = json!({
                "summary": args.summary.trim(),
                "start": { "dateTime": args.start_time, "timeZone": time_zone },
                "end": { "dateTime": args.end_time, "timeZone": time_zone },
                "visibility": visibility,
                "transparency": transparency,
            });
            if let Some(location) = &args.location {
                body["location"] = json!(location);
            }
            if let Some(description) = args.description.as_deref().map(str::trim) {
                if !description.is_empty() {
                    body["description"] = json!(description);
                }
            }
            if let Some(recurrence) = args.recurrence.as_ref().filter(|r| !r.is_empty()) {
                body["recurrence"] = json!(recurrence);
            }
            if let Some(invite) = args.guests_can_invite_others {
                body["guestsCanInviteOthers"] = json!(invite);
            }
            if let Some(see) = args.guests_can_see_other_guests {
                body["guestsCanSeeOtherGuests"] = json!(see);
            }

            let mut invalid_attendees = Vec::new();
            if let Some(attendees) = &args.attendees {
                let mut valid = Vec::new();
                for email in attendees {
                    if validate::is_valid_email(email) {
                        valid.push(json!({ "email": email }));
                    } else {
                        invalid_attendees.push(email.clone());
                    }
                }
                if !valid.is_empty() {
                    body["attendees"] = json!(valid);
                }
            }

            if args.add_google_meet_link.unwrap_or(false) {
                body["conferenceData"] = json!({
                    "createRequest": {
                        "requestId": Uuid::new_v4().to_string(),
                        "conferenceSolutionKey": { "type": "hangoutsMeet" },
                    }
                });
            }

            let url = self.client.url(
                &format!("calendar/v3/calendars/{}/events", args.calendar_id.trim()),
                &[
                    ("sendUpdates", send_updates),
                    ("conferenceDataVersion", "1".to_string()),
                ],
            )?;
            let event = self.client.post(url, &body).await?;

            let mut result = ToolResult::success().with("event", event);
            if !invalid_attendees.is_empty() {
                result = result.warning(format!(
                    "Invalid attendee emails: {}",
                    invalid_attendees.join(", ")
                ));
            }
            Ok(result)
        })
        .await
    }

    pub async fn update_event(&self, args: UpdateEventArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            if args.event_id.trim().is_empty() {
                return Ok(ToolResult::error("Event ID cannot be empty."));
            }
            if args.start_time.is_some() != args.end_time.is_some() {
                return Ok(ToolResult::error(
                    "Both start_time and end_time must be provided together.",
                ));
            }
            if args.summary.is_none()
                && args.description.is_none()
                && args.location.is_none()
                && args.start_time.is_none()
                && args.recurrence.is_none()
                && args.visibility.is_none()
                && args.transparency.is_none()
                && args.guests_can_invite_others.is_none()
                && args.guests_can_see_other_guests.is_none()
            {
                return Ok(ToolResult::error("No fields provided to update the event."));
            }
            if let Some(visibility) = &args.visibility {
                if let Some(err) = validate::check_enum("visibility", visibility, EVENT_VISIBILITY)
                {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(transparency) = &args.transparency {
                if let Some(err) =
                    validate::check_enum("transparency", transparency, EVENT_TRANSPARENCY)
                {
                    return Ok(ToolResult::error(err));
                }
            }
            if let Some(send_updates) = &args.send_updates {
                if let Some(err) =
                    validate::check_enum("send_updates", send_updates, EVENT_SEND_UPDATES)
                {
                    return Ok(ToolResult::error(err));
                }
            }

            let mut body = serde_json::Map::new();
            if let Some(summary) = &args.summary {
                if summary.trim().is_empty() {
                    return Ok(ToolResult::error("Summary cannot be empty."));
                }
                body.insert("summary".to_string(), json!(summary));
            }
            if let Some(description) = &args.description {
                body.insert("description".to_string(), json!(description));
            }
            if let Some(location) = &args.location {
                body.insert("location".to_string(), json!(location));
            }

            // The existing event supplies fallback time zones for updated
            // start/end times.
            let event_url = self.client.url(
                &format!(
                    "calendar/v3/calendars/{}/events/{}",
                    args.calendar_id, args.event_id
                ),
                &[],
            )?;
            let existing = self.client.get(event_url).await?;

            let requested_tz = args
                .time_zone
                .as_deref()
                .map(str::trim)
                .filter(|tz| validate::is_valid_timezone(tz));
            let mut bad_timezone = false;

            if let (Some(start_time), Some(end_time)) = (&args.start_time, &args.end_time) {
                if !validate::validate_rfc3339_timestamp(start_time) {
                    return Ok(invalid_timestamp("start_time", start_time));
                }
                if !validate::validate_rfc3339_timestamp(end_time) {
                    return Ok(invalid_timestamp("end_time", end_time));
                }
                for (field, time, existing_tz) in [
                    ("start", start_time, &existing["start"]["timeZone"]),
                    ("end", end_time, &existing["end"]["timeZone"]),
                ] {
                    let tz = match requested_tz {
                        Some(tz) => tz.to_string(),
                        None => {
                            let fallback = existing_tz.as_str().unwrap_or("").trim().to_string();
                            if fallback.is_empty() {
                                return Ok(ToolResult::error(format!(
                                    "Invalid time_zone provided: {}. Default timezone for {}_time could not be resolved.",
                                    args.time_zone.as_deref().unwrap_or(""),
                                    field
                                )));
                            }
                            bad_timezone = args.time_zone.is_some();
                            fallback
                        }
                    };
                    body.insert(
                        field.to_string(),
                        json!({ "dateTime": time, "timeZone": tz }),
                    );
                }
            }

            if let Some(recurrence) = args.recurrence.as_ref().filter(|r| !r.is_empty()) {
                body.insert("recurrence".to_string(), json!(recurrence));
            }
            if let Some(visibility) = &args.visibility {
                body.insert("visibility".to_string(), json!(visibility));
            }
            if let Some(transparency) = &args.transparency {
                body.insert("transparency".to_string(), json!(transparency));
            }
            if let Some(invite) = args.guests_can_invite_others {
                body.insert("guestsCanInviteOthers".to_string(), json!(invite));
            }
            if let Some(see) = args.guests_can_see_other_guests {
                body.insert("guestsCanSeeOtherGuests".to_string(), json!(see));
            }

            let mut query = vec![("conferenceDataVersion", "1".to_string())];
            if let Some(send_updates) = &args.send_updates {
                query.push(("sendUpdates", send_updates.clone()));
            }
            let url = self.client.url(
                &format!(
                    "calendar/v3/calendars/{}/events/{}",
                    args.calendar_id.trim(),
                    args.event_id.trim()
                ),
                &query,
            )?;
            let updated = self.client.patch(url, &Value::Object(body)).await?;

            let mut result = ToolResult::success().with("event", updated);
            if bad_timezone {
                result = result
                    .warning("Invalid time zone provided. Defaulted to the event's original time zone.");
            }
            Ok(result)
        })
        .await
    }

    pub async fn delete_event(&self, args: DeleteEventArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            if args.event_id.trim().is_empty() {
                return Ok(ToolResult::error("Event ID cannot be empty."));
            }
            if let Some(send_updates) = &args.send_updates {
                if let Some(err) =
                    validate::check_enum("send_updates", send_updates, EVENT_SEND_UPDATES)
                {
                    return Ok(ToolResult::error(err));
                }
            }
            let send_updates = args.send_updates.clone().unwrap_or_else(|| "none".to_string());
            let url = self.client.url(
                &format!(
                    "calendar/v3/calendars/{}/events/{}",
                    args.calendar_id.trim(),
                    args.event_id.trim()
                ),
                &[("sendUpdates", send_updates)],
            )?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Event '{}' deleted from calendar '{}'.",
                args.event_id, args.calendar_id
            )))
        })
        .await
    }

    pub async fn clear_primary_calendar(&self, args: CalendarIdArgs) -> ToolResult {
        envelope::guard(Surface::Calendar, async {
            if let Some(err) = check_calendar_id(&args.calendar_id) {
                return Ok(err);
            }
            // Clearing only applies to the primary calendar.
            let url = self
                .client
                .url(&format!("calendar/v3/calendars/{}", args.calendar_id), &[])?;
            let calendar = self.client.get(url).await?;
            if !calendar["primary"].as_bool().unwrap_or(false) {
                return Ok(ToolResult::error(
                    "Cannot clear secondary calendar. Only the primary calendar can be cleared.",
                ));
            }
            let url = self.client.url(
                &format!("calendar/v3/calendars/{}/clear", args.calendar_id),
                &[],
            )?;
            self.client.post_empty(url).await?;
            Ok(ToolResult::success_msg(format!(
                "All events from calendar {} have been cleared.",
                args.calendar_id
            )))
        })
        .await
    }
}

pub fn declarations() -> Vec<ToolSpec> {
    use super::{boolean, enumerated, integer, string, string_array};

    let calendar_id = || string("Unique id of the calendar.");
    let send_updates =
        || enumerated("Whether to send update notifications to attendees.", EVENT_SEND_UPDATES);

    vec![
        ToolSpec::new("list_calendars", "List calendars visible to the user.")
            .required("max_results", integer("Maximum number of entries per page (1-250)."))
            .optional(
                "min_access_role",
                enumerated("Minimum access role for returned entries.", ACCESS_ROLES),
            )
            .optional("show_deleted", boolean("Whether to include deleted entries."))
            .optional("show_hidden", boolean("Whether to include hidden entries.")),
        ToolSpec::new("create_calendar", "Create a secondary calendar.")
            .required("summary", string("Name of the calendar to create."))
            .optional("description", string("Description of the calendar."))
            .optional("time_zone", string("IANA time zone of the calendar, e.g. 'UTC'."))
            .optional("location", string("Geographic location of the calendar.")),
        ToolSpec::new("get_calendar", "Retrieve metadata for a calendar.")
            .required("calendar_id", calendar_id()),
        ToolSpec::new("update_calendar", "Update the metadata of a calendar.")
            .required("calendar_id", calendar_id())
            .optional("summary", string("New name of the calendar."))
            .optional("description", string("New description of the calendar."))
            .optional("location", string("New geographic location of the calendar."))
            .optional("timezone", string("New IANA time zone of the calendar.")),
        ToolSpec::new("delete_calendar", "Delete a secondary calendar.")
            .required("calendar_id", calendar_id()),
        ToolSpec::new("list_events", "List events from a calendar.")
            .required("calendar_id", calendar_id())
            .optional("query", string("Free text search terms to match events against."))
            .optional("max_results", integer("Maximum number of events to return (1-250)."))
            .optional("max_attendees", integer("Maximum number of attendees to include (1-250)."))
            .optional(
                "show_hidden_invitations",
                boolean("Whether to include hidden invitations."),
            )
            .optional("show_deleted", boolean("Whether to include deleted events."))
            .optional("time_min", string("Lower bound (RFC3339) for event end time."))
            .optional("time_max", string("Upper bound (RFC3339) for event start time."))
            .optional("time_zone", string("Time zone used in the response."))
            .optional(
                "updated_min",
                string("Lower bound (RFC3339) for an event's last modification time."),
            )
            .optional(
                "single_events",
                boolean("Whether to expand recurring events into instances."),
            )
            .optional("order_by", enumerated("Sort order of returned events.", EVENT_SORT_KEYS)),
        ToolSpec::new("get_event", "Retrieve a specific event.")
            .required("calendar_id", calendar_id())
            .required("event_id", string("Unique id of the event to retrieve."))
            .optional("max_attendees", integer("Maximum number of attendees to include (1-250)."))
            .optional("time_zone", string("Time zone used in the response.")),
        ToolSpec::new("create_event", "Create an event on a calendar.")
            .required("calendar_id", calendar_id())
            .required("summary", string("Title of the event."))
            .required("start_time", string("Start time of the event in RFC3339 format."))
            .required("end_time", string("End time of the event in RFC3339 format."))
            .optional("time_zone", string("IANA time zone of the event."))
            .optional("description", string("Description or notes for the event."))
            .optional("location", string("Geographic location of the event."))
            .optional(
                "add_google_meet_link",
                boolean("Whether to attach a Google Meet link."),
            )
            .optional("attendees", string_array("Attendee email addresses."))
            .optional("recurrence", string_array("Recurrence rules in RFC5545 format."))
            .optional("visibility", enumerated("Visibility of the event.", EVENT_VISIBILITY))
            .optional(
                "guests_can_invite_others",
                boolean("Whether attendees can invite others."),
            )
            .optional(
                "guests_can_see_other_guests",
                boolean("Whether attendees can see each other."),
            )
            .optional(
                "transparency",
                enumerated("Whether the event blocks calendar time.", EVENT_TRANSPARENCY),
            )
            .optional("send_updates", send_updates()),
        ToolSpec::new("update_event", "Update fields of an existing event.")
            .required("calendar_id", calendar_id())
            .required("event_id", string("Unique id of the event to update."))
            .optional("summary", string("New title of the event."))
            .optional("description", string("New description of the event."))
            .optional("location", string("New location of the event."))
            .optional("start_time", string("New start time in RFC3339 format."))
            .optional("end_time", string("New end time in RFC3339 format."))
            .optional("time_zone", string("IANA time zone for the new times."))
            .optional("recurrence", string_array("Recurrence rules in RFC5545 format."))
            .optional("visibility", enumerated("Visibility of the event.", EVENT_VISIBILITY))
            .optional(
                "transparency",
                enumerated("Whether the event blocks calendar time.", EVENT_TRANSPARENCY),
            )
            .optional(
                "guests_can_invite_others",
                boolean("Whether attendees can invite others."),
            )
            .optional(
                "guests_can_see_other_guests",
                boolean("Whether attendees can see each other."),
            )
            .optional("send_updates", send_updates()),
        ToolSpec::new("delete_event", "Delete an event from a calendar.")
            .required("calendar_id", calendar_id())
            .required("event_id", string("Unique id of the event to delete."))
            .optional("send_updates", send_updates()),
        ToolSpec::new("clear_primary_calendar", "Delete all events from the primary calendar.")
            .required("calendar_id", calendar_id()),
    ]
}

#[async_trait]
impl ToolSurface for CalendarTools {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn declarations(&self) -> Vec<ToolSpec> {
        declarations()
    }

    async fn call(&self, tool: &str, args: Value) -> ToolResult {
        super::dispatch_tool!(self, tool, args, {
            "list_calendars" => list_calendars,
            "create_calendar" => create_calendar,
            "get_calendar" => get_calendar,
            "update_calendar" => update_calendar,
            "delete_calendar" => delete_calendar,
            "list_events" => list_events,
            "get_event" => get_event,
            "create_event" => create_event,
            "update_event" => update_event,
            "delete_event" => delete_event,
            "clear_primary_calendar" => clear_primary_calendar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::TokenSource;
    use crate::tools::Status;

    fn tools(server: &mockito::Server) -> CalendarTools {
        CalendarTools::new(GoogleClient::new(
            server.url(),
            TokenSource::Fixed("test-token".to_string()),
        ))
    }

    #[tokio::test]
    async fn list_calendars_shapes_entries() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/calendar/v3/users/me/calendarList")
            .match_query(mockito::Matcher::Regex("maxResults=10".to_string()))
            .with_status(200)
            .with_body(
                r#"{"items": [
                    {"id": "primary", "summary": "Work", "primary": true},
                    {"id": "team", "summary": "Team", "hidden": true}
                ]}"#,
            )
            .create_async()
            .await;

        let result = tools(&server)
            .list_calendars(ListCalendarsArgs {
                max_results: 10,
                min_access_role: None,
                show_deleted: None,
                show_hidden: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        let calendars = result.get("calendars").unwrap().as_array().unwrap();
        assert_eq!(calendars[0]["calendar_id"], "primary");
        assert_eq!(calendars[0]["primary"], true);
        assert_eq!(calendars[1]["hidden"], true);
        assert_eq!(calendars[1]["deleted"], false);
    }

    #[tokio::test]
    async fn list_calendars_rejects_bad_access_role() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .list_calendars(ListCalendarsArgs {
                max_results: 10,
                min_access_role: Some("superuser".to_string()),
                show_deleted: None,
                show_hidden: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Invalid calendar access role: superuser")
        );
    }

    #[tokio::test]
    async fn create_calendar_rejects_unknown_time_zone() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .create_calendar(CreateCalendarArgs {
                summary: "Holidays".to_string(),
                description: None,
                time_zone: Some("Mars/Olympus_Mons".to_string()),
                location: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some(
                "Invalid time zone: 'Mars/Olympus_Mons'. Please provide a valid IANA time zone (e.g. Asia/Kolkata)"
            )
        );
    }

    #[tokio::test]
    async fn create_calendar_returns_web_url() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/calendar/v3/calendars")
            .with_status(200)
            .with_body(r#"{"id": "cal42", "summary": "Holidays", "timeZone": "UTC"}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .create_calendar(CreateCalendarArgs {
                summary: "Holidays".to_string(),
                description: None,
                time_zone: None,
                location: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(
            result.get("calendar_url").unwrap(),
            "https://calendar.google.com/calendar/u/0/r?cid=cal42"
        );
    }

    #[tokio::test]
    async fn delete_calendar_refuses_the_primary_calendar() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/calendar/v3/calendars/primary")
            .with_status(200)
            .with_body(r#"{"id": "primary", "primary": true}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/calendar/v3/calendars/primary")
            .expect(0)
            .create_async()
            .await;

        let result = tools(&server)
            .delete_calendar(CalendarIdArgs {
                calendar_id: "primary".to_string(),
            })
            .await;
        assert_eq!(result.status(), Status::Error);
        assert_eq!(
            result.message(),
            Some("Cannot delete the user's primary calendar.")
        );
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn clear_refuses_secondary_calendars() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/calendar/v3/calendars/team")
            .with_status(200)
            .with_body(r#"{"id": "team"}"#)
            .create_async()
            .await;
        let clear = server
            .mock("POST", "/calendar/v3/calendars/team/clear")
            .expect(0)
            .create_async()
            .await;

        let result = tools(&server)
            .clear_primary_calendar(CalendarIdArgs {
                calendar_id: "team".to_string(),
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Cannot clear secondary calendar. Only the primary calendar can be cleared.")
        );
        clear.assert_async().await;
    }

    #[tokio::test]
    async fn create_event_requires_start_before_end() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .create_event(CreateEventArgs {
                calendar_id: "primary".to_string(),
                summary: "Standup".to_string(),
                start_time: "2024-05-01T10:00:00Z".to_string(),
                end_time: "2024-05-01T09:00:00Z".to_string(),
                time_zone: None,
                description: None,
                location: None,
                add_google_meet_link: None,
                attendees: None,
                recurrence: None,
                visibility: None,
                guests_can_invite_others: None,
                guests_can_see_other_guests: None,
                transparency: None,
                send_updates: None,
            })
            .await;
        assert_eq!(result.message(), Some("start_time must be before end_time."));
    }

    #[tokio::test]
    async fn create_event_filters_invalid_attendees_with_warning() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/calendar/v3/calendars/primary/events")
            .match_query(mockito::Matcher::Regex("sendUpdates=none".to_string()))
            .with_status(200)
            .with_body(r#"{"id": "ev1", "summary": "Standup"}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .create_event(CreateEventArgs {
                calendar_id: "primary".to_string(),
                summary: "Standup".to_string(),
                start_time: "2024-05-01T09:00:00Z".to_string(),
                end_time: "2024-05-01T09:30:00Z".to_string(),
                time_zone: Some("Not/A_Zone".to_string()),
                description: None,
                location: None,
                add_google_meet_link: None,
                attendees: Some(vec![
                    "ok@example.com".to_string(),
                    "broken".to_string(),
                ]),
                recurrence: None,
                visibility: None,
                guests_can_invite_others: None,
                guests_can_see_other_guests: None,
                transparency: None,
                send_updates: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(
            result.get("warning").unwrap(),
            "Invalid attendee emails: broken"
        );
        assert_eq!(result.get("event").unwrap()["id"], "ev1");
    }

    #[tokio::test]
    async fn update_event_requires_paired_times() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .update_event(UpdateEventArgs {
                calendar_id: "primary".to_string(),
                event_id: "ev1".to_string(),
                summary: None,
                description: None,
                location: None,
                start_time: Some("2024-05-01T09:00:00Z".to_string()),
                end_time: None,
                time_zone: None,
                recurrence: None,
                visibility: None,
                transparency: None,
                guests_can_invite_others: None,
                guests_can_see_other_guests: None,
                send_updates: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Both start_time and end_time must be provided together.")
        );
    }

    #[tokio::test]
    async fn update_event_falls_back_to_the_events_time_zone() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/calendar/v3/calendars/primary/events/ev1")
            .with_status(200)
            .with_body(
                r#"{"id": "ev1",
                    "start": {"dateTime": "2024-05-01T09:00:00Z", "timeZone": "Europe/Berlin"},
                    "end": {"dateTime": "2024-05-01T09:30:00Z", "timeZone": "Europe/Berlin"}}"#,
            )
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/calendar/v3/calendars/primary/events/ev1")
            .match_query(mockito::Matcher::Regex("conferenceDataVersion=1".to_string()))
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "start": {"dateTime": "2024-06-01T10:00:00Z", "timeZone": "Europe/Berlin"},
                "end": {"dateTime": "2024-06-01T11:00:00Z", "timeZone": "Europe/Berlin"},
            })))
            .with_status(200)
            .with_body(r#"{"id": "ev1"}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .update_event(UpdateEventArgs {
                calendar_id: "primary".to_string(),
                event_id: "ev1".to_string(),
                summary: None,
                description: None,
                location: None,
                start_time: Some("2024-06-01T10:00:00Z".to_string()),
                end_time: Some("2024-06-01T11:00:00Z".to_string()),
                time_zone: Some("Not/A_Zone".to_string()),
                recurrence: None,
                visibility: None,
                transparency: None,
                guests_can_invite_others: None,
                guests_can_see_other_guests: None,
                send_updates: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(
            result.get("warning").unwrap(),
            "Invalid time zone provided. Defaulted to the event's original time zone."
        );
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn list_events_warns_on_invalid_response_time_zone() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/calendar/v3/calendars/primary/events")
            .with_status(200)
            .with_body(r#"{"items": [{"id": "ev1"}]}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .list_events(ListEventsArgs {
                calendar_id: "primary".to_string(),
                query: None,
                max_results: None,
                max_attendees: None,
                show_hidden_invitations: None,
                show_deleted: None,
                time_min: None,
                time_max: None,
                time_zone: Some("Not/A_Zone".to_string()),
                updated_min: None,
                single_events: None,
                order_by: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(
            result.get("warning").unwrap(),
            "Passed invalid time zone: 'Not/A_Zone'. Defaulted to calendar's configured timezone."
        );
    }

    #[tokio::test]
    async fn list_events_rejects_malformed_time_min() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .list_events(ListEventsArgs {
                calendar_id: "primary".to_string(),
                query: None,
                max_results: None,
                max_attendees: None,
                show_hidden_invitations: None,
                show_deleted: None,
                time_min: Some("yesterday".to_string()),
                time_max: None,
                time_zone: None,
                updated_min: None,
                single_events: None,
                order_by: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some(
                "Invalid time_min format: 'yesterday'. Expected RFC3339 format (e.g., 2023-10-01T12:00:00Z)."
            )
        );
    }
}
