// src/core/calendar_client.rs
//! Interview meetings through a Google-Calendar-style events API

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::app_log;
use crate::core::config_manager::CalendarSettings;
use crate::core::ServiceClient;

#[derive(Debug, Clone)]
pub struct MeetingRequest {
    pub summary: String,
    pub description: String,
    pub attendee_email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    request_id: String,
    conference_solution_key: ConferenceSolutionKey,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    create_request: CreateRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime,
    end: EventTime,
    attendees: Vec<Attendee<'a>>,
    conference_data: ConferenceData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    hangout_link: Option<String>,
    html_link: Option<String>,
}

pub struct CalendarClient {
    client: Option<ServiceClient>,
    calendar_id: String,
    timezone: String,
}

impl CalendarClient {
    pub fn new(settings: &CalendarSettings) -> Result<Self> {
        let client = match settings.api_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                let mut headers = HeaderMap::new();
                let (name, value) =
                    ServiceClient::header("authorization", &format!("Bearer {}", token))?;
                headers.insert(name, value);
                Some(ServiceClient::new(
                    &settings.base_url,
                    settings.timeout_seconds,
                    headers,
                )?)
            }
            None => {
                app_log!(warn, "Calendar API token not configured, interviews get no meeting link");
                None
            }
        };

        Ok(Self {
            client,
            calendar_id: settings.calendar_id.clone(),
            timezone: settings.timezone.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Create the event and return its meeting link; `Ok(None)` when the calendar integration is disabled.
    pub async fn create_meeting(&self, request: &MeetingRequest) -> Result<Option<String>> {
        let Some(client) = &self.client else {
            app_log!(
                info,
                "Calendar disabled, skipping meeting '{}' for {}",
                request.summary,
                request.attendee_email
            );
            return Ok(None);
        };

        if request.end <= request.start {
            anyhow::bail!("Meeting must end after it starts");
        }

        let endpoint = format!(
            "/calendars/{}/events?conferenceDataVersion=1&sendUpdates=all",
            self.calendar_id
        );
        let payload = self.payload(request);
        let event: EventResponse = client.post_json(&endpoint, &payload).await?;

        let meeting_link = event
            .hangout_link
            .or(event.html_link)
            .ok_or_else(|| anyhow::anyhow!("Calendar event {} has no link", event.id))?;

        app_log!(
            info,
            "Created calendar event {} for {}",
            event.id,
            request.attendee_email
        );
        Ok(Some(meeting_link))
    }

    fn payload<'a>(&self, request: &'a MeetingRequest) -> EventPayload<'a> {
        EventPayload {
            summary: &request.summary,
            description: &request.description,
            start: EventTime {
                date_time: request.start.to_rfc3339(),
                time_zone: self.timezone.clone(),
            },
            end: EventTime {
                date_time: request.end.to_rfc3339(),
                time_zone: self.timezone.clone(),
            },
            attendees: vec![Attendee {
                email: &request.attendee_email,
            }],
            conference_data: ConferenceData {
                create_request: CreateRequest {
                    request_id: uuid::Uuid::new_v4().to_string(),
                    conference_solution_key: ConferenceSolutionKey { kind: "hangoutsMeet" },
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> MeetingRequest {
        let start = Utc::now();
        MeetingRequest {
            summary: "Interview".to_string(),
            description: "Backend role".to_string(),
            attendee_email: "seeker@example.com".to_string(),
            start,
            end: start + Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn test_disabled_calendar_returns_none() {
        let client = CalendarClient::new(&CalendarSettings::default()).unwrap();
        assert!(!client.is_enabled());
        assert_eq!(client.create_meeting(&request()).await.unwrap(), None);
    }

    #[test]
    fn test_payload_shape() {
        let client = CalendarClient::new(&CalendarSettings::default()).unwrap();
        let req = request();
        let json = serde_json::to_value(client.payload(&req)).unwrap();
        assert_eq!(json["attendees"][0]["email"], "seeker@example.com");
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert_eq!(
            json["conferenceData"]["createRequest"]["conferenceSolutionKey"]["type"],
            "hangoutsMeet"
        );
    }
}
