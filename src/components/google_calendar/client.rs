use super::models::{CalendarEvent, EventQuery, EventsPage};
use super::token::{AccessToken, TokenManager};
use crate::error::Fault;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Base URL of the Calendar REST API
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Read-only access to a calendar backend
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Obtain credentials for the following queries
    async fn authenticate(&self) -> Result<AccessToken, Fault>;

    /// List the events of one calendar matching `query`, in provider order
    async fn list_events(
        &self,
        token: &AccessToken,
        query: &EventQuery,
    ) -> Result<Vec<CalendarEvent>, Fault>;
}

/// Google Calendar over its REST API
#[derive(Clone)]
pub struct GoogleCalendarClient {
    token_manager: TokenManager,
    client: Client,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Create a client reading credentials from `token_file`
    pub fn new(token_file: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            token_manager: TokenManager::new(token_file, client.clone()),
            client,
            api_base: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build the `events.list` URL for a query
    pub fn events_url(&self, query: &EventQuery) -> Result<Url, Fault> {
        let mut url = Url::parse(&self.api_base)?;

        url.path_segments_mut()
            .map_err(|_| Fault::Other("calendar API base cannot hold a path".to_string()))?
            .pop_if_empty()
            .push("calendars")
            .push(&query.calendar_id)
            .push("events");

        url.query_pairs_mut()
            .append_pair("timeMin", &query.time_min)
            .append_pair("timeMax", &query.time_max)
            .append_pair("maxResults", &query.max_results.to_string())
            .append_pair("singleEvents", &query.single_events.to_string())
            .append_pair("orderBy", query.order_by);

        Ok(url)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn authenticate(&self) -> Result<AccessToken, Fault> {
        self.token_manager.get_token().await
    }

    async fn list_events(
        &self,
        token: &AccessToken,
        query: &EventQuery,
    ) -> Result<Vec<CalendarEvent>, Fault> {
        let url = self.events_url(query)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Fault::Status { status, body });
        }

        let page: EventsPage = response.json().await?;
        let total = page.items.len();

        let events: Vec<CalendarEvent> = page
            .items
            .iter()
            .filter_map(|event| CalendarEvent::from_api(event, &query.calendar_id))
            .collect();

        if events.len() < total {
            debug!(
                "Skipped {} event(s) without a start in {}",
                total - events.len(),
                query.calendar_id
            );
        }

        Ok(events)
    }
}
