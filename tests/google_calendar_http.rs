mod common;

use chrono::{FixedOffset, NaiveDate};
use common::*;
use daily_agenda::classify::{calendar_failure, messages};
use daily_agenda::components::google_calendar::{
    AccessToken, CalendarProvider, DateWindow, EventQuery, EventTime, GoogleCalendarClient,
    ScheduleFetcher,
};
use daily_agenda::error::{Error, Fault};
use mockito::Matcher;
use reqwest::{Client, StatusCode};

const EVENTS_BODY: &str = r#"{
    "kind": "calendar#events",
    "items": [
        {
            "summary": "Standup",
            "start": {"dateTime": "2025-01-01T09:00:00+07:00"},
            "end": {"dateTime": "2025-01-01T10:30:00+07:00"}
        },
        {
            "summary": "New Year",
            "start": {"date": "2025-01-01"},
            "end": {"date": "2025-01-02"}
        },
        {
            "summary": "Cancelled instance"
        }
    ]
}"#;

const QUOTA_BODY: &str = r#"{
    "error": {
        "code": 403,
        "message": "Rate Limit Exceeded",
        "errors": [{"reason": "rateLimitExceeded"}]
    }
}"#;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

fn query(calendar_id: &str) -> EventQuery {
    let window = DateWindow::new(date(), offset());
    EventQuery {
        calendar_id: calendar_id.to_string(),
        time_min: window.time_min(),
        time_max: window.time_max(),
        max_results: 50,
        single_events: true,
        order_by: "startTime",
    }
}

fn window_query() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("timeMin".into(), "2025-01-01T00:00:00+07:00".into()),
        Matcher::UrlEncoded("timeMax".into(), "2025-01-01T23:59:59+07:00".into()),
        Matcher::UrlEncoded("maxResults".into(), "50".into()),
        Matcher::UrlEncoded("singleEvents".into(), "true".into()),
        Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
    ])
}

/// A 200 page is parsed into events; events without a start are dropped
#[tokio::test]
async fn test_list_events_parses_page() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer ya29.ok")
        .match_query(window_query())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(EVENTS_BODY)
        .create_async()
        .await;

    let client =
        GoogleCalendarClient::new("unused.json", Client::new()).with_api_base(server.url());
    let events = client
        .list_events(&AccessToken::new("ya29.ok"), &query("primary"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Standup");
    assert_eq!(
        events[0].end,
        EventTime::DateTime("2025-01-01T10:30:00+07:00".to_string())
    );
    assert_eq!(events[1].start, EventTime::Date("2025-01-01".to_string()));
    assert_eq!(events[1].calendar_id, "primary");
}

/// A 403 carrying a rate-limit reason is a quota problem
#[tokio::test]
async fn test_list_events_quota_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(QUOTA_BODY)
        .create_async()
        .await;

    let client =
        GoogleCalendarClient::new("unused.json", Client::new()).with_api_base(server.url());
    let fault = client
        .list_events(&AccessToken::new("ya29.ok"), &query("primary"))
        .await
        .unwrap_err();

    assert!(matches!(
        &fault,
        Fault::Status { status, .. } if *status == StatusCode::FORBIDDEN
    ));
    assert_eq!(
        calendar_failure(&fault),
        Error::QuotaOrRateLimit(messages::CALENDAR_QUOTA)
    );
}

/// Expired credentials are refreshed and the new token is used for every calendar
#[tokio::test]
async fn test_fetch_refreshes_token_and_skips_rate_limited_calendar() {
    let (logs, _guard) = capture_logs();
    let mut server = mockito::Server::new_async().await;

    let refresh = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
            Matcher::UrlEncoded("client_id".into(), "client.apps.googleusercontent.com".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "ya29.refreshed", "expires_in": 3599}"#)
        .create_async()
        .await;
    let primary = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer ya29.refreshed")
        .match_query(window_query())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(EVENTS_BODY)
        .create_async()
        .await;
    let holidays = server
        .mock("GET", Matcher::Regex(r"^/calendars/id\.indonesian".to_string()))
        .match_header("authorization", "Bearer ya29.refreshed")
        .with_status(403)
        .with_body(QUOTA_BODY)
        .create_async()
        .await;

    let token_file = expired_credentials("refresh-ok", &format!("{}/token", server.url()));
    let client = GoogleCalendarClient::new(token_file, Client::new()).with_api_base(server.url());
    let fetcher = ScheduleFetcher::new(
        client,
        vec!["primary".to_string(), HOLIDAYS.to_string()],
        offset(),
    );

    let summary = fetcher.fetch(date()).await.unwrap();

    refresh.assert_async().await;
    primary.assert_async().await;
    holidays.assert_async().await;
    assert_eq!(
        summary,
        "Schedule for 2025-01-01:\n\
         - [2025-01-01] Standup (09:00 - 10:30)\n\
         - [2025-01-01] New Year (All-day)\n"
    );

    let logs = logs.contents();
    assert!(logs.contains(messages::CALENDAR_QUOTA));
    assert!(!logs.contains("ya29.refreshed"));
    assert!(!logs.contains("Rate Limit Exceeded"));
}

/// A rejected refresh is an authentication failure and stops the fetch
#[tokio::test]
async fn test_rejected_refresh_is_authentication() {
    let mut server = mockito::Server::new_async().await;
    let _refresh = server
        .mock("POST", "/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#)
        .create_async()
        .await;
    let events = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let token_file = expired_credentials("refresh-400", &format!("{}/token", server.url()));
    let client = GoogleCalendarClient::new(token_file, Client::new()).with_api_base(server.url());

    let fault = client.authenticate().await.unwrap_err();
    assert!(matches!(fault, Fault::Token(_)));
    assert_eq!(
        calendar_failure(&fault),
        Error::Authentication(messages::CALENDAR_AUTH)
    );

    let fetcher = ScheduleFetcher::new(client, vec!["primary".to_string()], offset());
    assert_eq!(
        fetcher.fetch(date()).await.unwrap_err(),
        Error::Authentication(messages::CALENDAR_AUTH)
    );
    events.assert_async().await;
}

/// Refresh answers without a usable token are authentication failures
#[tokio::test]
async fn test_refresh_without_access_token() {
    for (name, body) in [
        ("refresh-missing", r#"{"expires_in": 3599, "token_type": "Bearer"}"#),
        ("refresh-empty", r#"{"access_token": ""}"#),
        ("refresh-garbage", "<html>oops</html>"),
    ] {
        let mut server = mockito::Server::new_async().await;
        let _refresh = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let token_file = expired_credentials(name, &format!("{}/token", server.url()));
        let client = GoogleCalendarClient::new(token_file, Client::new());

        let fault = client.authenticate().await.unwrap_err();
        assert!(matches!(fault, Fault::Token(_)), "{}", name);
        assert_eq!(
            calendar_failure(&fault),
            Error::Authentication(messages::CALENDAR_AUTH)
        );
    }
}

/// An unreachable token endpoint is a network problem, whatever its URL says
#[tokio::test]
async fn test_unreachable_token_endpoint_is_network() {
    let token_file = expired_credentials("refresh-down", "http://127.0.0.1:1/token");
    let client = GoogleCalendarClient::new(token_file, Client::new());

    let fault = client.authenticate().await.unwrap_err();

    assert!(matches!(fault, Fault::Http(_)));
    assert!(!format!("{:?}", fault).contains("127.0.0.1:1/token"));
    assert_eq!(
        calendar_failure(&fault),
        Error::Network(messages::CALENDAR_NETWORK)
    );
}
