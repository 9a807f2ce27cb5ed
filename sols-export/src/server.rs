use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use sols_timetable::{generate_ics, parse_timetable, AcademicCalendar, Timetable, FILENAME};
use tokio::{net::TcpListener, signal};

pub struct AppState {
    pub calendar: AcademicCalendar,
    pub year: i32,
}

#[derive(Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    #[serde(default)]
    json: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/calendar", post(handle_calendar))
        .route("/ics", post(handle_events))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(address: SocketAddr, state: Arc<AppState>) -> io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("Listening at http://{address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }

    info!("Shutting down");
}

/// Accepts the HTML of a "My Timetable" page.
async fn handle_calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
    page: String,
) -> Response {
    let timetable = parse_timetable(page);

    if timetable.events.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "No timetable entries found. Make sure you sent the My Timetable page.",
        )
            .into_response();
    }

    if query.json {
        return Json(timetable).into_response();
    }

    calendar_response(&state, &timetable, query.year)
}

/// Accepts classes that were already extracted from the page.
async fn handle_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
    Json(timetable): Json<Timetable>,
) -> Response {
    if timetable.events.is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "No classes to export").into_response();
    }

    calendar_response(&state, &timetable, query.year)
}

fn calendar_response(state: &AppState, timetable: &Timetable, year: Option<i32>) -> Response {
    let year = year.unwrap_or(state.year);
    info!(
        "Generating ICS for {} classes in {year}",
        timetable.events.len()
    );

    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{FILENAME}\""),
            ),
        ],
        generate_ics(&timetable.events, &state.calendar, year),
    )
        .into_response()
}
