use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use http::Uri;
use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LoginFailureReason {
    MissingUsername,
    MissingStoredState,
    StateMismatch,
}

#[derive(Debug)]
pub enum EventFormIssue {
    EndBeforeStart,
    NoParticipants,
    StartInPast,
}

#[derive(Debug)]
pub enum WhatToParse {
    CalendarMonth,
    CalendarYear,
}

#[derive(Debug)]
pub enum FileIdentifier {
    Const(&'static str),
    Runtime(String),
    PB(PathBuf),
}

impl From<&'static str> for FileIdentifier {
    fn from(value: &'static str) -> Self {
        Self::Const(value)
    }
}
impl From<String> for FileIdentifier {
    fn from(value: String) -> Self {
        Self::Runtime(value)
    }
}
impl From<PathBuf> for FileIdentifier {
    fn from(value: PathBuf) -> Self {
        Self::PB(value)
    }
}

#[derive(Debug)]
pub enum IOAction {
    ReadingFile(FileIdentifier),
}

#[derive(Debug)]
pub enum SerdeJsonAction {
    TokenResponse,
    IdentityResponse,
}

#[derive(Debug)]
pub enum ReqwestAction {
    ExchangingAuthCode,
    FetchingIdentity,
    ErrorForStatus(Option<StatusCode>),
}

#[derive(Debug)]
pub enum LiquidAction {
    BuildingCompiler,
    Parsing { text: String },
    Rendering,
}

#[derive(Debug)]
pub enum ThreadReason {
    LiquidCompiler,
}

#[derive(Debug)]
pub enum DatabaseIDMethod {
    Id(i32),
    Username(String),
}
impl From<i32> for DatabaseIDMethod {
    fn from(value: i32) -> Self {
        Self::Id(value)
    }
}
impl From<String> for DatabaseIDMethod {
    fn from(value: String) -> Self {
        Self::Username(value)
    }
}
impl From<&str> for DatabaseIDMethod {
    fn from(value: &str) -> Self {
        Self::Username(value.to_string())
    }
}

#[derive(Debug)]
pub enum SqlxAction {
    AcquiringConnection,

    FindingEvent(i32),
    UpdatingEvent(i32),
    RemovingEvent(i32),
    AddingEvent,
    FindingEventsInRange,
    FindingAllEvents,

    FindingUser(DatabaseIDMethod),
    AddingUser,
    CheckingForUsername(String),
    StoringAccessToken(i32),

    FindingProfile(DatabaseIDMethod),
    UpdatingProfile(DatabaseIDMethod),
    FindingRole(i32),

    FindingPositions,
    FindingTeamAreas,
    FindingUsers,
}

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum AlmanacError {
    //external errors
    #[snafu(display("Database Error: {source:?}. Cause: {action:?}"))]
    Sqlx {
        source: sqlx::Error,
        action: SqlxAction,
    },
    #[snafu(display("Migration Error: {source:?}"), context(false))]
    Migrate {
        source: sqlx::migrate::MigrateError,
    },
    #[snafu(display("Liquid Error: {source:?} caused by {attempt:?}"))]
    Liquid {
        source: liquid::Error,
        attempt: LiquidAction,
    },
    #[snafu(display("IO Error: {source:?} doing {action:?}"))]
    IO {
        source: std::io::Error,
        action: IOAction,
    },
    #[snafu(display("Tokio Join Error: {source:?} which was started to {title:?}"))]
    Join {
        source: tokio::task::JoinError,
        title: ThreadReason,
    },
    #[snafu(display("Error Parsing Integer: {source:?} trying to get a {what_to_convert_to:?}"))]
    ParseInt {
        source: std::num::ParseIntError,
        what_to_convert_to: WhatToParse,
    },
    #[snafu(display("Error Parsing {original:?} - {source:?}"))]
    ParseDate {
        source: chrono::ParseError,
        original: String,
    },
    #[snafu(display("JSON error: {source:?} whilst trying to {action:?}"))]
    SerdeJson {
        source: serde_json::Error,
        action: SerdeJsonAction,
    },
    #[snafu(display("Error reqwest-ing: {source:?} whilst trying to {action:?}"))]
    Reqwest {
        source: reqwest::Error,
        action: ReqwestAction,
    },
    #[snafu(display("Session Error: {source:?}"), context(false))]
    Session {
        source: tower_sessions::session::Error,
    },
    #[snafu(display("Not able to find page {was_looking_for:?}"))]
    PageNotFound { was_looking_for: Uri },

    // internal errors
    #[snafu(display("Invalid calendar query: year {year}, month {month}"))]
    InvalidCalendarQuery { year: i32, month: u32 },
    #[snafu(display("Invalid event form: {issue:?}"))]
    InvalidEventForm { issue: EventFormIssue },
    #[snafu(display("Failure to login due to {reason:?}"))]
    LoginFailure { reason: LoginFailureReason },
}

///axum-login wraps backend errors - unwrap ours, keep session errors as-is
impl From<axum_login::Error<crate::auth::backend::AlmanacAuthBackend>> for AlmanacError {
    fn from(value: axum_login::Error<crate::auth::backend::AlmanacAuthBackend>) -> Self {
        match value {
            axum_login::Error::Session(source) => Self::Session { source },
            axum_login::Error::Backend(error) => error,
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn get_error_page(error_code: StatusCode, content: AlmanacError) -> (StatusCode, Html<String>) {
    error!(?content, ?error_code, "Dealing with Error page");

    (
        error_code,
        Html(format!(
            include_str!("../www/server_error.html"),
            error = content,
            code = error_code
        )),
    )
}

#[axum::debug_handler]
pub async fn not_found_fallback(uri: Uri) -> (StatusCode, Html<String>) {
    get_error_page(
        StatusCode::NOT_FOUND,
        AlmanacError::PageNotFound {
            was_looking_for: uri,
        },
    )
}

impl IntoResponse for AlmanacError {
    fn into_response(self) -> axum::response::Response {
        let code = match &self {
            AlmanacError::Sqlx {
                source: _,
                action: trying_to_do,
            } if !matches!(trying_to_do, SqlxAction::AcquiringConnection) => StatusCode::NOT_FOUND,
            AlmanacError::ParseInt { .. }
            | AlmanacError::ParseDate { .. }
            | AlmanacError::InvalidCalendarQuery { .. }
            | AlmanacError::InvalidEventForm { .. } => StatusCode::BAD_REQUEST,
            AlmanacError::LoginFailure { .. } => StatusCode::FORBIDDEN,
            AlmanacError::PageNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        get_error_page(code, self).into_response()
    }
}
