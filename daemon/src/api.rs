//! The wallpaper web API, mounted at `/api/v1/wallpapers`.
//!
//! - `GET /channels`
//! - `GET /channels/{channel}/all?year=&month=&start=`
//! - `GET /channels/{channel}/{year}/{month}/{day}`
//! - `GET /channels/{channel}/{year}/{month}/{day}/image-url?width=&height=&raw=`

use std::path::Path;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path as UrlPath, Query, State, rejection::PathRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use log::error;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_http::{cors::CorsLayer, services::ServeDir};

use aiad_storage::{
    channels::Channels,
    db::{Database, DateFilter},
    errors::Error,
    record::Record,
};

/// The maximum number of wallpapers in a page.
pub const PAGE_SIZE: usize = 20;

pub const API_PREFIX: &str = "/api/v1/wallpapers";

#[derive(Clone, Debug)]
pub struct AppState {
    pub channels: Channels,
}

/// Errors of the API, rendered as `{"error": "..."}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] Error),
    #[error("{year:04}-{month:02}-{day:02} is not a valid date.")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error(transparent)]
    Path(#[from] PathRejection),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDate { .. } => StatusCode::NOT_FOUND,
            Self::Path(rejection) => rejection.status(),
            Self::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Like [`UrlPath`], but a path that doesn't deserialize is answered with an [`ApiError`].
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let UrlPath(value) = UrlPath::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Build the application: the API, plus static files from `public_dir` for every other path.
#[must_use]
pub fn router(channels: Channels, public_dir: Option<&Path>, allow_cors: bool) -> Router {
    let api = Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/{channel}/all", get(list_wallpapers))
        .route("/channels/{channel}/{year}/{month}/{day}", get(get_wallpaper))
        .route(
            "/channels/{channel}/{year}/{month}/{day}/image-url",
            get(get_image_url),
        )
        .with_state(AppState { channels });

    let mut app = Router::new().nest(API_PREFIX, api);
    if let Some(public_dir) = public_dir {
        app = app.fallback_service(ServeDir::new(public_dir));
    }
    if allow_cors {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// The first date to include, usually the `next_page_token` of the previous page.
    pub start: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageItem {
    pub date: NaiveDate,
    pub wallpaper: Record,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub items: Vec<PageItem>,
    /// Pass as `start` to get the next page, `None` on the last page.
    pub next_page_token: Option<NaiveDate>,
}

/// Collect up to `size` records of `db` in chronological order.
///
/// # Errors
///
/// Fails if one of the records can't be loaded.
pub fn page(db: &Database, query: &ListQuery, size: usize) -> Result<Page, Error> {
    let mut items = Vec::new();
    let dates = db
        .all(DateFilter::new(query.year, query.month))
        .filter(|date| query.start.is_none_or(|start| *date >= start));

    for date in dates {
        if items.len() >= size {
            return Ok(Page {
                items,
                next_page_token: Some(date),
            });
        }
        items.push(PageItem {
            date,
            wallpaper: db.load(date)?,
        });
    }

    Ok(Page {
        items,
        next_page_token: None,
    })
}

fn date(year: i32, month: u32, day: u32) -> ApiResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ApiError::InvalidDate { year, month, day })
}

pub async fn list_channels(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.channels.names())
}

pub async fn list_wallpapers(
    State(state): State<AppState>,
    ApiPath(channel): ApiPath<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page>> {
    let db = state.channels.database(&channel)?;
    Ok(Json(page(&db, &query, PAGE_SIZE)?))
}

pub async fn get_wallpaper(
    State(state): State<AppState>,
    ApiPath((channel, year, month, day)): ApiPath<(String, i32, u32, u32)>,
) -> ApiResult<Json<Record>> {
    let db = state.channels.database(&channel)?;
    Ok(Json(db.load(date(year, month, day)?)?))
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageUrlQuery {
    pub width: u32,
    pub height: u32,
    /// Respond with the bare URL as `text/plain` instead of a JSON string.
    #[serde(default)]
    pub raw: bool,
}

pub async fn get_image_url(
    State(state): State<AppState>,
    ApiPath((channel, year, month, day)): ApiPath<(String, i32, u32, u32)>,
    Query(ImageUrlQuery { width, height, raw }): Query<ImageUrlQuery>,
) -> ApiResult<Response> {
    let db = state.channels.database(&channel)?;
    let mut record = db.load(date(year, month, day)?)?;
    // files written by hand may not be normalized
    record.normalize();
    let image = record
        .smallest_at_least(width, height)
        .ok_or(Error::ResolutionUnavailable { width, height })?;

    let url = image.image_url.clone();
    Ok(if raw {
        url.into_response()
    } else {
        Json(url).into_response()
    })
}
