use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{
    error::StoreError,
    models::trip::{NewTrip, Trip, TripPatch},
    services::store::{not_found, TripStore},
};

const TABLE: &str = "trips";

/// Client for a hosted PostgREST API (the REST surface of the backing service).
#[derive(Debug, Clone)]
pub struct RestTripStore {
    http: Client,
    table_url: Url,
    api_key: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl RestTripStore {
    /// `project_url` is the service root; requests go to `{project_url}/rest/v1/trips`.
    pub fn new(
        project_url: &Url,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, StoreError> {
        let table_url = project_url
            .join("rest/v1/")
            .and_then(|base| base.join(TABLE))
            .map_err(|err| StoreError::new(format!("invalid store url: {err}")))?;
        let http = Client::builder()
            .user_agent(concat!("trip-planner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            table_url,
            api_key: api_key.into(),
            access_token,
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn request(&self, method: Method, filter_id: Option<&str>) -> RequestBuilder {
        let mut url = self.table_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            match filter_id {
                Some(id) => {
                    query.append_pair("id", &format!("eq.{id}"));
                }
                None if method == Method::GET => {
                    query.append_pair("order", "created_at.desc");
                }
                None => {}
            }
        }
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn returning(builder: RequestBuilder) -> RequestBuilder {
        builder.header("Prefer", "return=representation")
    }
}

#[async_trait]
impl TripStore for RestTripStore {
    async fn select_all(&self) -> Result<Vec<Trip>, StoreError> {
        let res = self.request(Method::GET, None).send().await?;
        read_rows(res).await
    }

    async fn insert(&self, trip: &NewTrip) -> Result<Trip, StoreError> {
        let res = Self::returning(self.request(Method::POST, None))
            .json(&[trip])
            .send()
            .await?;
        read_rows(res)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::new("insert returned no rows"))
    }

    async fn update(&self, id: &str, patch: &TripPatch) -> Result<Trip, StoreError> {
        let res = Self::returning(self.request(Method::PATCH, Some(id)))
            .json(patch)
            .send()
            .await?;
        single_row(id, read_rows(res).await?)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let res = Self::returning(self.request(Method::DELETE, Some(id)))
            .send()
            .await?;
        single_row(id, read_rows(res).await?).map(|_| ())
    }
}

fn single_row(id: &str, rows: Vec<Trip>) -> Result<Trip, StoreError> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(trip), None) => Ok(trip),
        (None, _) => Err(not_found(id)),
        (Some(_), Some(_)) => Err(StoreError::new(format!(
            "expected one trip with id {id}, store returned several"
        ))),
    }
}

async fn read_rows(res: Response) -> Result<Vec<Trip>, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<Vec<Trip>>().await?);
    }

    let body = res.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("store returned {status}"));
    warn!(%status, "store request failed: {message}");
    Err(StoreError::new(message))
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    let mut message = parsed.message?;
    for extra in [parsed.details, parsed.hint].into_iter().flatten() {
        message.push_str(" (");
        message.push_str(&extra);
        message.push(')');
    }
    Some(message)
}
