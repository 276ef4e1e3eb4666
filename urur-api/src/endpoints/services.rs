use crate::macros::setter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::header::{HeaderMap, HeaderValue};
use tower_api_client::{Method, Request, RequestData};
use uuid::Uuid;

/// Where a listing was submitted from
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceSource {
    #[default]
    Cli,
    Web,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub source: ServiceSource,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row inserted into `services`; optional fields left unset are sent as null
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewService {
    user_id: Uuid,
    name: String,
    url: String,
    tagline: Option<String>,
    description: Option<String>,
    logo_url: Option<String>,
    source: ServiceSource,
}

impl NewService {
    pub fn new(user_id: Uuid, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            url: url.into(),
            tagline: None,
            description: None,
            logo_url: None,
            source: ServiceSource::Cli,
        }
    }

    setter!(opt tagline: String);
    setter!(opt description: String);
    setter!(opt logo_url: String);
}

// Requests

#[derive(Debug, Clone)]
pub struct CreateService {
    service: NewService,
}

impl CreateService {
    pub fn new(service: NewService) -> Self {
        Self { service }
    }
}

impl Request for CreateService {
    type Data = NewService;
    type Response = Vec<Service>;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/rest/v1/services".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.service)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}
