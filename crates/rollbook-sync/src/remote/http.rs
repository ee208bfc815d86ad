//! JSON-over-HTTP remote store.
//!
//! `GET  {base}/v1/documents/{collection}/{id}` returns `{"data": ...}` or 404.
//! `PUT  {base}/v1/documents/{collection}/{id}[?merge=true]` with `{"data": ...}`.
//!
//! `collection` and `id` are each sent as one percent-encoded path segment.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rollbook_core::config::RemoteConfig;
use rollbook_core::errors::RemoteFailure;
use rollbook_core::models::SetOptions;
use rollbook_core::traits::RemoteDocumentStore;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Body of both directions.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentEnvelope {
    data: Value,
}

pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(config: &RemoteConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &RemoteConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.bearer_token().map(str::to_string),
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, RemoteFailure> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RemoteFailure::new("invalid-argument", format!("bad base url {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RemoteFailure::new(
                    "invalid-argument",
                    format!("base url {} cannot carry a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(["v1", "documents", collection, id]);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        match &self.api_key {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn transport_failure(e: reqwest::Error) -> RemoteFailure {
    let code = if e.is_timeout() {
        "deadline-exceeded"
    } else {
        "unavailable"
    };
    RemoteFailure::new(code, e.to_string())
}

async fn status_failure(response: reqwest::Response) -> RemoteFailure {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };
    RemoteFailure::new(status.as_u16().to_string(), message)
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT
}

async fn error_for(response: reqwest::Response) -> RemoteFailure {
    let transient = is_transient_status(response.status());
    let failure = status_failure(response).await;
    if transient {
        RemoteFailure::new("unavailable", failure.to_string())
    } else {
        failure
    }
}

#[async_trait]
impl RemoteDocumentStore for HttpDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RemoteFailure> {
        let url = self.document_url(collection, id)?;
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(transport_failure)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        let envelope: DocumentEnvelope = response.json().await.map_err(|e| {
            RemoteFailure::new("invalid-response", format!("cannot decode document: {e}"))
        })?;
        Ok(Some(envelope.data))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: &Value,
        options: SetOptions,
    ) -> Result<(), RemoteFailure> {
        let url = self.document_url(collection, id)?;
        let mut request = self.request(reqwest::Method::PUT, url);
        if options.merge {
            request = request.query(&[("merge", "true")]);
        }
        let response = request
            .json(&DocumentEnvelope { data: doc.clone() })
            .send()
            .await
            .map_err(transport_failure)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_for(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_strips_trailing_slash() {
        let config = RemoteConfig {
            base_url: "https://docs.example.test/".to_string(),
            api_key: String::new(),
        };
        let store = HttpDocumentStore::new(&config);
        let url = store.document_url("rosters", "class-7").unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.example.test/v1/documents/rosters/class-7"
        );
        assert!(store.api_key.is_none());
    }

    #[test]
    fn document_url_encodes_each_segment() {
        let config = RemoteConfig {
            base_url: "https://docs.example.test/api/".to_string(),
            api_key: String::new(),
        };
        let store = HttpDocumentStore::new(&config);

        let url = store.document_url("classes", "7/roster?x").unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.example.test/api/v1/documents/classes/7%2Froster%3Fx"
        );
        assert!(url.query().is_none());

        let nested = store.document_url("classes/7", "roster").unwrap();
        assert_ne!(nested, url);
        assert_eq!(nested.path(), "/api/v1/documents/classes%2F7/roster");
    }

    #[test]
    fn unparseable_base_url_is_an_invalid_argument() {
        let config = RemoteConfig {
            base_url: "not a url".to_string(),
            api_key: String::new(),
        };
        let store = HttpDocumentStore::new(&config);
        let failure = store.document_url("rosters", "class-7").unwrap_err();
        assert_eq!(failure.code.as_deref(), Some("invalid-argument"));
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
    }
}
