//! Catalog write client for the spreadsheet script endpoint.
//!
//! The script answers with `{"success": true, "id": 12}` or
//! `{"success": false, "error": "..."}`. Some deployments answer with an
//! empty or HTML body; those are accepted as unconfirmed successes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use catalog_desk_core::ProductId;

use super::{CatalogAck, CatalogAction, CatalogError, CatalogStore, CatalogWrite};
use crate::config::CatalogConfig;

/// Client for the catalog script endpoint.
#[derive(Clone)]
pub struct ScriptCatalogClient {
    inner: Arc<ScriptCatalogClientInner>,
}

struct ScriptCatalogClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl ScriptCatalogClient {
    /// Create a new script client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ScriptCatalogClientInner {
                client,
                endpoint: config.script_url.clone(),
            }),
        })
    }
}

#[async_trait]
impl CatalogStore for ScriptCatalogClient {
    #[instrument(skip(self, request), fields(action = %request.action, id = ?request.id))]
    async fn write(&self, request: &CatalogWrite) -> Result<CatalogAck, CatalogError> {
        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(request.action, status, &body)
    }
}

/// Turn a script response into an acknowledgement or an error.
pub(crate) fn interpret_response(
    action: CatalogAction,
    status: u16,
    body: &str,
) -> Result<CatalogAck, CatalogError> {
    if !(200..300).contains(&status) {
        return Err(CatalogError::Api {
            status,
            message: truncate(body, 200),
        });
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        tracing::debug!(%action, "catalog store returned no JSON body, assuming success");
        return Ok(CatalogAck {
            id: None,
            confirmed: false,
        });
    };

    if json.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(CatalogError::Rejected {
            action,
            message: error_message(&json),
        });
    }

    let id = json
        .get("id")
        .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
        .map(ProductId::new);

    Ok(CatalogAck {
        id,
        confirmed: true,
    })
}

/// Extract a human-readable message from `error` (string or `{message}`).
fn error_message(json: &Value) -> String {
    json.get("error")
        .and_then(|e| e.as_str().or_else(|| e.get("message")?.as_str()))
        .or_else(|| json.get("message").and_then(Value::as_str))
        .unwrap_or("no reason given")
        .to_string()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_id() {
        let ack = interpret_response(CatalogAction::Add, 200, r#"{"success":true,"id":14}"#).unwrap();
        assert_eq!(ack.id, Some(ProductId::new(14)));
        assert!(ack.confirmed);
    }

    #[test]
    fn test_string_id_is_parsed() {
        let ack = interpret_response(CatalogAction::Add, 200, r#"{"success":true,"id":"15"}"#).unwrap();
        assert_eq!(ack.id, Some(ProductId::new(15)));
    }

    #[test]
    fn test_unreadable_body_is_unconfirmed_success() {
        let ack = interpret_response(CatalogAction::Update, 200, "<html>ok</html>").unwrap();
        assert_eq!(ack, CatalogAck { id: None, confirmed: false });

        let ack = interpret_response(CatalogAction::Delete, 200, "").unwrap();
        assert!(!ack.confirmed);
    }

    #[test]
    fn test_success_false_is_rejection() {
        let err = interpret_response(
            CatalogAction::Update,
            200,
            r#"{"success":false,"error":"Product not found"}"#,
        )
        .unwrap_err();
        match err {
            CatalogError::Rejected { action, message } => {
                assert_eq!(action, CatalogAction::Update);
                assert_eq!(message, "Product not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_error_message() {
        let err = interpret_response(
            CatalogAction::Add,
            200,
            r#"{"success":false,"error":{"message":"Sheet locked"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Sheet locked"));
    }

    #[test]
    fn test_non_2xx_is_api_error() {
        let err = interpret_response(CatalogAction::Delete, 500, "boom").unwrap_err();
        assert!(matches!(err, CatalogError::Api { status: 500, .. }));
    }
}
