//! Catalog listing client.

use std::sync::Arc;

use tracing::{debug, warn};

use super::dto::ImageRecord;
use crate::domain::entities::ImageDescriptor;
use crate::domain::errors::CatalogError;
use crate::domain::ports::{HttpTransport, TransportError};

/// Catalog service used when none is configured.
pub const DEFAULT_CATALOG_BASE: &str = "https://picsum.photos";

/// Descriptors requested per page when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Stateless client for `GET {base}/v2/list?page={n}&limit={m}`.
#[derive(Clone)]
pub struct CatalogClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Creates client with the default catalog base URL.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_base_url(transport, DEFAULT_CATALOG_BASE)
    }

    /// Creates client with custom base URL.
    #[must_use]
    pub fn with_base_url(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the listing endpoint.
    #[must_use]
    pub fn list_url(&self) -> String {
        format!("{}/v2/list", self.base_url)
    }

    /// Fetches one page of descriptors in catalog order.
    ///
    /// Malformed records are dropped; an empty or fully malformed listing
    /// yields an empty vector.
    ///
    /// # Errors
    /// Returns `CatalogError::Network` on connectivity failures or non-2xx
    /// answers and `CatalogError::Parse` when the body is not a JSON array.
    pub async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<ImageDescriptor>, CatalogError> {
        let url = self.list_url();
        let query = [
            ("page".to_string(), page_number.to_string()),
            ("limit".to_string(), page_size.to_string()),
        ];

        debug!(url = %url, page = page_number, limit = page_size, "Requesting catalog page");

        let response = self.transport.get(&url, &query).await.map_err(|e| {
            warn!(page = page_number, error = %e, "Catalog request failed");
            match e {
                TransportError::Timeout => CatalogError::network("request timed out"),
                TransportError::Connect { message } => {
                    CatalogError::network(format!("failed to connect: {message}"))
                }
                TransportError::Other { message } => CatalogError::network(message),
            }
        })?;

        if !response.is_success() {
            warn!(page = page_number, status = response.status, "Catalog returned error status");
            return Err(CatalogError::network(format!(
                "catalog returned HTTP {}",
                response.status
            )));
        }

        let descriptors = parse_page(&response.body)?;
        debug!(page = page_number, count = descriptors.len(), "Catalog page parsed");
        Ok(descriptors)
    }
}

/// Parses a listing body record by record.
///
/// # Errors
/// Returns `CatalogError::Parse` if the body is not a JSON array.
pub fn parse_page(body: &[u8]) -> Result<Vec<ImageDescriptor>, CatalogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| CatalogError::parse(format!("invalid JSON: {e}")))?;

    let serde_json::Value::Array(records) = value else {
        return Err(CatalogError::parse("expected a JSON array of images"));
    };

    let total = records.len();
    let descriptors: Vec<ImageDescriptor> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            match ImageRecord::try_from(value).and_then(ImageDescriptor::try_from) {
                Ok(descriptor) => Some(descriptor),
                Err(reason) => {
                    debug!(index = index, reason = %reason, "Dropping catalog record");
                    None
                }
            }
        })
        .collect();

    if descriptors.len() < total {
        debug!(
            kept = descriptors.len(),
            dropped = total - descriptors.len(),
            "Catalog page contained malformed records"
        );
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{HttpResponse, MockHttpTransport};
    use test_case::test_case;

    fn client_with(mock: MockHttpTransport) -> CatalogClient {
        CatalogClient::with_base_url(Arc::new(mock), "http://catalog.test/")
    }

    #[test]
    fn test_record_missing_url_is_dropped() {
        let body = br#"[{"id":"1","download_url":"http://x/1.jpg"},{"id":"2"}]"#;
        let descriptors = parse_page(body).unwrap();
        assert_eq!(descriptors, vec![ImageDescriptor::new("1", "http://x/1.jpg")]);
    }

    #[test]
    fn test_order_is_preserved_and_extra_fields_ignored() {
        let body = br#"[
            {"id":"3","author":"a","width":10,"download_url":"http://x/3.jpg"},
            {"id":"1","download_url":"http://x/1.jpg","url":"http://unsplash"},
            {"id":"2","download_url":"http://x/2.jpg"}
        ]"#;
        let ids: Vec<_> = parse_page(body)
            .unwrap()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test_case(b"" ; "empty_body")]
    #[test_case(b"  \n" ; "whitespace_body")]
    #[test_case(b"[]" ; "empty_array")]
    #[test_case(br#"[{"id":"1"},{"download_url":"http://x/2.jpg"},{"id":5,"download_url":"http://x/5.jpg"}]"# ; "all_malformed")]
    #[test_case(br#"[{"id":"","download_url":"http://x/1.jpg"}]"# ; "blank_id")]
    #[test_case(br#"[{"id":"1","download_url":"/relative.jpg"}]"# ; "relative_url")]
    #[test_case(br#"[1, "two", null]"# ; "non_object_elements")]
    fn test_yields_empty_page(body: &[u8]) {
        assert_eq!(parse_page(body).unwrap(), Vec::new());
    }

    #[test_case(b"{not json" ; "invalid_json")]
    #[test_case(br#"{"id":"1","download_url":"http://x/1.jpg"}"# ; "object_not_array")]
    fn test_parse_error(body: &[u8]) {
        assert!(matches!(parse_page(body), Err(CatalogError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_page_and_limit() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url, query| {
                url.to_string() == "http://catalog.test/v2/list"
                    && query.to_vec()
                        == vec![
                            ("page".to_string(), "2".to_string()),
                            ("limit".to_string(), "20".to_string()),
                        ]
            })
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::ok(
                    r#"[{"id":"0","download_url":"https://picsum.photos/id/0/5000/3333"}]"#,
                ))
            });

        let descriptors = client_with(mock).fetch_page(2, 20).await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].source_url(), "https://picsum.photos/id/0/5000/3333");
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .returning(|_, _| Err(TransportError::Timeout));

        let result = client_with(mock).fetch_page(1, 20).await;
        assert!(matches!(result, Err(CatalogError::Network { .. })));
    }

    #[tokio::test]
    async fn test_error_status_is_network_error() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .returning(|_, _| Ok(HttpResponse::new(503, "unavailable")));

        let error = client_with(mock).fetch_page(1, 20).await.unwrap_err();
        assert!(error.is_network_error());
        assert!(error.to_string().contains("503"));
    }
}
