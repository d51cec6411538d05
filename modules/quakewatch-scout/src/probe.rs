//! Structured-data endpoint probing ahead of the page fetch.

use quakewatch_archive::PageFetcher;
use tracing::{debug, info};

use crate::extraction::strategies::direct_data::decode_payload;
use crate::extraction::EndpointPayload;

/// Try each endpoint in order and keep the first one that answers with an
/// event list. Failures and unusable bodies are skipped silently.
pub async fn probe_endpoints(fetcher: &dyn PageFetcher, endpoints: &[String]) -> Vec<EndpointPayload> {
    for endpoint in endpoints {
        match fetcher.probe(endpoint).await {
            Ok(page) if decode_payload(&page.body).is_some() => {
                info!(endpoint = endpoint.as_str(), "Endpoint returned structured data");
                return vec![EndpointPayload {
                    endpoint: endpoint.clone(),
                    body: page.body,
                }];
            }
            Ok(_) => debug!(endpoint = endpoint.as_str(), "Endpoint answered without usable data"),
            Err(e) => debug!(endpoint = endpoint.as_str(), error = %e, "Endpoint probe failed"),
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn endpoints(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn first_usable_endpoint_wins() {
        let fetcher = MockFetcher::new()
            .on_probe("https://a.example", "<html>not json</html>")
            .on_probe("https://c.example", r#"[{"mag":"4.0"}]"#)
            .on_probe("https://d.example", r#"[{"mag":"5.0"}]"#);

        let payloads = probe_endpoints(
            &fetcher,
            &endpoints(&["https://a.example", "https://b.example", "https://c.example", "https://d.example"]),
        )
        .await;

        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].endpoint, "https://c.example");
        assert!(!fetcher.was_probed("https://d.example"));
    }

    #[tokio::test]
    async fn nothing_usable_is_empty() {
        let fetcher = MockFetcher::new().on_probe("https://a.example", "[]");
        assert!(probe_endpoints(&fetcher, &endpoints(&["https://a.example"])).await.is_empty());
    }
}
