pub mod types;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::state::ClientConfig;
use types::{
    Article, ContextDocument, GenerateRequest, GenerateResponse, LegislationResponse,
    RetrieveRequest, RetrieveResponse,
};

/// The three remote collaborators the client talks to.
pub trait LegalApi: Send + Sync {
    /// Phase 1: find candidate excerpts for a question, relevance-ranked.
    fn retrieve<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Vec<ContextDocument>>>;

    /// Phase 2: produce an answer conditioned on the retrieved excerpts.
    fn generate<'a>(
        &'a self,
        question: &'a str,
        context: &'a [ContextDocument],
    ) -> BoxFuture<'a, Result<GenerateResponse>>;

    /// Full article list of one legislation source, for the reader.
    fn legislation<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<Vec<Article>>>;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Resolve an API route from the base URL. Accepts bases with or without
    /// the trailing `/api` segment.
    fn endpoint(&self, route: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/api") {
            format!("{}/{}", base, route)
        } else {
            format!("{}/api/{}", base, route)
        }
    }

    async fn post_json<B, T>(&self, route: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(route);
        debug!(url, "POST");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))?;
        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to decode response from {}", url))
    }
}

impl LegalApi for ApiClient {
    fn retrieve<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Vec<ContextDocument>>> {
        async move {
            let resp: RetrieveResponse = self
                .post_json("retrieve", &RetrieveRequest { question })
                .await?;
            Ok(resp.context_docs)
        }
        .boxed()
    }

    fn generate<'a>(
        &'a self,
        question: &'a str,
        context: &'a [ContextDocument],
    ) -> BoxFuture<'a, Result<GenerateResponse>> {
        async move {
            self.post_json(
                "answer",
                &GenerateRequest {
                    question,
                    context_docs: context,
                },
            )
            .await
        }
        .boxed()
    }

    fn legislation<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<Vec<Article>>> {
        async move {
            let url = self.endpoint("legislation");
            debug!(url, source, "GET");
            let resp: LegislationResponse = self
                .client
                .get(&url)
                .query(&[("source", source)])
                .send()
                .await
                .with_context(|| format!("Request to {} failed", url))?
                .error_for_status()
                .with_context(|| format!("{} returned an error status", url))?
                .json()
                .await
                .context("Failed to decode legislation response")?;
            Ok(resp.articles)
        }
        .boxed()
    }
}

/// Scripted collaborator for tests.
#[cfg(test)]
pub mod fake {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use tokio::sync::Notify;

    use super::types::{Article, ContextDocument, GenerateResponse};
    use super::LegalApi;

    #[derive(Default)]
    pub struct FakeApi {
        pub context: Vec<ContextDocument>,
        pub generated: Option<GenerateResponse>,
        /// Atomic so a test can make later runs fail.
        pub fail_retrieve: AtomicBool,
        pub fail_generate: bool,
        /// When set, retrieve waits for a notification before answering.
        pub retrieve_gate: Option<Arc<Notify>>,
        pub generate_gate: Option<Arc<Notify>>,
        pub articles: Vec<Article>,
        pub fail_legislation: bool,
        pub retrieve_calls: AtomicUsize,
        pub generate_calls: AtomicUsize,
        /// Context lengths seen by generate, in call order.
        pub generate_context_lens: Mutex<Vec<usize>>,
    }

    impl LegalApi for FakeApi {
        fn retrieve<'a>(
            &'a self,
            _question: &'a str,
        ) -> BoxFuture<'a, Result<Vec<ContextDocument>>> {
            async move {
                self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.retrieve_gate {
                    gate.notified().await;
                }
                if self.fail_retrieve.load(Ordering::SeqCst) {
                    return Err(anyhow!("retrieve unavailable"));
                }
                Ok(self.context.clone())
            }
            .boxed()
        }

        fn generate<'a>(
            &'a self,
            _question: &'a str,
            context: &'a [ContextDocument],
        ) -> BoxFuture<'a, Result<GenerateResponse>> {
            async move {
                self.generate_calls.fetch_add(1, Ordering::SeqCst);
                self.generate_context_lens
                    .lock()
                    .unwrap()
                    .push(context.len());
                if let Some(gate) = &self.generate_gate {
                    gate.notified().await;
                }
                if self.fail_generate {
                    return Err(anyhow!("generate returned 500"));
                }
                self.generated
                    .clone()
                    .ok_or_else(|| anyhow!("no scripted answer"))
            }
            .boxed()
        }

        fn legislation<'a>(&'a self, _source: &'a str) -> BoxFuture<'a, Result<Vec<Article>>> {
            async move {
                if self.fail_legislation {
                    return Err(anyhow!("legislation unavailable"));
                }
                Ok(self.articles.clone())
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_from_host() {
        assert_eq!(
            client("http://localhost:8000").endpoint("retrieve"),
            "http://localhost:8000/api/retrieve"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_and_api_segment() {
        assert_eq!(
            client("https://mevzuat.example/api/").endpoint("answer"),
            "https://mevzuat.example/api/answer"
        );
        assert_eq!(
            client("https://mevzuat.example/").endpoint("legislation"),
            "https://mevzuat.example/api/legislation"
        );
    }
}
