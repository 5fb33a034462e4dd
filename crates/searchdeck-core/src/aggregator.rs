use searchdeck_client::types::{ContentResult, PagedContent, ProviderType};
use searchdeck_client::{ContentProvider, ProviderClients, ProviderError};
use tracing::{info, warn};

/// Results of one provider, in provider order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResults {
    pub provider: ProviderType,
    pub results: Vec<ContentResult>,
}

/// Everything gathered for one subject.
#[derive(Debug)]
pub struct Aggregate {
    pub subject: String,
    pub encyclopedia: Option<PagedContent>,
    /// Code hosting, Q&A and articles, in that order. Empty groups are left out.
    pub secondary: Vec<ProviderResults>,
    pub failures: Vec<ProviderError>,
}

impl Aggregate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encyclopedia.is_none() && self.secondary.is_empty()
    }

    #[must_use]
    pub fn result_count(&self) -> usize {
        usize::from(self.encyclopedia.is_some())
            + self
                .secondary
                .iter()
                .map(|group| group.results.len())
                .sum::<usize>()
    }
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found(Aggregate),
    /// Nothing from any provider. Failures are kept for reporting.
    NoResults { failures: Vec<ProviderError> },
}

/// Concurrent fan-out over all providers with per-provider failure isolation.
#[derive(Debug, Clone)]
pub struct Aggregator {
    clients: ProviderClients,
    chunk_length: usize,
    limit: usize,
}

impl Aggregator {
    #[must_use]
    pub fn new(clients: ProviderClients, chunk_length: usize, limit: usize) -> Self {
        Self {
            clients,
            chunk_length,
            limit,
        }
    }

    /// Query every provider for `subject` and wait for all of them.
    ///
    /// A failing provider contributes nothing and is recorded in the
    /// outcome; it never affects the others.
    pub async fn search(&self, subject: &str) -> SearchOutcome {
        let (encyclopedia, code, questions, articles) = tokio::join!(
            fetch_isolated(self.clients.encyclopedia.as_ref(), subject),
            fetch_isolated(self.clients.code_hosting.as_ref(), subject),
            fetch_isolated(self.clients.questions.as_ref(), subject),
            fetch_isolated(self.clients.articles.as_ref(), subject),
        );

        let mut failures = Vec::new();
        let mut settle = |outcome: Result<Vec<ContentResult>, ProviderError>| match outcome {
            Ok(results) => results,
            Err(error) => {
                warn!(
                    target: "searchdeck_core",
                    provider = error.provider().slug(),
                    subject,
                    error = %error,
                    "Provider failed; continuing without it"
                );
                failures.push(error);
                Vec::new()
            }
        };

        let encyclopedia = settle(encyclopedia)
            .into_iter()
            .next()
            .map(|result| result.into_paged(self.chunk_length));

        let secondary: Vec<ProviderResults> = [code, questions, articles]
            .into_iter()
            .map(&mut settle)
            .filter_map(|results| {
                let provider = results.first()?.provider;
                Some(ProviderResults {
                    provider,
                    results: results.into_iter().take(self.limit).collect(),
                })
            })
            .collect();

        let aggregate = Aggregate {
            subject: subject.to_string(),
            encyclopedia,
            secondary,
            failures,
        };

        info!(
            target: "searchdeck_core",
            subject,
            results = aggregate.result_count(),
            failures = aggregate.failures.len(),
            "Aggregation finished"
        );

        if aggregate.is_empty() {
            SearchOutcome::NoResults {
                failures: aggregate.failures,
            }
        } else {
            SearchOutcome::Found(aggregate)
        }
    }
}

async fn fetch_isolated(
    provider: &dyn ContentProvider,
    subject: &str,
) -> Result<Vec<ContentResult>, ProviderError> {
    provider
        .fetch(subject)
        .await
        .map_err(|source| ProviderError::Unavailable {
            provider: provider.provider(),
            subject: subject.to_string(),
            source,
        })
}
