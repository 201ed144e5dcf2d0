use super::{Attempt, FetchStrategy, PageContent, RequestFetcher};
use crate::error::ScrapeError;
use async_trait::async_trait;
use log::debug;
use url::Url;

/// Probes the AMP variants of a page: `/amp`, `?amp=1`, `?output=amp`
pub struct AmpFetcher {
    fetcher: RequestFetcher,
}

impl AmpFetcher {
    pub fn new(fetcher: RequestFetcher) -> Self {
        Self { fetcher }
    }
}

/// Replace (or add) one query parameter, keeping the others in order
fn with_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut variant = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(k, _)| k != key)
        .collect();
    variant
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);
    variant
}

/// AMP candidate URLs in probing order
pub fn amp_variants(url: &Url) -> Vec<Url> {
    let mut path_variant = url.clone();
    let path = url.path();
    if path.ends_with('/') {
        path_variant.set_path(&format!("{path}amp"));
    } else {
        path_variant.set_path(&format!("{path}/amp"));
    }

    vec![
        path_variant,
        with_query_param(url, "amp", "1"),
        with_query_param(url, "output", "amp"),
    ]
}

#[async_trait]
impl FetchStrategy for AmpFetcher {
    fn name(&self) -> &'static str {
        "amp"
    }

    async fn fetch(&self, url: &Url) -> Result<Attempt, ScrapeError> {
        for variant in amp_variants(url) {
            let response = match self.fetcher.get(&variant).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("AMP variant {} failed: {}", variant, e);
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!("AMP variant {} returned {}", variant, response.status());
                continue;
            }
            match response.text().await {
                Ok(body) if !body.trim().is_empty() => {
                    debug!("AMP variant {} succeeded", variant);
                    return Ok(Attempt::Fetched(PageContent::Html(body)));
                }
                _ => debug!("AMP variant {} returned no body", variant),
            }
        }
        Ok(Attempt::Advance("no AMP variant available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants(url: &str) -> Vec<String> {
        amp_variants(&Url::parse(url).unwrap())
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_variants_without_trailing_slash() {
        assert_eq!(
            variants("https://example.com/recipes/soup"),
            vec![
                "https://example.com/recipes/soup/amp",
                "https://example.com/recipes/soup?amp=1",
                "https://example.com/recipes/soup?output=amp",
            ]
        );
    }

    #[test]
    fn test_variants_with_trailing_slash_and_query() {
        assert_eq!(
            variants("https://example.com/soup/?ref=home&amp=0"),
            vec![
                "https://example.com/soup/amp?ref=home&amp=0",
                "https://example.com/soup/?ref=home&amp=1",
                "https://example.com/soup/?ref=home&amp=0&output=amp",
            ]
        );
    }
}
