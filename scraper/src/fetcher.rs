use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::constants::*;
use crate::imports::*;

/// Shared HTTP client. Every request carries the site-facing headers and its own deadline;
/// nothing is retried or cached.
#[derive(Debug)]
pub struct Fetcher {
    reqwest_client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Fetcher> {
        let reqwest_client =
            reqwest::Client::builder().user_agent(USER_AGENT).build().context("Failed to build HTTP client")?;
        Ok(Fetcher { reqwest_client })
    }

    async fn fetch(&self, request: RequestBuilder, url: &str, timeout: Duration) -> Result<String> {
        let inner = async {
            debug!("Fetching: {:?}", url);
            let response = request.timeout(timeout).send().await?.error_for_status()?;
            // Vendor pages don't always declare their charset; they are all UTF-8.
            let bytes = response.bytes().await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned()) as Result<_>
        };
        inner.await.with_context(|| format!("Failed to fetch URL: {:?}", url))
    }

    pub async fn get_text(&self, url: &str, query: &[(&str, String)], timeout: Duration) -> Result<String> {
        self.fetch(self.reqwest_client.get(url).query(query), url, timeout).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T> {
        let request = self.reqwest_client.get(url).query(query).header(reqwest::header::ACCEPT, "application/json");
        let contents = self.fetch(request, url, timeout).await?;
        parse_json(&contents).with_context(|| format!("Failed to parse JSON from: {:?}", url))
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        let request = self.reqwest_client.post(url).json(body).header(reqwest::header::ACCEPT, "application/json");
        let contents = self.fetch(request, url, timeout).await?;
        parse_json(&contents).with_context(|| format!("Failed to parse JSON from: {:?}", url))
    }
}

pub fn parse_json<T: DeserializeOwned>(contents: &str) -> Result<T> {
    serde_json::from_str(contents).map_err(|err| {
        let preview: String = contents.chars().take(200).collect();
        anyhow!("{} in response starting with {:?}", err, preview)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Count {
        count: u64,
    }

    #[test]
    fn test_parse_json() -> Result<()> {
        assert_eq!(parse_json::<Count>(r#"{"count": 12}"#)?, Count { count: 12 });
        let err = parse_json::<Count>("<html>busy</html>").unwrap_err();
        assert!(err.to_string().contains("<html>busy</html>"));
        Ok(())
    }
}
