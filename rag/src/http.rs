use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;

use crate::error::{Error, Result};

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|source| Error::Transport {
            url: "(client setup)".to_string(),
            source,
        })
}

/// Builds `{base}{path}?key={api_key}`.
pub fn endpoint_with_key(base: &str, path: &str, api_key: &str) -> Result<Url> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| Error::Config(format!("bad URL {}: {}", raw, e)))?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// URL without its query string, safe to put in logs and error messages.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

pub async fn get_text(client: &Client, url: Url, bearer: Option<&str>) -> Result<String> {
    let mut req = client.get(url.clone());
    if let Some(token) = bearer {
        req = req.bearer_auth(token);
    }
    send("GET", &url, req).await
}

pub async fn get_json_with<T: DeserializeOwned>(url: &Url, req: RequestBuilder) -> Result<T> {
    let text = send("GET", url, req).await?;
    from_str::<T>(&text).map_err(|e| Error::Decode {
        url: redacted(url),
        message: format!("{} | {}", e, text),
    })
}

pub async fn post_json<T: DeserializeOwned, B: Serialize>(
    client: &Client,
    url: Url,
    body: &B,
) -> Result<T> {
    let req = client
        .post(url.clone())
        .header(CONTENT_TYPE, "application/json")
        .json(body);
    let text = send("POST", &url, req).await?;
    from_str::<T>(&text).map_err(|e| Error::Decode {
        url: redacted(&url),
        message: format!("{} | {}", e, text),
    })
}

async fn send(method: &'static str, url: &Url, req: RequestBuilder) -> Result<String> {
    let resp = req.send().await.map_err(|source| Error::Transport {
        url: redacted(url),
        source: source.without_url(),
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            method,
            url: redacted(url),
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }
    resp.text().await.map_err(|source| Error::Transport {
        url: redacted(url),
        source: source.without_url(),
    })
}
