use anyhow::Result;
use reqwest::Client;

/// Fetch the latest published version of a Python package from PyPI.
pub async fn fetch_latest(client: &Client, name: &str) -> Result<Option<String>> {
    let url = format!("https://pypi.org/pypi/{}/json", name);

    let response = client
        .get(&url)
        .header("User-Agent", super::USER_AGENT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Ok(None);
    }

    let data: serde_json::Value = response.json().await?;
    let version = data
        .get("info")
        .and_then(|i| i.get("version"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(version)
}
