use anyhow::Result;
use reqwest::Client;

/// Fetch the latest published version of a gem from RubyGems.
pub async fn fetch_latest(client: &Client, name: &str) -> Result<Option<String>> {
    let url = format!("https://rubygems.org/api/v1/gems/{}.json", name);

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
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(version)
}
