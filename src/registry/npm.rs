use anyhow::Result;
use reqwest::Client;

/// Fetch the latest published version of an npm package.
pub async fn fetch_latest(client: &Client, name: &str) -> Result<Option<String>> {
    // Scoped packages need URL encoding: @scope/pkg → %40scope%2Fpkg
    let encoded_name = name.replace('@', "%40").replace('/', "%2F");
    let url = format!("https://registry.npmjs.org/{}", encoded_name);

    let response = client
        .get(&url)
        .header("User-Agent", super::USER_AGENT)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Ok(None);
    }

    let data: serde_json::Value = response.json().await?;
    let version = data
        .get("dist-tags")
        .and_then(|d| d.get("latest"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(version)
}
