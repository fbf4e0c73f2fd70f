use anyhow::Result;
use reqwest::Client;

/// Fetch the latest version of a Maven artifact from the Maven Central
/// search index.
///
/// The `name` is expected in `groupId:artifactId` format (as stored in our
/// models).
pub async fn fetch_latest(client: &Client, name: &str) -> Result<Option<String>> {
    let parts: Vec<&str> = name.splitn(2, ':').collect();
    if parts.len() != 2 {
        return Ok(None);
    }

    let url = format!(
        "https://search.maven.org/solrsearch/select?q=g:%22{}%22+AND+a:%22{}%22&rows=1&wt=json",
        parts[0], parts[1]
    );

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
        .get("response")
        .and_then(|r| r.get("docs"))
        .and_then(|d| d.get(0))
        .and_then(|doc| doc.get("latestVersion"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(version)
}
