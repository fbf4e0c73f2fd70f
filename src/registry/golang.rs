use anyhow::Result;
use reqwest::Client;

/// Fetch the latest version of a Go module from the module proxy.
pub async fn fetch_latest(client: &Client, name: &str) -> Result<Option<String>> {
    let url = format!("https://proxy.golang.org/{}/@latest", escape_module_path(name));

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
        .get("Version")
        .and_then(|v| v.as_str())
        .map(|v| v.trim_start_matches('v').to_string());

    Ok(version)
}

/// Module proxy paths case-encode uppercase letters as `!<lowercase>`.
fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_module_path() {
        assert_eq!(escape_module_path("github.com/BurntSushi/toml"), "github.com/!burnt!sushi/toml");
        assert_eq!(escape_module_path("golang.org/x/sync"), "golang.org/x/sync");
    }
}
