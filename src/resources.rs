use crate::types::Resource;
use std::time::Duration;

/// Curated fallback directory of verified mental-health resources.
const CURATED: &[(&str, &str)] = &[
    (
        "WHO Mental Health Hub",
        "https://www.who.int/teams/mental-health-and-substance-use",
    ),
    (
        "Crisis Helpline (WHO Directory)",
        "https://www.who.int/mental_health/en/",
    ),
    (
        "Mental Health Self-Help Toolkit",
        "https://www.who.int/publications/i/item/9789240035119",
    ),
];

pub fn curated() -> Vec<Resource> {
    CURATED
        .iter()
        .map(|(title, url)| Resource {
            title: title.to_string(),
            url: url.to_string(),
        })
        .collect()
}

/// Look up mood-specific resources from a third-party endpoint, falling
/// back to the curated directory on any failure. The endpoint is expected
/// to return a JSON array of `{title, url}` objects.
pub fn lookup(endpoint: Option<&str>, mood: &str) -> Vec<Resource> {
    let Some(endpoint) = endpoint else {
        return curated();
    };

    match fetch(endpoint, mood) {
        Ok(resources) if !resources.is_empty() => resources,
        Ok(_) => curated(),
        Err(e) => {
            tracing::warn!(error = %e, "mood resource lookup failed, using curated list");
            curated()
        }
    }
}

fn fetch(endpoint: &str, mood: &str) -> Result<Vec<Resource>, String> {
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| e.to_string())?;

    let resp = http
        .get(endpoint)
        .query(&[("mood", mood)])
        .send()
        .map_err(|e| e.to_string())?;

    if !resp.status().is_success() {
        return Err(format!("status {}", resp.status()));
    }

    let body: serde_json::Value = resp.json().map_err(|e| e.to_string())?;

    let items = body.as_array().cloned().unwrap_or_default();
    let resources = items
        .iter()
        .filter_map(|item| {
            Some(Resource {
                title: item.get("title")?.as_str()?.to_string(),
                url: item.get("url")?.as_str()?.to_string(),
            })
        })
        .collect();

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_list_is_nonempty() {
        let resources = curated();
        assert_eq!(resources.len(), 3);
        assert!(resources[0].url.starts_with("https://"));
    }

    #[test]
    fn test_lookup_without_endpoint_falls_back() {
        let resources = lookup(None, "anxious");
        assert_eq!(resources.len(), curated().len());
    }
}
