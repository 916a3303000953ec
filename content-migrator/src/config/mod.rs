//! Dependency wiring for the CLI.
//!
//! Configuration is fully explicit: everything comes from command line
//! arguments, nothing from the process environment.

use std::sync::Arc;

use content_migrator_api::{ManagementApi, ManagementClient};
use content_migrator_pipeline::export::ExportRequest;

/// Connection settings for one environment.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment_id: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl EnvironmentConfig {
    pub fn new(
        environment_id: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Builds the management API client for this environment.
    pub fn into_api(self) -> Arc<dyn ManagementApi> {
        Arc::new(ManagementClient::new(
            self.environment_id,
            self.api_key,
            self.base_url,
        ))
    }
}

/// Parses the comma-separated item codename list of the CLI.
pub fn parse_item_codenames(items: &str) -> Vec<String> {
    items
        .split(',')
        .map(str::trim)
        .filter(|codename| !codename.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expands the CLI's item list and language into export requests.
pub fn export_requests(items: &str, language: &str) -> Vec<ExportRequest> {
    parse_item_codenames(items)
        .into_iter()
        .map(|codename| ExportRequest::new(codename, language))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_codenames_trims_and_drops_empties() {
        assert_eq!(
            parse_item_codenames("about, faq ,,contact"),
            vec!["about", "faq", "contact"]
        );
        assert!(parse_item_codenames("").is_empty());
        assert!(parse_item_codenames(" , ").is_empty());
    }

    #[test]
    fn test_export_requests_pair_each_item_with_the_language() {
        let requests = export_requests("about,faq", "en");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], ExportRequest::new("about", "en"));
        assert_eq!(requests[1], ExportRequest::new("faq", "en"));
    }
}
