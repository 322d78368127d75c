//! Zone discovery

use tracing::debug;

use super::client::ComputeClient;
use super::error::ComputeResult;
use super::types::{ListPage, ZoneInfo};

/// Handler for zone resources.
pub struct ZoneHandler {
    client: ComputeClient,
}

impl ZoneHandler {
    #[must_use]
    pub fn new(client: ComputeClient) -> Self {
        ZoneHandler { client }
    }

    /// All zones of `project` belonging to `region`, sorted by name so
    /// that "the first zone" is deterministic across calls.
    pub async fn list_in_region(
        &self,
        project: &str,
        region: &str,
    ) -> ComputeResult<Vec<ZoneInfo>> {
        let path = format!("/projects/{project}/zones");
        let filter = format!("region=\"{region}\"");
        let mut zones = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("filter".to_string(), filter.clone())];
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let page: ListPage<ZoneInfo> = self.client.get_json(&path, &query).await?;
            zones.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        zones.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(project, region, total = zones.len(), "listed zones");
        Ok(zones)
    }
}
