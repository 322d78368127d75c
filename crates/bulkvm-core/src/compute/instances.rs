//! Instance operations: bulk creation and listing

use tracing::{debug, info};

use super::client::ComputeClient;
use super::error::{ComputeError, ComputeResult};
use super::types::{BulkInsertRequest, Instance, ListPage, Operation, Scope};

/// Handler for instance resources.
pub struct InstanceHandler {
    client: ComputeClient,
}

impl InstanceHandler {
    #[must_use]
    pub fn new(client: ComputeClient) -> Self {
        InstanceHandler { client }
    }

    /// Submit a bulk creation request. Returns the (not yet terminal)
    /// operation handle; callers poll it to resolution.
    pub async fn bulk_insert(
        &self,
        scope: &Scope,
        request: &BulkInsertRequest,
    ) -> ComputeResult<Operation> {
        request.validate().map_err(ComputeError::Validation)?;
        info!(%scope, count = request.count, "submitting bulk insert");
        let path = format!("{}/bulkInsert", scope.instances_path());
        self.client.post_json(&path, Some(request)).await
    }

    /// List instances in `scope`, optionally constrained by a filter
    /// expression. Follows `nextPageToken` until the result set is
    /// exhausted; a single page is never assumed to be the whole set.
    pub async fn list(&self, scope: &Scope, filter: Option<&str>) -> ComputeResult<Vec<Instance>> {
        let path = scope.instances_path();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut query: Vec<(String, String)> = Vec::new();
            if let Some(filter) = filter {
                query.push(("filter".to_string(), filter.to_string()));
            }
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let page: ListPage<Instance> = self.client.get_json(&path, &query).await?;
            pages += 1;
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(%scope, pages, total = items.len(), "listed instances");
        Ok(items)
    }
}

/// Filter expression matching any of `names` exactly:
/// `(name = "instance-1") OR (name = "instance-2")`.
#[must_use]
pub fn name_filter<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| format!("(name = \"{}\")", name.as_ref()))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filter_joins_with_or() {
        assert_eq!(name_filter(&["a"]), "(name = \"a\")");
        assert_eq!(
            name_filter(&["instance-1", "instance-2"]),
            "(name = \"instance-1\") OR (name = \"instance-2\")"
        );
    }

    #[test]
    fn name_filter_empty_is_empty() {
        let names: [&str; 0] = [];
        assert_eq!(name_filter(&names), "");
    }
}
