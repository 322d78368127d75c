//! Operation status queries

use tracing::debug;

use super::client::ComputeClient;
use super::error::ComputeResult;
use super::types::{ListPage, Operation, Scope};

/// Handler for operation resources.
pub struct OperationHandler {
    client: ComputeClient,
}

impl OperationHandler {
    #[must_use]
    pub fn new(client: ComputeClient) -> Self {
        OperationHandler { client }
    }

    /// Current state of an operation. Returns immediately with whatever
    /// status the service currently reports.
    pub async fn get(&self, scope: &Scope, name: &str) -> ComputeResult<Operation> {
        let path = format!("{}/{name}", scope.operations_path());
        self.client.get_json(&path, &[]).await
    }

    /// Long-poll an operation: the service holds the request open for a
    /// bounded interval and then replies with the latest known status,
    /// which may still be non-terminal. Callers loop until `DONE`.
    pub async fn wait(&self, scope: &Scope, name: &str) -> ComputeResult<Operation> {
        let path = format!("{}/{name}/wait", scope.operations_path());
        self.client.post_json::<(), _>(&path, None).await
    }

    /// List operations in `scope` matching `filter`, following pagination
    /// until exhausted.
    pub async fn list(&self, scope: &Scope, filter: Option<&str>) -> ComputeResult<Vec<Operation>> {
        let path = scope.operations_path();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(String, String)> = Vec::new();
            if let Some(filter) = filter {
                query.push(("filter".to_string(), filter.to_string()));
            }
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let page: ListPage<Operation> = self.client.get_json(&path, &query).await?;
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(%scope, total = items.len(), "listed operations");
        Ok(items)
    }
}

/// Filter matching the per-instance operations spawned by a bulk
/// operation, keyed by the parent operation's name.
#[must_use]
pub fn client_operation_filter(parent_operation: &str) -> String {
    format!("clientOperationId = \"{parent_operation}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_operation_filter_quotes_name() {
        assert_eq!(
            client_operation_filter("operation-123"),
            "clientOperationId = \"operation-123\""
        );
    }
}
