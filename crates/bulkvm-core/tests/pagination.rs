//! Pagination tests: list calls must follow `nextPageToken` to the end

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bulkvm_core::compute::types::Scope;
use bulkvm_core::compute::{
    client_operation_filter, ComputeClient, InstanceHandler, OperationHandler, ZoneHandler,
};

fn client(server: &MockServer) -> ComputeClient {
    ComputeClient::builder()
        .base_url(server.uri())
        .token("test-token")
        .build()
        .expect("client builds")
}

fn instance(name: &str) -> serde_json::Value {
    json!({"name": name, "status": "RUNNING"})
}

#[tokio::test]
async fn instance_list_concatenates_all_pages_in_order() {
    let server = MockServer::start().await;
    let list_path = "/projects/p/zones/us-west1-a/instances";

    // Token-specific mocks first so the untokened mock does not shadow them.
    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("pageToken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-3"), instance("vm-4")],
            "nextPageToken": "t3"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("pageToken", "t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-5")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-1"), instance("vm-2")],
            "nextPageToken": "t2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = InstanceHandler::new(client(&server));
    let scope = Scope::zonal("p", "us-west1-a");
    let instances = handler.list(&scope, None).await.expect("list succeeds");

    let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["vm-1", "vm-2", "vm-3", "vm-4", "vm-5"]);
}

#[tokio::test]
async fn instance_list_forwards_the_filter_on_every_page() {
    let server = MockServer::start().await;
    let list_path = "/projects/p/zones/us-west1-a/instances";
    let filter = "(name = \"vm-1\")";

    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("filter", filter))
        .and(query_param("pageToken", "next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-1b")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("filter", filter))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-1a")],
            "nextPageToken": "next"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = InstanceHandler::new(client(&server));
    let scope = Scope::zonal("p", "us-west1-a");
    let instances = handler
        .list(&scope, Some(filter))
        .await
        .expect("filtered list succeeds");
    assert_eq!(instances.len(), 2);
}

#[tokio::test]
async fn empty_page_token_terminates_the_walk() {
    let server = MockServer::start().await;
    let list_path = "/projects/p/zones/us-west1-a/instances";

    // Some services send an empty-string token on the last page.
    Mock::given(method("GET"))
        .and(path(list_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [instance("vm-1")],
            "nextPageToken": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = InstanceHandler::new(client(&server));
    let scope = Scope::zonal("p", "us-west1-a");
    let instances = handler.list(&scope, None).await.expect("list succeeds");
    assert_eq!(instances.len(), 1);
}

#[tokio::test]
async fn missing_items_field_is_an_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p/zones/us-west1-a/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let handler = InstanceHandler::new(client(&server));
    let scope = Scope::zonal("p", "us-west1-a");
    let instances = handler.list(&scope, None).await.expect("list succeeds");
    assert!(instances.is_empty());
}

#[tokio::test]
async fn operation_list_pages_and_filters_by_parent() {
    let server = MockServer::start().await;
    let list_path = "/projects/p/zones/us-west1-a/operations";
    let filter = client_operation_filter("bulk-op-1");

    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("filter", filter.as_str()))
        .and(query_param("pageToken", "more"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "child-3", "status": "RUNNING"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path))
        .and(query_param("filter", filter.as_str()))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "child-1", "status": "RUNNING"},
                {"name": "child-2", "status": "PENDING"}
            ],
            "nextPageToken": "more"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = OperationHandler::new(client(&server));
    let scope = Scope::zonal("p", "us-west1-a");
    let operations = handler
        .list(&scope, Some(&filter))
        .await
        .expect("list succeeds");

    let names: Vec<&str> = operations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["child-1", "child-2", "child-3"]);
}

#[tokio::test]
async fn zone_list_pages_and_sorts_by_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/p/zones"))
        .and(query_param("pageToken", "z2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "us-west1-a", "status": "UP"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/p/zones"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "us-west1-c", "status": "UP"},
                {"name": "us-west1-b", "status": "UP"}
            ],
            "nextPageToken": "z2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = ZoneHandler::new(client(&server));
    let zones = handler
        .list_in_region("p", "us-west1")
        .await
        .expect("list succeeds");

    let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
    // Sorted even though the pages arrived out of order.
    assert_eq!(names, ["us-west1-a", "us-west1-b", "us-west1-c"]);
}
