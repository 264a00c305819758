//! Integration tests for the individual executors.

use std::time::Duration;

use geoflow_ogc::OgcClient;
use geoflow_pipeline::{
    ExecutorError, IlwisExecutor, NodeOutput, OperationExecutor, PollPolicy, RestExecutor,
    RestfulWpsExecutor, WpsExecutor,
};
use geoflow_types::{Operation, Port, PortType, Resource};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> OgcClient {
    OgcClient::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn fast_policy(timeout: Duration) -> PollPolicy {
    PollPolicy {
        initial: Duration::from_millis(10),
        max: Duration::from_millis(40),
        timeout,
    }
}

fn operation(resource: Resource, url: String) -> Operation {
    let mut op = Operation::new("1", resource);
    op.metadata.label = "slope".into();
    op.metadata.url = url;
    op.inputs = vec![
        Port::new(0, "dem", PortType::Coverage).with_value("http://h/dem.tif"),
        Port::new(1, "unit", PortType::Text).with_value("degrees"),
    ];
    op.outputs = vec![Port::new(0, "slope", PortType::Text)];
    op
}

async fn mount_job(server: &MockServer, statuses: &[&str], final_status: &str) {
    Mock::given(method("POST"))
        .and(path("/processes/slope/jobs"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/jobs/1", server.uri()).as_str()),
        )
        .mount(server)
        .await;
    for status in statuses {
        Mock::given(method("GET"))
            .and(path("/jobs/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "StatusInfo": { "Status": status } })),
            )
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/jobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "StatusInfo": {
                "Status": final_status,
                "Output": format!("{}/jobs/1/results", server.uri())
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/1/results"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Result": { "Output": [ { "slope": 12.5 } ] } })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_restful_job_polled_to_completion() {
    let server = MockServer::start().await;
    mount_job(&server, &["Running", "Running"], "Succeeded").await;

    let executor = RestfulWpsExecutor::new(client(), fast_policy(Duration::from_secs(5)));
    let op = operation(Resource::RestfulWps, format!("{}/processes/slope", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();

    assert_eq!(output, NodeOutput::Data(json!({ "slope": 12.5 })));
}

#[tokio::test]
async fn test_restful_job_failure() {
    let server = MockServer::start().await;
    mount_job(&server, &["Running"], "Failed").await;

    let executor = RestfulWpsExecutor::new(client(), fast_policy(Duration::from_secs(5)));
    let op = operation(Resource::RestfulWps, format!("{}/processes/slope", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();

    assert!(matches!(output, NodeOutput::Failed(_)));
}

#[tokio::test]
async fn test_restful_poll_times_out() {
    let server = MockServer::start().await;
    mount_job(&server, &[], "Running").await;

    let executor = RestfulWpsExecutor::new(client(), fast_policy(Duration::from_millis(100)));
    let op = operation(Resource::RestfulWps, format!("{}/processes/slope", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();

    assert_eq!(output, NodeOutput::Failed("timed out".to_string()));
}

#[tokio::test]
async fn test_restful_poll_cancelled() {
    let server = MockServer::start().await;
    mount_job(&server, &[], "Running").await;

    let executor = RestfulWpsExecutor::new(client(), fast_policy(Duration::from_secs(30)));
    let op = operation(Resource::RestfulWps, format!("{}/processes/slope", server.uri()));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = executor.execute(&op, &cancel).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Cancelled));
}

#[tokio::test]
async fn test_restful_missing_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let executor = RestfulWpsExecutor::new(client(), fast_policy(Duration::from_secs(5)));
    let op = operation(Resource::RestfulWps, format!("{}/processes/slope", server.uri()));
    let err = executor.execute(&op, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_ilwis_result_path_prefixed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/ilwis/execute/.+textinputsdegrees/slope$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"path": "/out/slope.tif"}"#))
        .mount(&server)
        .await;

    let executor = IlwisExecutor::new(client(), "http://ilwis.local");
    let op = operation(Resource::Ilwis, format!("{}/ilwis/", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();

    assert_eq!(
        output,
        NodeOutput::Data(json!("http://ilwis.local/out/slope.tif"))
    );
}

#[tokio::test]
async fn test_wps_error_status_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let executor = WpsExecutor::new(client());
    let op = operation(Resource::Wps, format!("{}/wps", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();
    assert_eq!(output, NodeOutput::Empty);
}

#[tokio::test]
async fn test_wps_text_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("42.0"))
        .mount(&server)
        .await;

    let executor = WpsExecutor::new(client());
    let op = operation(Resource::Wps, format!("{}/wps", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();
    assert_eq!(output, NodeOutput::Data(json!("42.0")));
}

#[tokio::test]
async fn test_rest_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let executor = RestExecutor::new(client());
    let op = operation(Resource::Rest, format!("{}/rest", server.uri()));
    let output = executor.execute(&op, &CancellationToken::new()).await.unwrap();
    assert_eq!(output, NodeOutput::Data(json!([1, 2, 3])));

    let received = &server.received_requests().await.unwrap()[0];
    let posted: serde_json::Value = serde_json::from_slice(&received.body).unwrap();
    assert_eq!(posted["metadata"]["label"], "slope");
}
