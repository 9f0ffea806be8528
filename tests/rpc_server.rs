//! Serves a seeded catalog over RPC and HTTP and talks to it as a client.

mod common;

use bkweb::config::{AppConfig, ConsoleConfig};
use bkweb::context::AppContext;
use bkweb::rpc::{ClientError, RpcClient, RpcServer};
use bkweb::web::WebServer;
use chrono::{Duration, Utc};
use common::Seed;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const INVALID_PARAMS: i32 = -32602;
const METHOD_NOT_FOUND: i32 = -32601;
const NOT_FOUND: i32 = -32000;

async fn context() -> AppContext {
    let catalog = common::catalog().await;
    let now = Utc::now();
    let mut seeds = Vec::new();
    for id in 1..=3 {
        let end = now - Duration::days(id) + Duration::minutes(30);
        seeds.push(
            Seed::new(id, "backup-job-1", "T")
                .stored(1024 * 1024 * 1024, 250)
                .ran(end - Duration::minutes(45), end),
        );
    }
    seeds.push(Seed::new(4, "backup-job-1", "E"));
    common::insert(&catalog, seeds).await;

    let config = AppConfig {
        // `sh -c cat` echoes the piped console script
        console: ConsoleConfig {
            binary: PathBuf::from("sh"),
            config_file: PathBuf::from("cat"),
            timeout_secs: 5,
        },
        ..Default::default()
    };
    AppContext::new(config, Arc::new(catalog))
}

async fn spawn_rpc() -> (Arc<RpcServer>, RpcClient) {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = Arc::new(RpcServer::bind(context().await, loopback).await.unwrap());
    let client = RpcClient::new(server.local_addr().unwrap())
        .with_timeout(std::time::Duration::from_secs(10));

    let running = server.clone();
    tokio::spawn(async move { running.start().await });
    (server, client)
}

fn rpc_code(err: ClientError) -> i32 {
    match err {
        ClientError::Rpc(e) => e.code,
        other => panic!("expected RPC error, got {other}"),
    }
}

#[tokio::test]
async fn jobs_list_over_rpc() {
    let (server, client) = spawn_rpc().await;

    let slots: Value = client
        .call("jobs.list", Some(json!({ "status": "completed" })))
        .await
        .unwrap();
    assert_eq!(slots["total_jobs"], 3);
    assert_eq!(slots["selected_status"], "Completed");
    assert_eq!(slots["selected_jobs_per_page"], 25);
    assert_eq!(slots["job_status"][0], "Any");
    assert_eq!(slots["jobs"][0]["job_id"], 3);
    assert_eq!(slots["jobs"][0]["elapsed"], "45 mins ");

    let all: Value = client.call_no_params("jobs.list").await.unwrap();
    assert_eq!(all["total_jobs"], 4);

    let err = client
        .call::<Value>("jobs.list", Some(json!({ "jobs_per_page": 7 })))
        .await
        .unwrap_err();
    assert_eq!(rpc_code(err), INVALID_PARAMS);

    server.shutdown();
}

#[tokio::test]
async fn backup_job_report_over_rpc() {
    let (server, client) = spawn_rpc().await;

    let slots: Value = client
        .call(
            "report.backup_job",
            Some(json!({ "backupjob_name": "backup-job-1" })),
        )
        .await
        .unwrap();
    assert_eq!(slots["backupjob_name"], "backup-job-1");
    assert_eq!(slots["backupjob_bytes"], "3.0 GB");
    assert_eq!(slots["backupjob_files"], 750);
    assert_eq!(
        slots["graph_stored_files"]["series"]["points"]
            .as_array()
            .unwrap()
            .len(),
        7
    );
    assert_eq!(slots["graph_stored_bytes"]["chart"]["mime"], "image/svg+xml");

    let err = client
        .call::<Value>("report.backup_job", None)
        .await
        .unwrap_err();
    assert_eq!(rpc_code(err), INVALID_PARAMS);

    server.shutdown();
}

#[tokio::test]
async fn classify_and_unknown_method() {
    let (server, client) = spawn_rpc().await;

    let failed: Value = client
        .call("status.classify", Some(json!({ "code": "f" })))
        .await
        .unwrap();
    assert_eq!(failed["category"], "failed");
    assert_eq!(failed["icon"], "error");
    assert_eq!(failed["description"], "Fatal error");

    let err = client.call_no_params::<Value>("jobs.delete").await.unwrap_err();
    assert_eq!(rpc_code(err), METHOD_NOT_FOUND);

    server.shutdown();
}

#[cfg(unix)]
#[tokio::test]
async fn client_show_forwards_to_console() {
    let (server, client) = spawn_rpc().await;

    let out: Value = client
        .call("clients.show", Some(json!({ "id": 2 })))
        .await
        .unwrap();
    assert_eq!(out["exitcode"], 0);
    assert_eq!(out["output"][0], "show client=\"web01-fd\"");

    let err = client
        .call::<Value>("clients.show", Some(json!({ "id": 42 })))
        .await
        .unwrap_err();
    assert_eq!(rpc_code(err), NOT_FOUND);

    server.shutdown();
}

#[tokio::test]
async fn dashboard_api_serves_slots_and_charts() {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let web = WebServer::bind(context().await, loopback).await.unwrap();
    let base = format!("http://{}", web.local_addr().unwrap());
    let shutdown = web.shutdown_token();
    let serving = tokio::spawn(web.start());

    let http = reqwest::Client::new();

    let jobs: Value = http
        .get(format!("{base}/api/jobs?status=failed&jobs_per_page=50"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["total_jobs"], 1);
    assert_eq!(jobs["jobs"][0]["elapsed"], "N/A");

    let missing = http.get(format!("{base}/api/report")).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Missing required parameter: backupjob_name");

    let chart = http
        .get(format!("{base}/api/charts/backup-job-1/files"))
        .send()
        .await
        .unwrap();
    assert!(chart.status().is_success());
    assert_eq!(
        chart.headers()[reqwest::header::CONTENT_TYPE],
        "image/svg+xml"
    );
    let svg = chart.text().await.unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(">Stored files<"));
    // one 250-file run in each of the three newest buckets
    assert_eq!(svg.matches(">250<").count(), 3);

    let bad_kind = http
        .get(format!("{base}/api/charts/backup-job-1/pie"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_kind.status(), reqwest::StatusCode::BAD_REQUEST);

    let index = http.get(&base).send().await.unwrap();
    assert!(index.text().await.unwrap().contains("<html"));

    drop(http);
    shutdown.cancel();
    serving.await.unwrap().unwrap();
}
