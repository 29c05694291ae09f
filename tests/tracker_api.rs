//! End-to-end tests for request tracking and the tracker API.

use serde_json::Value;

mod common;

use common::{client, start_server, test_config, API_KEY};

async fn query(server: &common::TestServer, action: &str) -> (u16, String) {
    let res = client()
        .get(server.tracker_url())
        .query(&[("api-key", API_KEY), ("action", action)])
        .send()
        .await
        .expect("Tracker API unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_completed_requests_are_served_newest_first() {
    let server = start_server(test_config(16)).await;
    let client = client();

    for path in ["/", "/?name=grumpy", "/missing"] {
        client.get(server.url(path)).send().await.unwrap();
    }

    let (status, body) = query(&server, "completed_tasks").await;
    assert_eq!(status, 200);

    let tasks: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(tasks.len(), 3, "tracker API calls must not be recorded");

    assert_eq!(tasks[0]["task_id"], 3);
    assert_eq!(tasks[0]["path"], "/missing");
    assert_eq!(tasks[0]["status_code"], 404);

    assert_eq!(tasks[1]["task_id"], 2);
    assert_eq!(tasks[1]["params"], serde_json::json!([["name", "grumpy"]]));

    let first = &tasks[2];
    assert_eq!(first["task_id"], 1);
    assert_eq!(first["method"], "GET");
    assert_eq!(first["status_code"], 200);
    assert_eq!(first["status_message"], "OK");
    assert_eq!(first["recorded_successfully"], true);
    assert_eq!(first["client_ip_address"], "127.0.0.1");
    assert_eq!(first["host"], server.addr.to_string());
    assert_eq!(first["ended_at"], first["updated_at"]);
    assert!(first["process_id"].as_u64().unwrap() > 0);
    assert!(first["thread_id"].is_u64());
    assert!(first["tags"]["process.platform"].is_string());

    let request_headers = first["request_headers"].as_array().unwrap();
    assert!(request_headers.iter().any(|h| h[0] == "HOST"));
    let response_headers = first["response_headers"].as_array().unwrap();
    assert!(response_headers.iter().any(|h| h[0] == "CONTENT-TYPE"));
}

#[tokio::test]
async fn test_in_flight_request_is_active() {
    let server = start_server(test_config(16)).await;

    let url = server.url("/gate");
    let pending = tokio::spawn(async move { client().get(url).send().await });
    server.wait_for_active(1).await;

    let (status, body) = query(&server, "active_tasks").await;
    assert_eq!(status, 200);

    let active: Value = serde_json::from_str(&body).unwrap();
    let map = active.as_object().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(active["1"]["path"], "/gate");
    assert!(active["1"].get("ended_at").is_none());
    assert!(active["1"].get("status_code").is_none());

    server.gate.add_permits(1);
    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status(), 200);

    server.wait_for_active(0).await;
    let (_, body) = query(&server, "completed_tasks").await;
    let completed: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(completed[0]["path"], "/gate");
}

#[tokio::test]
async fn test_auth_matrix() {
    let server = start_server(test_config(16)).await;
    let client = client();

    let res = client
        .get(server.tracker_url())
        .query(&[("action", "active_tasks")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "api-key parameter missing");

    let res = client
        .get(server.tracker_url())
        .query(&[("api-key", "wrongwrongwrong!"), ("action", "active_tasks")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "API key wron... does not match 0123...");

    let res = client
        .post(server.tracker_url())
        .query(&[("api-key", API_KEY), ("action", "active_tasks")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    let res = client
        .get(server.tracker_url())
        .query(&[("api-key", API_KEY)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 420);
    assert_eq!(res.text().await.unwrap(), "action parameter missing");

    let (status, body) = query(&server, "bogus").await;
    assert_eq!(status, 420);
    assert!(body.contains("bogus"));

    let res = client
        .get(server.tracker_url())
        .query(&[("api-key", API_KEY), ("action", "active_tasks")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.contains("application/json"));
    assert_eq!(res.text().await.unwrap(), "{}");

    // Rejected API calls are not tracked either.
    assert_eq!(server.tracker.completed_count(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_keep_state_consistent() {
    let bound = 16;
    let server = start_server(test_config(bound)).await;
    let client = client();

    let total = 64;
    let mut handles = Vec::new();
    for i in 0..total {
        let client = client.clone();
        let url = server.url(&format!("/?n={}", i));
        handles.push(tokio::spawn(async move { client.get(url).send().await }));
    }
    for _ in 0..4 {
        let (status, _) = query(&server, "completed_tasks").await;
        assert_eq!(status, 200);
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().status(), 200);
    }

    server.wait_for_active(0).await;

    let (_, body) = query(&server, "completed_tasks").await;
    let completed: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(completed.len(), bound.min(total));

    let mut ids: Vec<u64> = completed
        .iter()
        .map(|t| t["task_id"].as_u64().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), bound, "identifiers must be unique");
    assert!(ids.iter().all(|id| (1..=total as u64).contains(id)));
}
