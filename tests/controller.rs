use dashboard::format::ChangeClass;
use dashboard::view::{StatusIndicator, TableBody, UiStatus, EMPTY_TABLE_TEXT};
use dashboard::{Endpoints, RefreshController, RefreshOutcome, Renderer};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_for(uri: &str, interval: Duration) -> RefreshController {
    let endpoints = Endpoints::new(uri, "/api/refresh", "/api/data", "/api/health").unwrap();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    RefreshController::new(client, endpoints, Renderer::default(), interval)
}

fn snapshot_body(names: &[&str]) -> Value {
    let cryptos: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "id": name.to_lowercase(),
                "name": name,
                "price_usd": 64000.5,
                "market_cap_usd": 1.26e12,
                "volume_24h_usd": 2.3e10,
                "change_24h_percent": -3.456,
                "transformed_at": "2024-05-01T12:00:00.000001"
            })
        })
        .collect();

    json!({
        "status": "success",
        "message": format!("Fetched {} cryptocurrencies", names.len()),
        "data": {
            "timestamp": "2024-05-01T12:00:00.000001",
            "source": "CoinGecko",
            "cryptos": cryptos,
            "summary": {
                "total_count": 5,
                "valid_count": names.len(),
                "null_count": 5 - names.len(),
                "errors": [],
                "data_quality_score": 80.0
            }
        }
    })
}

async fn mount_refresh(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/refresh"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_stats(server: &MockServer, update_count: u64) {
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "last_update": "2024-05-01T12:00:00",
            "stats": { "update_count": update_count, "error_count": 0 }
        })))
        .mount(server)
        .await;
}

/// No client timeout: on a paused clock it would fire as soon as the runtime idles.
fn paused_controller(interval: Duration) -> RefreshController {
    let endpoints = Endpoints::new("http://127.0.0.1:9", "/api/refresh", "/api/data", "/api/health").unwrap();
    RefreshController::new(reqwest::Client::new(), endpoints, Renderer::default(), interval)
}

/// Moves the paused clock and lets the woken timer and refresh tasks run up to their first I/O.
async fn advance(by: Duration) {
    tokio::time::advance(by).await;
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn refresh_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/refresh")
        .count()
}

async fn wait_for_refresh_requests(server: &MockServer, expected: usize) {
    while refresh_requests(server).await < expected {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn refresh_with_data(data: Value) -> RefreshController {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": data})),
    )
    .await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::Rendered);
    controller.settle().await;
    assert_eq!(controller.view().status, StatusIndicator::healthy());
    controller
}

#[tokio::test]
async fn successful_refresh_renders_snapshot() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Bitcoin", "Ethereum"]))).await;
    mount_stats(&server, 7).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::Rendered);
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.status, StatusIndicator::healthy());
    assert_eq!(view.status.message, "Connected");
    assert_eq!(view.total_count, "5");
    assert_eq!(view.valid_count, "2");
    assert_eq!(view.quality_score, "80.0%");
    assert_eq!(view.last_update, format!("Last update: {}", view.footer_time));
    assert_eq!(view.update_count, Some(7));

    let rows = view.table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells(), ["Bitcoin", "$64.00K", "1.26T", "23.00B", "↓ -3.46%"]);
    assert_eq!(rows[0].change_24h.class, ChangeClass::NegativeChange);
    assert_eq!(rows[1].name, "Ethereum");

    let metrics = controller.metrics();
    assert_eq!(metrics.refreshes_success, 1);
    assert_eq!(metrics.stats_success, 1);
}

#[tokio::test]
async fn new_snapshot_removes_stale_rows() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Bitcoin", "Ethereum"]))).await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    controller.refresh().await;
    controller.settle().await;

    server.reset().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Solana"]))).await;
    mount_stats(&server, 2).await;

    assert_eq!(controller.refresh().await, RefreshOutcome::Rendered);
    controller.settle().await;

    let view = controller.view();
    let names: Vec<_> = view.table.rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Solana"]);
    assert_eq!(view.update_count, Some(2));
    assert_eq!(view.revision, 2);
}

#[tokio::test]
async fn empty_snapshot_shows_placeholder() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&[]))).await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    controller.refresh().await;

    match controller.view().table {
        TableBody::Placeholder { text, colspan } => {
            assert_eq!(text, EMPTY_TABLE_TEXT);
            assert_eq!(colspan, 5);
        }
        other => panic!("expected placeholder, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_keeps_previous_render() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Bitcoin"]))).await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    controller.refresh().await;
    controller.settle().await;
    let before = controller.view();

    server.reset().await;
    mount_refresh(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "Failed to fetch market data from CoinGecko"
        })),
    )
    .await;

    let outcome = controller.refresh().await;
    assert_eq!(
        outcome,
        RefreshOutcome::ServerError("Failed to fetch market data from CoinGecko".to_string())
    );

    let after = controller.view();
    assert_eq!(after.status.state, UiStatus::Error);
    assert_eq!(after.status.message, "Error: Failed to fetch market data from CoinGecko");

    let mut expected = before;
    expected.status = after.status.clone();
    assert_eq!(after, expected);
    assert_eq!(controller.metrics().server_errors, 1);
}

#[tokio::test]
async fn server_error_without_message_uses_status_reason() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(503).set_body_json(json!({"status": "error"}))).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    let outcome = controller.refresh().await;
    assert_eq!(outcome, RefreshOutcome::ServerError("Service Unavailable".to_string()));
    assert_eq!(controller.view().status.message, "Error: Service Unavailable");
}

#[tokio::test]
async fn unparseable_body_is_a_connection_error() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::ConnectionError);

    let view = controller.view();
    assert_eq!(view.status, StatusIndicator::connection_error());
    assert_eq!(view.revision, 0);
}

#[tokio::test]
async fn error_status_with_html_body_is_a_connection_error() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(502).set_body_string("Bad Gateway")).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::ConnectionError);
    assert_eq!(controller.view().status.message, "Connection Error");
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let controller = controller_for("http://127.0.0.1:9", Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::ConnectionError);
    assert_eq!(controller.metrics().connection_errors, 1);
}

#[tokio::test]
async fn null_summary_and_items_render_placeholder() {
    let controller = refresh_with_data(json!({
        "timestamp": "2024-05-01T12:00:00",
        "summary": null,
        "cryptos": null
    }))
    .await;

    let view = controller.view();
    assert_eq!(view.total_count, "0");
    assert_eq!(view.valid_count, "0");
    assert_eq!(view.quality_score, "0.0%");
    assert_eq!(
        view.table,
        TableBody::Placeholder { text: EMPTY_TABLE_TEXT.to_string(), colspan: 5 }
    );
}

#[tokio::test]
async fn null_counts_render_as_zero() {
    let controller = refresh_with_data(json!({
        "timestamp": "2024-05-01T12:00:00",
        "summary": {"total_count": null, "valid_count": null, "data_quality_score": 75.5},
        "cryptos": []
    }))
    .await;

    let view = controller.view();
    assert_eq!(view.total_count, "0");
    assert_eq!(view.valid_count, "0");
    assert_eq!(view.quality_score, "75.5%");
}

#[tokio::test]
async fn nameless_items_still_render() {
    let controller = refresh_with_data(json!({
        "timestamp": "2024-05-01T12:00:00",
        "summary": {"total_count": 2, "valid_count": 2, "data_quality_score": 100.0},
        "cryptos": [
            {"name": null, "price_usd": 1.0},
            {"price_usd": 2.0}
        ]
    }))
    .await;

    let view = controller.view();
    let rows = view.table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "");
    assert_eq!(rows[0].price, "$1.00");
    assert_eq!(rows[1].price, "$2.00");
}

#[tokio::test]
async fn unreadable_timestamp_renders_not_available() {
    let controller = refresh_with_data(json!({
        "timestamp": "not a date",
        "summary": {"total_count": 1, "valid_count": 1, "data_quality_score": 100.0},
        "cryptos": [{"name": "Bitcoin", "price_usd": 64000.0}]
    }))
    .await;

    let view = controller.view();
    assert_eq!(view.last_update, "Last update: N/A");
    assert_eq!(view.footer_time, "N/A");
    assert_eq!(view.table.rows()[0].name, "Bitcoin");
}

#[tokio::test]
async fn missing_data_leaves_view_untouched() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": null}))).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::NoData);

    let view = controller.view();
    assert_eq!(view.status, StatusIndicator::healthy());
    assert_eq!(view.revision, 0);
    assert!(view.table.rows().is_empty());
}

#[tokio::test]
async fn stats_failure_is_swallowed() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Bitcoin"]))).await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    assert_eq!(controller.refresh().await, RefreshOutcome::Rendered);
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.status, StatusIndicator::healthy());
    assert_eq!(view.update_count, None);
    assert_eq!(controller.metrics().stats_failed, 1);
}

#[tokio::test]
async fn stats_without_counter_is_ignored() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Bitcoin"]))).await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    controller.refresh().await;
    controller.settle().await;
    assert_eq!(controller.view().update_count, None);
}

#[tokio::test]
async fn status_is_loading_while_request_is_in_flight() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(snapshot_body(&["Bitcoin"]))
            .set_delay(Duration::from_millis(400)),
    )
    .await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    let mut views = controller.watch_view();
    views.borrow_and_update();

    let pending = controller.trigger();
    views.changed().await.unwrap();
    assert_eq!(views.borrow_and_update().status, StatusIndicator::loading());

    assert_eq!(pending.await.unwrap(), RefreshOutcome::Rendered);
    assert_eq!(controller.view().status, StatusIndicator::healthy());
}

#[tokio::test]
async fn overlapping_refreshes_keep_the_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(snapshot_body(&["Slow"]))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_refresh(&server, ResponseTemplate::new(200).set_body_json(snapshot_body(&["Fast"]))).await;
    mount_stats(&server, 1).await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    let slow = controller.trigger();
    wait_for_refresh_requests(&server, 1).await;
    let fast = controller.trigger();

    assert_eq!(fast.await.unwrap(), RefreshOutcome::Rendered);
    assert_eq!(controller.view().table.rows()[0].name, "Fast");

    assert_eq!(slow.await.unwrap(), RefreshOutcome::Rendered);
    assert_eq!(controller.view().table.rows()[0].name, "Slow");
}

#[tokio::test(start_paused = true)]
async fn restarting_the_timer_keeps_a_single_timer() {
    let mut controller = paused_controller(Duration::from_millis(300));
    controller.start_auto_refresh();
    controller.start_auto_refresh();
    assert!(controller.is_auto_refreshing());

    advance(Duration::from_millis(299)).await;
    assert_eq!(controller.metrics().refreshes_started, 0, "start must not refresh immediately");

    advance(Duration::from_millis(1)).await;
    assert_eq!(controller.metrics().refreshes_started, 1);

    advance(Duration::from_millis(300)).await;
    assert_eq!(controller.metrics().refreshes_started, 2);

    controller.stop_auto_refresh();
    assert!(!controller.is_auto_refreshing());

    advance(Duration::from_secs(3)).await;
    assert_eq!(controller.metrics().refreshes_started, 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_stops_the_timer() {
    let mut controller = paused_controller(Duration::from_millis(300));
    controller.start_auto_refresh();
    let views = controller.watch_view();
    drop(controller);

    advance(Duration::from_secs(3)).await;
    assert_eq!(views.borrow().status, StatusIndicator::loading());
    assert!(!views.has_changed().unwrap_or(false));
}

#[tokio::test]
async fn stop_without_timer_is_a_no_op() {
    let mut controller = controller_for("http://127.0.0.1:9", Duration::from_secs(30));
    controller.stop_auto_refresh();
    assert!(!controller.is_auto_refreshing());
}

#[tokio::test]
async fn health_report_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2024-05-01T12:00:00.5",
            "ingester": {"running": true},
            "cache": {"has_data": true, "last_update": "2024-05-01T11:59:00", "update_count": 12, "error_count": 1}
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), Duration::from_secs(30));
    let report = controller.health().await.unwrap();
    assert_eq!(report.status, "healthy");
    assert!(report.timestamp.is_some());
    assert!(report.cache.has_data);
    assert_eq!(report.cache.update_count, 12);
    assert_eq!(report.cache.error_count, 1);
}
