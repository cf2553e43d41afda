//! HTTP Transport Integration Tests
//!
//! Exercises `HttpRegistryTransport` against an in-process mock authority
//! that speaks the same JSON-RPC methods as a real registry server.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use regcache_common::protocol::jsonrpc::{CANCEL_METHOD, FETCH_DELTA_METHOD, FETCH_FULL_METHOD};
use regcache_common::{
    ChangeRecord, DeltaBatch, HttpRegistryTransport, HttpTransportConfig, InstanceRecord,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RegcacheError, RegistrySnapshot,
    RegistryTransport,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Mock Authority Server
// ============================================================================

#[derive(Default)]
struct AuthorityState {
    snapshot: Mutex<RegistrySnapshot>,
    delta: Mutex<DeltaBatch>,
    cancelled: Mutex<Vec<(String, String)>>,
    unavailable: AtomicBool,
    slow: AtomicBool,
    garbage_result: AtomicBool,
}

struct MockAuthority {
    addr: SocketAddr,
    state: Arc<AuthorityState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockAuthority {
    async fn start() -> Self {
        let state = Arc::new(AuthorityState::default());
        let app = Router::new()
            .route("/", post(handle_jsonrpc))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _handle: handle,
        }
    }

    fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    fn transport(&self) -> HttpRegistryTransport {
        HttpRegistryTransport::new(
            HttpTransportConfig::new(self.url()).with_request_timeout(Duration::from_millis(500)),
        )
        .unwrap()
    }
}

async fn handle_jsonrpc(
    State(state): State<Arc<AuthorityState>>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if state.unavailable.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!("unavailable"))).into_response();
    }
    if state.slow.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if state.garbage_result.load(Ordering::SeqCst) {
        let resp = JsonRpcResponse::success(req.id, json!([1, 2, 3]));
        return (StatusCode::OK, Json(resp)).into_response();
    }

    let resp = match req.method.as_str() {
        FETCH_FULL_METHOD => {
            let snapshot = state.snapshot.lock().await.clone();
            JsonRpcResponse::success(req.id, serde_json::to_value(snapshot).unwrap())
        }
        FETCH_DELTA_METHOD => {
            let delta = state.delta.lock().await.clone();
            JsonRpcResponse::success(req.id, serde_json::to_value(delta).unwrap())
        }
        CANCEL_METHOD => {
            let service = req.params["service_name"].as_str().unwrap_or_default().to_string();
            let instance = req.params["instance_id"].as_str().unwrap_or_default().to_string();
            state.cancelled.lock().await.push((service, instance));
            JsonRpcResponse::success(req.id, json!(null))
        }
        _ => JsonRpcResponse::error(req.id, JsonRpcError::method_not_found()),
    };
    (StatusCode::OK, Json(resp)).into_response()
}

fn finance_instance() -> InstanceRecord {
    InstanceRecord::new(
        "FINANCE-SERVICE",
        "FINANCE-SERVICE-192.168.31.207:9000",
        "192.168.31.207",
        "finance-service-01",
        9000,
    )
}

fn order_instance() -> InstanceRecord {
    InstanceRecord::new(
        "ORDER-SERVICE",
        "ORDER-SERVICE-192.168.31.208:9000",
        "192.168.31.208",
        "order-service-01",
        9000,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_full_registry() {
    let authority = MockAuthority::start().await;
    *authority.state.snapshot.lock().await = RegistrySnapshot::from_instances(vec![finance_instance()]);

    let snapshot = authority.transport().fetch_full_registry().await.unwrap();

    assert_eq!(snapshot.total_instance_count(), 1);
    assert_eq!(
        snapshot.instance("FINANCE-SERVICE", "FINANCE-SERVICE-192.168.31.207:9000"),
        Some(&finance_instance())
    );
}

#[tokio::test]
async fn test_fetch_delta_registry() {
    let authority = MockAuthority::start().await;
    *authority.state.delta.lock().await =
        DeltaBatch::new(vec![ChangeRecord::register(order_instance())], 2);

    let delta = authority.transport().fetch_delta_registry().await.unwrap();

    assert_eq!(delta.authority_total_instance_count, 2);
    assert_eq!(delta.changes.len(), 1);
    assert_eq!(delta.changes[0].instance, order_instance());
}

#[tokio::test]
async fn test_cancel_instance_reaches_authority() {
    let authority = MockAuthority::start().await;

    authority
        .transport()
        .cancel_instance("inventory-service", "abc123")
        .await
        .unwrap();

    let cancelled = authority.state.cancelled.lock().await;
    assert_eq!(
        cancelled.as_slice(),
        &[("inventory-service".to_string(), "abc123".to_string())]
    );
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() {
    let authority = MockAuthority::start().await;
    authority.state.unavailable.store(true, Ordering::SeqCst);

    let err = authority.transport().fetch_full_registry().await.unwrap_err();
    assert!(matches!(err, RegcacheError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_slow_authority_times_out() {
    let authority = MockAuthority::start().await;
    authority.state.slow.store(true, Ordering::SeqCst);

    let err = authority.transport().fetch_delta_registry().await.unwrap_err();
    assert!(matches!(err, RegcacheError::Timeout(500)), "got {:?}", err);
}

#[tokio::test]
async fn test_unexpected_result_shape_is_invalid_response() {
    let authority = MockAuthority::start().await;
    authority.state.garbage_result.store(true, Ordering::SeqCst);

    let err = authority.transport().fetch_delta_registry().await.unwrap_err();
    assert!(matches!(err, RegcacheError::InvalidResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_transport() {
    let authority = MockAuthority::start().await;
    *authority.state.snapshot.lock().await =
        RegistrySnapshot::from_instances(vec![finance_instance(), order_instance()]);
    let transport = Arc::new(authority.transport());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let transport = transport.clone();
        handles.push(tokio::spawn(async move {
            transport.fetch_full_registry().await.unwrap().total_instance_count()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }
}
