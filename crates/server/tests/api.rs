use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chain::TxBuilder;
use parking_lot::Mutex;
use server::{
    api::Info,
    kyc::{KycInfo, FIELDS},
    KycCallback, KycProvider, Server, ServerConfig,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use storage::{CoreId, CoreIdStorage, MemoryStorage, StorageError, StorageResult};
use tokio::sync::Notify;
use tower::ServiceExt;

const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

const SENDER: Address = Address::repeat_byte(0x11);
const NATIVE_HASH: TxHash = TxHash::repeat_byte(0xaa);
const TOKEN_HASH: TxHash = TxHash::repeat_byte(0xbb);
const CHAIN_ID: u64 = 1337;

#[derive(Debug, Default)]
struct MockTxBuilder {
    native: AtomicUsize,
    tokens: AtomicUsize,
    fail_native: AtomicBool,
    /// Native transfers wait for `release` while set
    hold: AtomicBool,
    release: Notify,
}

impl MockTxBuilder {
    fn payouts(&self) -> usize {
        self.tokens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TxBuilder for MockTxBuilder {
    fn sender(&self) -> Address {
        SENDER
    }

    fn chain_id(&self) -> u64 {
        CHAIN_ID
    }

    async fn transfer(&self, _to: Address, _value: U256) -> eyre::Result<TxHash> {
        self.native.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_native.load(Ordering::SeqCst) {
            eyre::bail!("insufficient funds for gas * price + value");
        }
        Ok(NATIVE_HASH)
    }

    async fn transfer_tokens(&self, _to: Address, _value: U256) -> eyre::Result<TxHash> {
        self.tokens.fetch_add(1, Ordering::SeqCst);
        Ok(TOKEN_HASH)
    }
}

#[derive(Debug, Default)]
struct MockKyc {
    requested: Mutex<Vec<String>>,
    fail: AtomicBool,
}

#[async_trait]
impl KycProvider for MockKyc {
    async fn request(&self, user: &str) -> eyre::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            eyre::bail!("service unavailable");
        }
        self.requested.lock().push(user.to_string());
        Ok(())
    }
}

/// Memory storage whose operations can be switched to fail.
#[derive(Debug, Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fail_get: AtomicBool,
    fail_create: AtomicBool,
    fail_verify: AtomicBool,
}

fn unavailable() -> StorageError {
    StorageError::Database("database is locked".to_string())
}

impl CoreIdStorage for FlakyStorage {
    fn get_core_id(&self, id: &str) -> StorageResult<CoreId> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get_core_id(id)
    }

    fn create_core_id(&self, core_id: &CoreId) -> StorageResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.create_core_id(core_id)
    }

    fn verify(&self, id: &str) -> StorageResult<()> {
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.verify(id)
    }
}

struct Harness {
    tx_builder: Arc<MockTxBuilder>,
    kyc: Arc<MockKyc>,
    storage: Arc<FlakyStorage>,
    router: Router,
}

fn config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        proxy_count: 0,
        interval: Duration::from_secs(24 * 60 * 60),
        queue_cap: 100,
        payout: 1,
        tokens_payout: 200,
        web_dir: None,
    }
}

fn harness(config: ServerConfig) -> Harness {
    let tx_builder = Arc::new(MockTxBuilder::default());
    let kyc = Arc::new(MockKyc::default());
    let storage = Arc::new(FlakyStorage::default());

    let server = Server::new(tx_builder.clone(), storage.clone(), kyc.clone(), config);
    let router = server
        .router()
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

    Harness {
        tx_builder,
        kyc,
        storage,
        router,
    }
}

fn funded_body() -> String {
    format!("Txhash: {NATIVE_HASH}, TokensTxHash: {TOKEN_HASH}")
}

/// A callback carrying every requested field for `user`.
fn complete_callback(user: &str) -> KycCallback {
    KycCallback {
        user: user.to_string(),
        infos: FIELDS
            .iter()
            .map(|name| KycInfo {
                fields: HashMap::from([(name.to_string(), "value".to_string())]),
                pepper: "pepper".to_string(),
            })
            .collect(),
    }
}

fn token_for(id: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"coreid:{id}"}}"#));
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn claim(address: &str) -> Request<Body> {
    form("/api/claim", format!("address={address}"))
}

fn claim_authorized(id: &str) -> Request<Body> {
    form("/api/claimAuthorized", format!("jwt={}", token_for(id)))
}

fn callback(payload: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/callback")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_claim_funds_address() {
    let h = harness(config());

    let (status, body) = send(&h.router, claim(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, funded_body());
    assert_eq!(h.tx_builder.native.load(Ordering::SeqCst), 1);
    assert_eq!(h.tx_builder.payouts(), 1);
}

#[tokio::test]
async fn test_claim_rejects_unchecksummed_address() {
    let h = harness(config());

    for address in [ALICE.to_lowercase(), "0x1234".to_string(), String::new()] {
        let (status, body) = send(&h.router, claim(&address)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "invalid address");
    }
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_claim_rate_limited_per_address_and_ip() {
    let h = harness(config());

    assert_eq!(send(&h.router, claim(ALICE)).await.0, StatusCode::OK);

    let (status, body) = send(&h.router, claim(ALICE)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.starts_with("You have exceeded the rate limit. Please wait "));
    assert!(body.ends_with(" before you try again"));

    // Same client IP, different address
    let (status, _) = send(&h.router, claim(BOB)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(h.tx_builder.payouts(), 1);
}

#[tokio::test]
async fn test_claim_ip_behind_proxy() {
    let h = harness(ServerConfig {
        proxy_count: 1,
        ..config()
    });

    let from = |address: &str, ip: &str| {
        let mut request = claim(address);
        request
            .headers_mut()
            .insert("X-Forwarded-For", ip.parse().unwrap());
        request
    };

    assert_eq!(
        send(&h.router, from(ALICE, "1.1.1.1")).await.0,
        StatusCode::OK
    );
    assert_eq!(send(&h.router, from(BOB, "2.2.2.2")).await.0, StatusCode::OK);
    assert_eq!(
        send(&h.router, from(CAROL, "6.6.6.6, 2.2.2.2")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_failed_transfer_releases_limit() {
    let h = harness(config());
    h.tx_builder.fail_native.store(true, Ordering::SeqCst);

    let (status, body) = send(&h.router, claim(ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("insufficient funds"));

    h.tx_builder.fail_native.store(false, Ordering::SeqCst);
    let (status, body) = send(&h.router, claim(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, funded_body());
}

#[tokio::test]
async fn test_disabled_limit() {
    let h = harness(ServerConfig {
        interval: Duration::ZERO,
        ..config()
    });

    for _ in 0..3 {
        assert_eq!(send(&h.router, claim(ALICE)).await.0, StatusCode::OK);
    }
    assert_eq!(h.tx_builder.payouts(), 3);
}

#[tokio::test]
async fn test_queue_while_funding_in_flight() {
    let h = harness(ServerConfig {
        interval: Duration::ZERO,
        queue_cap: 1,
        ..config()
    });
    h.tx_builder.hold.store(true, Ordering::SeqCst);

    let router = h.router.clone();
    let first = tokio::spawn(async move { send(&router, claim(ALICE)).await });
    while h.tx_builder.native.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let (status, body) = send(&h.router, claim(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("Added {BOB} to the queue"));

    let (status, body) = send(&h.router, claim(CAROL)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Faucet queue is too long, please try again later");

    h.tx_builder.hold.store(false, Ordering::SeqCst);
    h.tx_builder.release.notify_one();

    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, funded_body());
}

#[tokio::test]
async fn test_claim_authorized_bad_jwt() {
    let h = harness(config());

    let (status, body) = send(&h.router, form("/api/claimAuthorized", "jwt=garbage".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad JWT Token");

    let header = URL_SAFE_NO_PAD.encode(b"{}");
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user:{ALICE}"}}"#));
    let (status, body) = send(
        &h.router,
        form("/api/claimAuthorized", format!("jwt={header}.{payload}.sig")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad JWT Token");
}

#[tokio::test]
async fn test_claim_authorized_invalid_id() {
    let h = harness(config());

    let (status, body) = send(&h.router, claim_authorized(&ALICE.to_lowercase())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid address");
    assert!(h.kyc.requested.lock().is_empty());
}

#[tokio::test]
async fn test_claim_authorized_unknown_id_requests_kyc() {
    let h = harness(config());

    let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "KYC data has been requested");
    assert_eq!(*h.kyc.requested.lock(), vec![ALICE.to_string()]);

    let stored = h.storage.get_core_id(ALICE).unwrap();
    assert!(!stored.verified);
    assert_eq!(h.tx_builder.payouts(), 0);

    // Polling while the data is outstanding never locks the user out
    for _ in 0..2 {
        let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Requesting data is in progress");
    }
    assert_eq!(h.kyc.requested.lock().len(), 1);
}

#[tokio::test]
async fn test_claim_authorized_kyc_failure() {
    let h = harness(config());
    h.kyc.fail.store(true, Ordering::SeqCst);

    let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "/kyc/request endpoint returned err: service unavailable");
    assert!(matches!(
        h.storage.get_core_id(ALICE),
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn test_claim_authorized_verified_id() {
    let h = harness(config());
    h.storage.create_core_id(&CoreId::new(ALICE)).unwrap();
    h.storage.verify(ALICE).unwrap();

    let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, funded_body());

    let (status, _) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Anonymous and authorized claims are limited separately
    let (status, _) = send(&h.router, claim(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.kyc.requested.lock().is_empty());
}

#[tokio::test]
async fn test_callback_verifies_and_funds() {
    let h = harness(config());
    h.storage.create_core_id(&CoreId::new(ALICE)).unwrap();

    let payload = serde_json::to_value(complete_callback(ALICE)).unwrap();
    let (status, body) = send(&h.router, callback(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, funded_body());
    assert!(h.storage.get_core_id(ALICE).unwrap().verified);
}

#[tokio::test]
async fn test_callback_rejects_incomplete_data() {
    let h = harness(config());
    h.storage.create_core_id(&CoreId::new(ALICE)).unwrap();

    let mut incomplete = complete_callback(ALICE);
    incomplete.infos.truncate(11);
    let mut reordered = complete_callback(ALICE);
    reordered.infos.swap(10, 11);

    for payload in [
        serde_json::to_value(incomplete).unwrap(),
        serde_json::to_value(reordered).unwrap(),
        serde_json::to_value(complete_callback("not an address")).unwrap(),
        serde_json::json!({ "user": ALICE, "infos": "nope" }),
    ] {
        let (status, body) = send(&h.router, callback(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Bad Request");
    }

    assert!(!h.storage.get_core_id(ALICE).unwrap().verified);
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_callback_unknown_user() {
    let h = harness(config());

    let payload = serde_json::to_value(complete_callback(ALICE)).unwrap();
    let (status, _) = send(&h.router, callback(&payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_info() {
    let h = harness(config());

    let request = Request::builder()
        .uri("/api/info")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let info: Info = serde_json::from_str(&body).unwrap();
    assert_eq!(
        info,
        Info {
            account: SENDER.to_checksum(None),
            network: CHAIN_ID.to_string(),
            payout: "1".to_string(),
            tokens_payout: "200".to_string(),
        }
    );
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let h = harness(config());

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(send(&h.router, health).await, (StatusCode::OK, "OK".to_string()));

    let missing = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    assert_eq!(send(&h.router, missing).await.0, StatusCode::NOT_FOUND);

    // Funding routes only accept POST
    let get_claim = Request::builder()
        .uri("/api/claim")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        send(&h.router, get_claim).await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[tokio::test]
async fn test_serves_web_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>faucet</h1>").unwrap();

    let h = harness(ServerConfig {
        web_dir: Some(dir.path().to_path_buf()),
        ..config()
    });

    let index = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, index).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>faucet</h1>");

    // API routes still win over the fallback
    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(send(&h.router, health).await.1, "OK");
}

#[tokio::test]
async fn test_claim_authorized_lookup_failure() {
    let h = harness(config());
    h.storage.fail_get.store(true, Ordering::SeqCst);

    let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    assert!(h.kyc.requested.lock().is_empty());
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_claim_authorized_create_failure() {
    let h = harness(config());
    h.storage.fail_create.store(true, Ordering::SeqCst);

    let (status, body) = send(&h.router, claim_authorized(ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    assert_eq!(*h.kyc.requested.lock(), vec![ALICE.to_string()]);
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_callback_verify_failure_stops_payout() {
    let h = harness(config());
    h.storage.create_core_id(&CoreId::new(ALICE)).unwrap();
    h.storage.fail_verify.store(true, Ordering::SeqCst);

    let payload = serde_json::to_value(complete_callback(ALICE)).unwrap();
    let (status, body) = send(&h.router, callback(&payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    assert_eq!(h.tx_builder.native.load(Ordering::SeqCst), 0);
    assert_eq!(h.tx_builder.payouts(), 0);
}

#[tokio::test]
async fn test_unreadable_forms_answer_with_field_errors() {
    let h = harness(config());

    let json_claim = Request::builder()
        .method("POST")
        .uri("/api/claim")
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"address":"{ALICE}"}}"#)))
        .unwrap();
    assert_eq!(
        send(&h.router, json_claim).await,
        (StatusCode::BAD_REQUEST, "invalid address".to_string())
    );

    let bare_claim = Request::builder()
        .method("POST")
        .uri("/api/claimAuthorized")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        send(&h.router, bare_claim).await,
        (StatusCode::BAD_REQUEST, "Bad JWT Token".to_string())
    );

    assert_eq!(h.tx_builder.payouts(), 0);
}
