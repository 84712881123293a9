use std::sync::atomic::Ordering;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use livecalc_auth::TokenHandler;
use livecalc_cache::TableCache;
use livecalc_transport::HttpTransport;

mod support;
use support::MockServer;

fn long_lived_jwt() -> String {
    let exp = Utc::now().timestamp() + 3600;
    let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
    let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
    format!("{header}.{payload}.sig")
}

fn resolver_for(base_url: &str) -> livecalc_assumptions::AssumptionResolver {
    let transport = HttpTransport::with_timeout(base_url, Duration::from_secs(2)).unwrap();
    let token_handler = TokenHandler::with_token(base_url, long_lived_jwt()).unwrap();
    let cache_root =
        std::env::temp_dir().join(format!("livecalc-resolver-test-{}", std::process::id()));
    let cache = TableCache::with_root(cache_root);
    livecalc_assumptions::AssumptionResolver::new(transport, token_handler, cache)
}

#[test]
fn mutable_tag_bypasses_cache_on_every_call() {
    let server = MockServer::start(|_n| (200, r#"{"data":[0.01,0.02,0.03]}"#.to_string()));
    let resolver = resolver_for(&server.base_url);

    let first = resolver.resolve("mortality-standard", "latest").unwrap();
    let second = resolver.resolve("mortality-standard", "latest").unwrap();

    assert_eq!(first, vec![0.01, 0.02, 0.03]);
    assert_eq!(second, vec![0.01, 0.02, 0.03]);
    assert_eq!(
        server.request_count.load(Ordering::SeqCst),
        2,
        "a :latest key must never be served from cache"
    );
}

#[test]
fn cacheable_version_is_only_fetched_once() {
    let server = MockServer::start(|_n| (200, r#"{"data":[1.0,2.0]}"#.to_string()));
    let resolver = resolver_for(&server.base_url);

    let first = resolver.resolve("mortality-standard", "v2.1").unwrap();
    let second = resolver.resolve("mortality-standard", "v2.1").unwrap();

    assert_eq!(first, second);
    assert_eq!(
        server.request_count.load(Ordering::SeqCst),
        1,
        "a concrete version must be served from cache on the second call"
    );
}

#[test]
fn retries_on_server_error_then_fails_fast_on_404() {
    let server = MockServer::start(|n| {
        if n == 1 {
            (500, "server exploded".to_string())
        } else {
            (404, "not here".to_string())
        }
    });
    let resolver = resolver_for(&server.base_url);

    let err = resolver.resolve("mortality-standard", "v9.9").unwrap_err();

    assert_eq!(
        server.request_count.load(Ordering::SeqCst),
        2,
        "404 must fail fast without a further retry attempt"
    );
    assert!(matches!(err, livecalc_assumptions::ResolutionError::Transport { .. }));
}
