#![allow(clippy::unwrap_used)]
// Integration tests for `RouterClient` using wiremock.

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cudymon_api::{AuthScheme, Error, RouterClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const LOGIN_PAGE_WITH_FIELDS: &str = r#"
    <form method="post">
        <input type="hidden" name="_csrf" value="csrf-1"/>
        <input type="hidden" name="token" value="tok-1"/>
        <input type="hidden" name="salt" value="salt-1"/>
    </form>"#;

const LOGIN_PAGE_WITHOUT_FIELDS: &str = "<form method=\"post\"></form>";

async fn setup() -> (MockServer, RouterClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RouterClient::new(
        base_url,
        "admin",
        SecretString::from("test-password".to_owned()),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_modern_login_success_despite_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE_WITH_FIELDS))
        .mount(&server)
        .await;

    // The login POST answers 403 -- success is defined by the cookie.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .and(body_string_contains("luci_username=admin"))
        .and(body_string_contains("salt=salt-1"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("set-cookie", "sysauth=modern-cookie; path=/"),
        )
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();

    let session = client.session().await;
    assert!(session.is_authenticated());
    assert_eq!(session.cookie(), Some("modern-cookie"));
    assert_eq!(session.scheme(), Some(AuthScheme::Modern));
}

#[tokio::test]
async fn test_modern_login_posts_derived_hash_not_plaintext() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE_WITH_FIELDS))
        .mount(&server)
        .await;

    // Reject any POST carrying the raw password; accept the hashed form.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .and(body_string_contains("luci_password=test-password"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sysauth=hashed-login; path=/"),
        )
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
    assert_eq!(client.session().await.cookie(), Some("hashed-login"));
}

#[tokio::test]
async fn test_legacy_fallback_when_no_salt_or_token() {
    let (server, client) = setup().await;

    // Modern flow finds no salt/token pair on the login page.
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE_WITHOUT_FIELDS))
        .mount(&server)
        .await;

    // Legacy plaintext POST to the bare endpoint succeeds via redirect.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci"))
        .and(body_string_contains("luci_username=admin"))
        .and(body_string_contains("luci_password=test-password"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "sysauth=legacy-cookie; path=/")
                .insert_header("location", "/cgi-bin/luci/admin"),
        )
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();

    let session = client.session().await;
    assert_eq!(session.cookie(), Some("legacy-cookie"));
    assert_eq!(session.scheme(), Some(AuthScheme::Legacy));
}

#[tokio::test]
async fn test_both_schemes_refused_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE_WITH_FIELDS))
        .mount(&server)
        .await;

    // Modern POST completes but never grants a cookie.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    // Legacy endpoint refuses outright.
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.authenticate().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.session().await.is_authenticated());
}

// ── Page fetch tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_page_triggers_single_reauth() {
    let (server, client) = setup().await;

    // First fetch of the page is rejected; after re-login it succeeds.
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/lan/status"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/lan/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE_WITH_FIELDS))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sysauth=fresh-cookie; path=/"),
        )
        .mount(&server)
        .await;

    let body = client.get_page("admin/network/lan/status", false).await;
    assert_eq!(body, "<table></table>");
    assert_eq!(client.session().await.cookie(), Some("fresh-cookie"));
}

#[tokio::test]
async fn test_persistent_forbidden_degrades_to_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let body = client.get_page("admin/network/lan/status", false).await;
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/status"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = client.get_page("admin/system/status", true).await;
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_model_scraped_from_login_banner() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            r#"<input type="hidden" name="modelname" value="WR3000S V1.0">"#,
        ))
        .mount(&server)
        .await;

    assert_eq!(client.get_model().await, "WR3000S V1.0");
}

#[tokio::test]
async fn test_model_defaults_when_banner_is_bare() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Login</html>"))
        .mount(&server)
        .await;

    assert_eq!(client.get_model().await, "default");
}

// ── Action tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_reboot_replays_page_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/reboot/reboot"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input type="hidden" name="token" value="reboot-tok"/>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/system/reboot/reboot"))
        .and(body_string_contains("token=reboot-tok"))
        .and(body_string_contains("cbi.submit=1"))
        .and(body_string_contains("cbi.apply=OK"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/cgi-bin/luci/admin"))
        .mount(&server)
        .await;

    let outcome = client.reboot_router().await;
    assert!(outcome.succeeded());
    assert_eq!(outcome.status, 302);
}

#[tokio::test]
async fn test_reboot_without_token_fails_without_post() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/reboot/reboot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no form</html>"))
        .mount(&server)
        .await;

    let outcome = client.reboot_router().await;
    assert!(!outcome.succeeded());
    assert!(outcome.detail.contains("no token"));
}

#[tokio::test]
async fn test_send_sms_posts_compose_fields() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/gcom/sms/smsnew"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input type="hidden" name="token" value="sms-tok"/>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/network/gcom/sms/smsnew"))
        .and(body_string_contains("token=sms-tok"))
        .and(body_string_contains("cbid.smsnew.1.phone=%2B441234567890"))
        .and(body_string_contains("cbid.smsnew.1.content=hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("sent"))
        .mount(&server)
        .await;

    let outcome = client.send_sms("+441234567890", "hello").await;
    assert!(outcome.succeeded());
    assert_eq!(outcome.detail, "sent");
}

#[tokio::test]
async fn test_at_command_lifts_textarea_output() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/gcom/atcmd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input type="hidden" name="token" value="at-tok"/>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/network/gcom/atcmd"))
        .and(body_string_contains("cbid.atcmd.1.command=AT%2BCSQ"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<textarea id="cbid.atcmd.1._custom">+CSQ: 22,99</textarea>"#,
        ))
        .mount(&server)
        .await;

    let outcome = client.send_at_command("AT+CSQ").await;
    assert!(outcome.succeeded());
    assert_eq!(outcome.detail, "+CSQ: 22,99");
}

#[tokio::test]
async fn test_switch_band_discovers_select_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/gcom/setting"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input type="hidden" name="token" value="band-tok"/>
               <select name="cbid.setting.1.band"><option>auto</option></select>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/network/gcom/setting"))
        .and(body_string_contains("cbid.setting.1.band=B78"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = client.switch_5g_band("B78").await;
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_mesh_led_probes_candidate_endpoints() {
    let (server, client) = setup().await;

    // First two candidate endpoints don't exist on this firmware.
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/mesh/led"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/mesh/settings"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/led"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input type="hidden" name="token" value="led-tok"/>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/system/led"))
        .and(body_string_contains("token=led-tok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = client.set_mesh_led("AA:BB:CC:DD:EE:01", false).await;
    assert!(outcome.succeeded());
    assert!(outcome.detail.contains("LED off"));
}
