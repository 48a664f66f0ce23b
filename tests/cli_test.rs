#![allow(deprecated)]

/// End-to-end tests for the `accessgate` binary
///
/// Pages and config files are written to temp directories; the
/// authorization endpoints are served by `wiremock`.
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const EMBEDDED_PAGE: &str = r#"<html><head>
<meta name="i-amp-access-state" content="STATE1">
<script id="amp-access" type="application/json">
{"type": "server", "authorization": "https://acme.com/a?rid=READER_ID", "pingback": "https://acme.com/p?rid=READER_ID"}
</script>
</head><body>
<div i-amp-access-id="1/1">locked 1</div>
<div i-amp-access-id="1/2">locked 2</div>
</body></html>"#;

fn accessgate() -> Command {
    let mut cmd = Command::cargo_bin("accessgate").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Inspect reports config, state, origin, mode and sections for a page
/// with embedded configuration
#[test]
fn test_inspect_embedded_config() {
    let (temp_dir, page_path) = common::temp_file("doc.html", EMBEDDED_PAGE);

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(temp_dir.path().join("missing.yaml"))
        .arg("inspect")
        .arg("--page")
        .arg(&page_path)
        .arg("--url")
        .arg(common::PROXIED_URL);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""state": "STATE1""#))
        .stdout(predicate::str::contains(r#""origin": "proxied""#))
        .stdout(predicate::str::contains(r#""mode": "server_assisted""#))
        .stdout(predicate::str::contains("1/2"));
}

/// Without `--config` the default path is used, and a missing file falls
/// back to built-in defaults
#[test]
fn test_inspect_without_config_flag_uses_defaults() {
    let (temp_dir, page_path) = common::temp_file("doc.html", EMBEDDED_PAGE);

    let mut cmd = accessgate();
    cmd.current_dir(temp_dir.path())
        .arg("inspect")
        .arg("--page")
        .arg(&page_path)
        .arg("--url")
        .arg(common::PROXIED_URL);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""origin": "proxied""#));
}

/// A page without any access configuration is rejected
#[test]
fn test_inspect_without_config_fails() {
    let (temp_dir, page_path) = common::temp_file("doc.html", &common::live_page_html(None));

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(temp_dir.path().join("missing.yaml"))
        .arg("inspect")
        .arg("--page")
        .arg(&page_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("amp-access"));
}

/// Invalid config values are rejected before any command runs
#[test]
fn test_invalid_config_timeout_zero() {
    let (temp_dir, config_path) = common::temp_file("config.yaml", "service:\n  timeout_ms: 0\n");
    let page_path = temp_dir.path().join("doc.html");
    std::fs::write(&page_path, EMBEDDED_PAGE).unwrap();

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(config_path)
        .arg("inspect")
        .arg("--page")
        .arg(page_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 0"));
}

/// Invalid authorization URL in the config file names the field
#[test]
fn test_invalid_access_url_rejected() {
    let (temp_dir, config_path) = common::temp_file(
        "config.yaml",
        "access:\n  type: client\n  authorization: ftp://acme.com/a\n  pingback: https://acme.com/p\n",
    );
    let page_path = temp_dir.path().join("doc.html");
    std::fs::write(&page_path, common::live_page_html(None)).unwrap();

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(config_path)
        .arg("inspect")
        .arg("--page")
        .arg(page_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("\"authorization\" URL"));
}

/// Server-assisted authorize writes the reconciled page and prints the
/// result
#[tokio::test(flavor = "multi_thread")]
async fn test_authorize_server_assisted_writes_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/af"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            common::service_response_html(r#"{"access": "granted"}"#).into_bytes(),
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = format!(
        "access:\n  type: server\n  authorization: {uri}/a?rid=READER_ID\n  pingback: {uri}/p?rid=READER_ID\nservice:\n  url: {uri}/af\n",
        uri = server.uri()
    );
    let (temp_dir, config_path) = common::temp_file("config.yaml", &config);
    let page_path = temp_dir.path().join("doc.html");
    let output_path = temp_dir.path().join("out.html");
    std::fs::write(&page_path, common::live_page_html(Some("STATE1"))).unwrap();

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("authorize")
        .arg("--page")
        .arg(&page_path)
        .arg("--url")
        .arg(common::PROXIED_URL)
        .arg("--var")
        .arg("READER_ID=reader1")
        .arg("--output")
        .arg(&output_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("granted"));

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert!(written.contains(r#"<div i-amp-access-id="1/1">a1</div>"#));
    assert!(written.contains(r#"<div i-amp-access-id="1/2">a2</div>"#));
    assert!(!written.contains("a3"));
}

/// Client access type authorizes directly against the publisher
#[tokio::test(flavor = "multi_thread")]
async fn test_authorize_client_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "client"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = format!(
        "access:\n  type: client\n  authorization: {uri}/a\n  pingback: {uri}/p\n",
        uri = server.uri()
    );
    let (temp_dir, config_path) = common::temp_file("config.yaml", &config);
    let page_path = temp_dir.path().join("doc.html");
    std::fs::write(&page_path, common::live_page_html(Some("STATE1"))).unwrap();

    let mut cmd = accessgate();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("authorize")
        .arg("--page")
        .arg(&page_path)
        .arg("--url")
        .arg(common::PROXIED_URL);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""access": "client""#))
        .stdout(predicate::str::contains("locked 1"));
}
