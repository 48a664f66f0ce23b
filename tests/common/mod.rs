use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A proxied page URL with a fragment, as a reader would load it.
#[allow(dead_code)]
pub const PROXIED_URL: &str = "https://cdn.ampproject.org/c/acme.com/doc1#ref=home";

/// A page served directly by the publisher.
#[allow(dead_code)]
pub const DIRECT_URL: &str = "https://acme.com/doc1";

/// Live page markup with sections `1/1` and `1/2` and an optional state
/// marker.
#[allow(dead_code)]
pub fn live_page_html(state: Option<&str>) -> String {
    let meta = state
        .map(|s| format!(r#"<meta name="i-amp-access-state" content="{}">"#, s))
        .unwrap_or_default();
    format!(
        r#"<html><head>{}</head><body>
<div i-amp-access-id="1/1">locked 1</div>
<div i-amp-access-id="1/2">locked 2</div>
</body></html>"#,
        meta
    )
}

/// Service response markup carrying `result_json` and sections `1/1`,
/// `1/2` and the extra `a3`.
#[allow(dead_code)]
pub fn service_response_html(result_json: &str) -> String {
    format!(
        r#"<html><head>
<script id="amp-access-data" type="application/json">{}</script>
</head><body>
<div i-amp-access-id="1/1">a1</div>
<div i-amp-access-id="1/2">a2</div>
<div i-amp-access-id="a3">a3</div>
</body></html>"#,
        result_json
    )
}

#[allow(dead_code)]
pub fn temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).expect("failed to write file");
    (temp_dir, path)
}

/// Decode the `request` form field of a service call body.
#[allow(dead_code)]
pub fn decode_request_field(body: &[u8]) -> serde_json::Value {
    let (_, json) = url::form_urlencoded::parse(body)
        .find(|(name, _)| name == "request")
        .expect("request field present");
    serde_json::from_str(&json).expect("request field is JSON")
}
