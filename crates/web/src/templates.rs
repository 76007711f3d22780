//! The form page and its response headers.

use {
    askama::Template,
    axum::response::{Html, IntoResponse, Response},
    tracing::warn,
    whatsend_config::UiConfig,
};

#[derive(Template)]
#[template(path = "index.html", escape = "html")]
struct IndexHtmlTemplate<'a> {
    title: &'a str,
    default_contact: &'a str,
    default_message: &'a str,
    version: &'a str,
    nonce: &'a str,
}

pub(crate) fn content_security_policy(nonce: &str) -> String {
    format!(
        "default-src 'self'; \
         script-src 'self' 'nonce-{nonce}'; \
         style-src 'self' 'unsafe-inline'; \
         img-src 'self' data:; \
         connect-src 'self'; \
         frame-ancestors 'none'; \
         form-action 'self'; \
         base-uri 'self'; \
         object-src 'none'"
    )
}

pub(crate) fn render_index(ui: &UiConfig, version: &str) -> Response {
    let nonce = uuid::Uuid::new_v4().to_string();
    let template = IndexHtmlTemplate {
        title: &ui.title,
        default_contact: &ui.default_contact,
        default_message: &ui.default_message,
        version,
        nonce: &nonce,
    };
    let body = match template.render() {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "failed to render index template");
            String::new()
        },
    };

    let mut response = Html(body).into_response();
    let headers = response.headers_mut();
    if let Ok(val) = "no-cache, no-store".parse() {
        headers.insert(axum::http::header::CACHE_CONTROL, val);
    }
    if let Ok(val) = content_security_policy(&nonce).parse() {
        headers.insert(axum::http::header::CONTENT_SECURITY_POLICY, val);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn form_escapes_configured_defaults() {
        let html = IndexHtmlTemplate {
            title: "Sender",
            default_contact: "<Team & Co>",
            default_message: "hi \"there\"",
            version: "0.0.0",
            nonce: "abc",
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;Team &amp; Co&gt;"));
        assert!(!html.contains("<Team & Co>"));
        assert!(html.contains(r#"<script nonce="abc">"#));
    }

    #[test]
    fn csp_carries_nonce_and_allows_data_images() {
        let csp = content_security_policy("n0nce");
        assert!(csp.contains("'nonce-n0nce'"));
        assert!(csp.contains("img-src 'self' data:"));
    }
}
