//! Embed script for third-party career pages
//!
//! Elements carrying `data-iview-token` get an iframe pointing at the
//! candidate interview page. `data-iview-height` overrides the default height.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::AppState;

const EMBED_TEMPLATE: &str = r#"(function () {
  var base = __IVIEW_BASE__;
  function mount(el) {
    if (el.getAttribute("data-iview-mounted")) return;
    var token = el.getAttribute("data-iview-token");
    if (!token) return;
    var frame = document.createElement("iframe");
    frame.src = base + "/interview/" + encodeURIComponent(token);
    frame.style.width = "100%";
    frame.style.height = el.getAttribute("data-iview-height") || "640px";
    frame.style.border = "0";
    frame.setAttribute("allow", "camera; microphone");
    frame.setAttribute("title", "Interview");
    el.setAttribute("data-iview-mounted", "true");
    el.appendChild(frame);
  }
  function mountAll() {
    var nodes = document.querySelectorAll("[data-iview-token]");
    for (var i = 0; i < nodes.length; i++) mount(nodes[i]);
  }
  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", mountAll);
  } else {
    mountAll();
  }
})();
"#;

/// Script text with `base_url` inlined as a JS string literal
pub fn render_embed_script(base_url: &str) -> String {
    let literal = serde_json::Value::String(base_url.to_string()).to_string();
    EMBED_TEMPLATE.replace("__IVIEW_BASE__", &literal)
}

/// GET /embed.js
pub async fn embed_script(State(state): State<AppState>) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/javascript; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=300")),
        ],
        render_embed_script(&state.config.public_base_url),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_inlined_as_string_literal() {
        let script = render_embed_script("https://jobs.example.com");
        assert!(script.contains(r#"var base = "https://jobs.example.com";"#));
        assert!(script.contains("[data-iview-token]"));
        assert!(!script.contains("__IVIEW_BASE__"));
    }

    #[test]
    fn test_quotes_in_base_url_escaped() {
        let script = render_embed_script("https://x\"y");
        assert!(script.contains(r#""https://x\"y""#));
    }
}
