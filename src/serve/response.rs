//! Static file responses with live-reload injection.

use std::fs;
use std::path::Path;

use tiny_http::{Header, Request, Response};

use crate::debug;
use crate::utils::mime;

/// Client-side half of the reload protocol. `EventSource` handles
/// reconnection after the server closes the stream post-reload.
const RELOAD_JS: &str = r#"<script>
(() => {
  const connect = () => {
    const source = new EventSource("/__reload");
    source.onmessage = (event) => {
      if (event.data === "reload") {
        source.close();
        location.reload();
      }
    };
    source.onerror = () => {
      source.close();
      setTimeout(connect, 1000);
    };
  };
  connect();
})();
</script>"#;

/// Serve a file from the output directory.
///
/// HTML gets the reload snippet injected; everything else is sent
/// verbatim with its detected content type.
pub fn respond_file(request: Request, path: &Path) {
    let content_type = mime::from_path(path);

    let result = if content_type == mime::types::HTML {
        match fs::read_to_string(path) {
            Ok(html) => {
                let body = inject_reload_script(&html);
                // from_data, not from_string: the latter pins its own
                // text/plain content type
                request.respond(
                    Response::from_data(body.into_bytes())
                        .with_header(header("Content-Type", content_type)),
                )
            }
            Err(e) => {
                debug!("serve"; "failed to read {}: {e}", path.display());
                return respond_not_found(request, path.parent());
            }
        }
    } else {
        match fs::File::open(path) {
            Ok(file) => request.respond(
                Response::from_file(file).with_header(header("Content-Type", content_type)),
            ),
            Err(e) => {
                debug!("serve"; "failed to open {}: {e}", path.display());
                return respond_not_found(request, path.parent());
            }
        }
    };

    if let Err(e) = result {
        debug!("serve"; "response aborted: {e}");
    }
}

/// Insert the reload snippet just before `</body>`, or append it when the
/// document has no closing body tag.
pub fn inject_reload_script(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + RELOAD_JS.len());
            out.push_str(&html[..at]);
            out.push_str(RELOAD_JS);
            out.push_str(&html[at..]);
            out
        }
        None => {
            let mut out = String::with_capacity(html.len() + RELOAD_JS.len());
            out.push_str(html);
            out.push_str(RELOAD_JS);
            out
        }
    }
}

/// 404, preferring the site's own `404.html` when it exists.
pub fn respond_not_found(request: Request, output_root: Option<&Path>) {
    let custom = output_root
        .map(|root| root.join("404.html"))
        .filter(|p| p.is_file())
        .and_then(|p| fs::read_to_string(p).ok());

    let (body, content_type) = match custom {
        Some(html) => (inject_reload_script(&html), mime::types::HTML),
        None => ("404 Not Found".to_string(), mime::types::PLAIN),
    };

    let response = Response::from_data(body.into_bytes())
        .with_status_code(404)
        .with_header(header("Content-Type", content_type));
    let _ = request.respond(response);
}

/// 503 for requests that arrive while the server is draining.
pub fn respond_unavailable(request: Request) {
    let response = Response::from_string("shutting down").with_status_code(503);
    let _ = request.respond(response);
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes())
        .unwrap_or_else(|()| unreachable!("static header"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_closing_body() {
        let html = "<html><body><p>hi</p></body></html>";
        let out = inject_reload_script(html);
        assert!(out.contains("EventSource"));
        let script_at = out.find("<script>").unwrap();
        let body_close = out.find("</body>").unwrap();
        assert!(script_at < body_close);
    }

    #[test]
    fn test_inject_case_insensitive() {
        let out = inject_reload_script("<HTML><BODY>x</BODY></HTML>");
        let script_at = out.find("<script>").unwrap();
        let body_close = out.find("</BODY>").unwrap();
        assert!(script_at < body_close);
    }

    #[test]
    fn test_inject_appends_without_body_tag() {
        let out = inject_reload_script("<p>fragment</p>");
        assert!(out.starts_with("<p>fragment</p>"));
        assert!(out.ends_with("</script>"));
    }

    #[test]
    fn test_inject_uses_last_body_close() {
        let html = "</body> literal <body>real</body>";
        let out = inject_reload_script(html);
        let script_at = out.find("<script>").unwrap();
        assert!(script_at > out.find("real").unwrap());
    }
}
