//! Error pages sent to the client when a request is refused
use hyper::StatusCode;

/// An HTTP error reported on a connection, rendered in the response phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: StatusCode,
    pub reason: String,
    /// Key/value pairs shown on the error page, e.g. `("url", "/x")`
    pub details: Vec<(String, String)>,
}

impl HttpError {
    pub fn new(status: StatusCode, reason: &str, details: &[(&str, &str)]) -> Self {
        Self {
            status,
            reason: reason.to_string(),
            details: details
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the error as a small HTML document
    pub fn render(&self) -> String {
        let reason = escape_html(&self.reason);
        let mut body = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>{} {}</title>\n</head>\n<body>\n<h1>{}</h1>\n",
            self.status.as_u16(),
            reason,
            reason
        );

        if let Some(detail) = self.detail("detail") {
            body.push_str(&format!("<p>{}</p>\n", escape_html(detail)));
        }

        let extra: Vec<_> = self.details.iter().filter(|(k, _)| k != "detail").collect();
        if !extra.is_empty() {
            body.push_str("<dl>\n");
            for (key, value) in extra {
                body.push_str(&format!(
                    "<dt>{}</dt><dd>{}</dd>\n",
                    escape_html(key),
                    escape_html(value)
                ));
            }
            body.push_str("</dl>\n");
        }

        body.push_str("<hr />\n<p><em>Generated by reverse-rewrite</em></p>\n</body>\n</html>\n");
        body
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
