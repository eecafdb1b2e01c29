use hyper::StatusCode;
use reverse_rewrite::html_error::HttpError;

#[test]
fn test_render_error_page() {
    let err = HttpError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        &[("detail", "Request has an invalid URL"), ("url", "/nothing")],
    );
    let page = err.render();

    assert!(page.contains("<title>400 Bad Request</title>"));
    assert!(page.contains("<h1>Bad Request</h1>"));
    assert!(page.contains("<p>Request has an invalid URL</p>"));
    assert!(page.contains("<dt>url</dt><dd>/nothing</dd>"));
}

#[test]
fn test_render_escapes_details() {
    let err = HttpError::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        &[("url", "/<script>alert(\"x\")</script>&")],
    );
    let page = err.render();

    assert!(!page.contains("<script>"));
    assert!(page.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;"));
}

#[test]
fn test_detail_lookup() {
    let err = HttpError::new(StatusCode::BAD_GATEWAY, "Bad Gateway", &[("url", "/a")]);
    assert_eq!(err.detail("url"), Some("/a"));
    assert_eq!(err.detail("detail"), None);
    assert!(!err.render().contains("<dl>\n<dt>detail"));
}
