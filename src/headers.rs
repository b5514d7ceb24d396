use http_client::Request;

/// User agent sent when the configuration does not name one.
pub const DEFAULT_USER_AGENT: &str = concat!("chart-export/", env!("CARGO_PKG_VERSION"));

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Add the headers every page request carries.
pub fn add_page_headers(request: &mut Request, user_agent: &str) {
    let _ = request.insert_header("User-Agent", user_agent);
    let _ = request.insert_header("Accept", ACCEPT_HTML);
    let _ = request.insert_header("Accept-Language", "en-US,en;q=0.9");
}

/// Add a referer, used when following redirects.
pub fn add_referer(request: &mut Request, referer_url: &str) {
    let _ = request.insert_header("Referer", referer_url);
}
