//! Socket and download URL derivation from the research page URL.

use url::Url;

use crate::error::{ClientError, Result};

/// Derive the research socket URI from the page URL.
///
/// `https` maps to `wss`, `http` to `ws`; `ws`/`wss` are taken as-is. `ws` is
/// appended to the page path verbatim, so `/` becomes `/ws` and `/app/`
/// becomes `/app/ws`. Query and fragment are dropped.
pub fn ws_uri(base: &Url) -> Result<Url> {
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(ClientError::Config(format!(
                "unsupported URL scheme `{other}` (expected http, https, ws or wss)"
            )))
        }
    };

    let mut uri = base.clone();
    uri.set_scheme(scheme)
        .map_err(|_| ClientError::Config(format!("cannot use scheme `{scheme}` for {base}")))?;
    let path = format!("{}ws", uri.path());
    uri.set_path(&path);
    uri.set_query(None);
    uri.set_fragment(None);
    Ok(uri)
}

/// Resolve a `path` message against the page URL, the way a link's `href` is.
pub fn resolve_download(base: &Url, path: &str) -> Result<Url> {
    let mut page = base.clone();
    let http_scheme = match page.scheme() {
        "wss" => Some("https"),
        "ws" => Some("http"),
        _ => None,
    };
    if let Some(scheme) = http_scheme {
        page.set_scheme(scheme)
            .map_err(|_| ClientError::Config(format!("cannot use scheme `{scheme}` for {base}")))?;
    }
    Ok(page.join(path)?)
}
