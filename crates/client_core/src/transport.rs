//! Websocket endpoint derivation from the page the editor was loaded from.

use url::Url;

use crate::error::ChannelError;

pub const SYNC_PATH: &str = "/ws";

/// Same host and port as `page_url`, path `/ws`, `wss` whenever the page itself
/// was served over TLS.
pub fn sync_url(page_url: &Url) -> Result<Url, ChannelError> {
    let scheme = match page_url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    };

    let mut ws_url = page_url.clone();
    ws_url
        .set_scheme(scheme)
        .map_err(|()| ChannelError::UnsupportedScheme(page_url.scheme().to_string()))?;
    ws_url.set_path(SYNC_PATH);
    ws_url.set_query(None);
    ws_url.set_fragment(None);
    Ok(ws_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(raw: &str) -> Result<String, ChannelError> {
        let page = Url::parse(raw).expect("url");
        sync_url(&page).map(|url| url.to_string())
    }

    #[test]
    fn plain_http_page_uses_ws() {
        assert_eq!(
            derive("http://controller.local:8080/index.html?x=1#top"),
            Ok("ws://controller.local:8080/ws".to_string())
        );
    }

    #[test]
    fn tls_page_uses_wss() {
        assert_eq!(
            derive("https://controller.local/"),
            Ok("wss://controller.local/ws".to_string())
        );
    }

    #[test]
    fn websocket_urls_keep_their_scheme() {
        assert_eq!(
            derive("ws://127.0.0.1:9000"),
            Ok("ws://127.0.0.1:9000/ws".to_string())
        );
        assert_eq!(
            derive("wss://controller.local/other"),
            Ok("wss://controller.local/ws".to_string())
        );
    }

    #[test]
    fn rejects_unknown_schemes() {
        assert_eq!(
            derive("ftp://controller.local/"),
            Err(ChannelError::UnsupportedScheme("ftp".to_string()))
        );
    }
}
