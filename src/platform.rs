//! Checks on URLs handed over by the browser host (active tab, clipboard)
//! before they are inspected.

use tracing::warn;

use crate::error::{Error, Result};
use crate::params::is_valid_url;

const RESTRICTED_SCHEMES: [&str; 4] = ["chrome://", "chrome-extension://", "edge://", "about:"];

pub fn check_tab_url(url: Option<&str>) -> Result<String> {
    let url = match url.map(str::trim) {
        Some(u) if !u.is_empty() => u,
        _ => {
            warn!("No active tab URL found");
            return Err(Error::NoActiveTab);
        }
    };

    if RESTRICTED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        warn!(url, "Refusing to inspect internal page");
        return Err(Error::RestrictedPage(url.to_string()));
    }

    Ok(url.to_string())
}

pub fn check_clipboard_text(text: &str) -> Result<String> {
    let text = text.trim();
    if !text.is_empty() && is_valid_url(text) {
        Ok(text.to_string())
    } else {
        warn!("Clipboard does not hold a valid URL");
        Err(Error::InvalidClipboardUrl)
    }
}
