use crate::models::Act;
use url::form_urlencoded::byte_serialize;

pub const SHARE_INTENT_URL: &str = "https://twitter.com/intent/tweet";
const SHARE_HASHTAG: &str = "#RandomActsOfKindness";

/// Text that goes into the share intent and onto the clipboard.
pub fn share_text(act: &Act) -> String {
    format!("Today's act of kindness: {} {SHARE_HASHTAG}", act.act)
}

pub fn share_intent_url(act: &Act) -> String {
    let encoded: String = byte_serialize(share_text(act).as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{SHARE_INTENT_URL}?text={encoded}")
}

pub fn clipboard_text(act: &Act) -> String {
    act.act.clone()
}
