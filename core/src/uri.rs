//! Path templates for the Todoable API and their resolution to absolute URIs.
//!
//! Templates carry `:name` placeholders. Expansion replaces whole tokens only,
//! so `:list` and `:list_id` are distinct names. Values are inserted verbatim;
//! callers pass identifiers that are already safe in a path.

use url::Url;

use crate::error::ApiError;

pub const AUTH_PATH: &str = "/api/authenticate";
pub const LISTS_PATH: &str = "/api/lists";
pub const LIST_PATH: &str = "/api/lists/:list_id";
pub const ITEMS_PATH: &str = "/api/lists/:list_id/items";
pub const ITEM_PATH: &str = "/api/lists/:list_id/items/:item_id";
pub const ITEM_FINISHED_PATH: &str = "/api/lists/:list_id/items/:item_id/finish";

/// Substitute every `:name` token found in `params`. Unknown tokens stay put,
/// which lets layered callers fill a template in several passes.
pub fn expand(template: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];

        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

/// Join an expanded path onto the base URI. An absolute path replaces the
/// base's own path, as in RFC 3986 reference resolution.
pub fn resolve(base: &Url, path: &str) -> Result<Url, ApiError> {
    Ok(base.join(path)?)
}
