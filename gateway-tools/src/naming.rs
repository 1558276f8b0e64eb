//! Qualified tool names.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Longest name a planner accepts for a function.
pub const MAX_TOOL_NAME_LEN: usize = 64;

const DIGEST_HEX_LEN: usize = 8;

static PATH_PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^}]+)\}").unwrap_or_else(|_| unreachable!("static pattern compiles"))
});

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Returns the `{placeholder}` names of a path template in order.
#[must_use]
pub fn path_placeholders(template: &str) -> Vec<String> {
    PATH_PARAM_REGEX
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_owned()))
        .collect()
}

/// Derives the qualified name of an operation.
///
/// Uses `operationId` when present, otherwise the lower-case method followed
/// by the path with braces removed.
#[must_use]
pub fn qualified_name(spec: &str, operation_id: Option<&str>, method: &str, path: &str) -> String {
    let local = match operation_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_owned(),
        None => {
            let path = path.replace(['{', '}'], "");
            let path = path.trim_matches('/');
            if path.is_empty() {
                method.to_ascii_lowercase()
            } else {
                format!("{}_{path}", method.to_ascii_lowercase())
            }
        }
    };
    cap_length(&sanitize(&format!("{spec}_{local}")))
}

/// Shortens names above [`MAX_TOOL_NAME_LEN`] to a prefix and a digest of
/// the full name. Shorter names are returned unchanged.
#[must_use]
pub fn cap_length(name: &str) -> String {
    if name.len() <= MAX_TOOL_NAME_LEN {
        return name.to_owned();
    }
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let prefix_len = MAX_TOOL_NAME_LEN - DIGEST_HEX_LEN - 1;
    // sanitized names are ASCII, so byte slicing is safe
    format!("{}_{}", &name[..prefix_len], &digest[..DIGEST_HEX_LEN])
}

/// Returns `candidate` if unused, otherwise the first `candidate_N` (N >= 2)
/// not in `taken`, capped to [`MAX_TOOL_NAME_LEN`].
#[must_use]
pub fn disambiguate(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_owned();
    }
    (2_usize..)
        .map(|n| {
            let suffix = format!("_{n}");
            let keep = candidate.len().min(MAX_TOOL_NAME_LEN - suffix.len());
            format!("{}{suffix}", &candidate[..keep])
        })
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| unreachable!("suffix space is unbounded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_is_preferred() {
        assert_eq!(
            qualified_name("payments", Some("getPayment"), "get", "/payments/{id}"),
            "payments_getPayment"
        );
    }

    #[test]
    fn method_and_path_are_used_without_operation_id() {
        assert_eq!(
            qualified_name("pay-api", None, "GET", "/payments/{payment_id}/refunds"),
            "pay_api_get_payments_payment_id_refunds"
        );
        assert_eq!(qualified_name("svc", Some("  "), "post", "/"), "svc_post");
    }

    #[test]
    fn long_names_are_capped_with_stable_digest() {
        let long = "a".repeat(100);
        let first = cap_length(&long);
        assert_eq!(first.len(), MAX_TOOL_NAME_LEN);
        assert_eq!(first, cap_length(&long));
        assert_ne!(first, cap_length(&format!("{long}b")));
    }

    #[test]
    fn collisions_receive_numeric_suffixes() {
        let mut taken = HashSet::new();
        taken.insert("svc_list".to_owned());
        assert_eq!(disambiguate("svc_list", &taken), "svc_list_2");
        taken.insert("svc_list_2".to_owned());
        assert_eq!(disambiguate("svc_list", &taken), "svc_list_3");
        assert_eq!(disambiguate("svc_other", &taken), "svc_other");
    }

    #[test]
    fn placeholders_are_extracted_in_order() {
        assert_eq!(
            path_placeholders("/a/{first}/b/{second}"),
            vec!["first".to_owned(), "second".to_owned()]
        );
    }
}
