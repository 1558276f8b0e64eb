//! `Set-Cookie` parsing.

/// Finds the value of cookie `name` among `Set-Cookie` header values.
///
/// Attributes after the first `;` are ignored. Empty values count as absent.
/// Some servers fold several cookies into one header separated by `,`; those
/// are split on `,` only where the next segment looks like `name=`.
pub fn find_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>, name: &str) -> Option<String> {
    headers
        .into_iter()
        .flat_map(split_folded)
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_owned())
        })
}

fn split_folded(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, _) in header.match_indices(',') {
        let rest = &header[index + 1..];
        let next = rest.split(';').next().unwrap_or_default();
        // `Expires=Wed, 21 Oct ...` contains a comma that is not a separator
        if next.contains('=') && !next.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
            parts.push(&header[start..index]);
            start = index + 1;
        }
    }
    parts.push(&header[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_cookie() {
        let headers = ["theme=dark; Path=/", "JSESSIONID=ABC123; Path=/; HttpOnly"];
        assert_eq!(find_set_cookie(headers, "JSESSIONID").as_deref(), Some("ABC123"));
        assert_eq!(find_set_cookie(headers, "missing"), None);
    }

    #[test]
    fn empty_values_are_absent() {
        assert_eq!(find_set_cookie(["JSESSIONID=; Max-Age=0"], "JSESSIONID"), None);
    }

    #[test]
    fn folded_headers_are_split() {
        let folded = "a=1; Expires=Wed, 21 Oct 2026 07:28:00 GMT, JSESSIONID=xyz; Path=/";
        assert_eq!(find_set_cookie([folded], "JSESSIONID").as_deref(), Some("xyz"));
        assert_eq!(find_set_cookie([folded], "a").as_deref(), Some("1"));
    }
}
