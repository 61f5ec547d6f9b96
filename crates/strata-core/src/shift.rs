//! Path segmentation for manual routing
//!
//! ```rust
//! use strata_core::shift_path;
//!
//! assert_eq!(shift_path("/api/v1/hello"), ("api".to_string(), "/v1/hello".to_string()));
//! assert_eq!(shift_path("/"), ("".to_string(), "/".to_string()));
//! ```

/// Split `path` into its first segment and the rest of the path.
///
/// The path is rooted and cleaned first (`//`, `.` and `..` are resolved
/// lexically), so the returned head never contains a slash and is empty when
/// there is nothing left to route. The tail always starts with a slash and
/// never has a trailing one, unless it is exactly `/`.
pub fn shift_path(path: &str) -> (String, String) {
    let cleaned = clean("/".to_owned() + path);
    let rest = &cleaned[1..];

    match rest.find('/') {
        None => (rest.to_owned(), "/".to_owned()),
        Some(pos) => (rest[..pos].to_owned(), rest[pos..].to_owned()),
    }
}

/// Lexically clean a rooted path
fn clean(path: String) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(path.len());
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_shift_path() {
        let cases = [
            ("/copy", "copy", "/"),
            ("/", "", "/"),
            ("/api/v1/hello", "api", "/v1/hello"),
            (".", "", "/"),
            ("", "", "/"),
            ("api/v1/", "api", "/v1"),
            ("//api//v1", "api", "/v1"),
            ("/api/../admin/users", "admin", "/users"),
            ("/../../etc", "etc", "/"),
            ("/a/./b/.", "a", "/b"),
        ];

        for (input, head, tail) in cases {
            assert_eq!(
                shift_path(input),
                (head.to_string(), tail.to_string()),
                "shift_path({input:?})"
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_shift_path_shape(path in "[a-z./]{0,32}") {
            let (head, tail) = shift_path(&path);

            prop_assert!(!head.contains('/'), "head {:?} contains a slash", head);
            prop_assert!(tail.starts_with('/'), "tail {:?} is not rooted", tail);
            prop_assert!(tail == "/" || !tail.ends_with('/'), "tail {:?} has a trailing slash", tail);
            if head.is_empty() {
                prop_assert_eq!(tail.as_str(), "/");
            }
        }

        #[test]
        fn prop_shift_path_reassembles(segments in proptest::collection::vec("[a-z0-9]{1,8}", 1..6)) {
            let path = format!("/{}", segments.join("/"));
            let (head, tail) = shift_path(&path);

            prop_assert_eq!(&head, &segments[0]);
            if segments.len() == 1 {
                prop_assert_eq!(tail.as_str(), "/");
            } else {
                prop_assert_eq!(format!("/{}{}", head, tail), path);
            }
        }
    }
}
