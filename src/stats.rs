/// Maps request endpoints to coarse labels for statistics aggregation.
///
/// Per-id paths like `/rest/house/Elm Street/rental` would otherwise each
/// get their own statistics bucket; configured prefixes collapse them. The
/// longest matching prefix with the same method wins; unmatched requests
/// keep their literal `METHOD:path` label.
pub struct EndpointClassifier {
    rules: Vec<(String, String)>,
}

impl EndpointClassifier {
    pub fn new<P, M>(rules: impl IntoIterator<Item = (P, M)>) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(prefix, method)| (prefix.into(), method.into()))
                .collect(),
        }
    }

    pub fn classify(&self, path: &str, method: &str) -> String {
        let best = self
            .rules
            .iter()
            .filter(|(prefix, m)| path.starts_with(prefix) && m.eq_ignore_ascii_case(method))
            .max_by_key(|(prefix, _)| prefix.len());
        match best {
            Some((prefix, m)) => format!("{m}:{prefix}"),
            None => format!("{method}:{path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> EndpointClassifier {
        EndpointClassifier::new([
            ("/rest/media", "POST"),
            ("/rest/house/", "POST"),
            ("/rest/house/", "GET"),
        ])
    }

    #[test]
    fn matches_prefix_and_method() {
        let c = classifier();
        assert_eq!(c.classify("/rest/house/Elm Street", "POST"), "POST:/rest/house/");
        assert_eq!(c.classify("/rest/media", "POST"), "POST:/rest/media");
    }

    #[test]
    fn longest_prefix_wins() {
        let c = EndpointClassifier::new([
            ("/rest/house/", "POST"),
            ("/rest/house/popular/", "POST"),
        ]);
        assert_eq!(
            c.classify("/rest/house/popular/1", "POST"),
            "POST:/rest/house/popular/"
        );
    }

    #[test]
    fn unmatched_method_falls_back_to_literal() {
        let c = classifier();
        assert_eq!(c.classify("/rest/media", "DELETE"), "DELETE:/rest/media");
        assert_eq!(c.classify("/rest/user/Ana.Silva", "GET"), "GET:/rest/user/Ana.Silva");
    }
}
