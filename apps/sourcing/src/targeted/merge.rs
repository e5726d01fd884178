//! Cross-source URL merge with first-seen provenance.

use std::collections::HashSet;

use serde::Serialize;

use crate::collector::normalize_profile_url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedUrl {
    pub url: String,
    /// Name of the first source that produced this URL.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceContribution {
    pub source: String,
    pub submitted: usize,
    pub unique_added: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedUrls {
    pub urls: Vec<MergedUrl>,
    pub per_source: Vec<SourceContribution>,
}

impl MergedUrls {
    pub fn source_of(&self, url: &str) -> Option<&str> {
        let key = merge_key(url);
        self.urls
            .iter()
            .find(|m| m.url == key)
            .map(|m| m.source.as_str())
    }

    pub fn url_list(&self) -> Vec<String> {
        self.urls.iter().map(|m| m.url.clone()).collect()
    }
}

/// Dedupes named URL lists in the order given. Profile URLs are compared in canonical
/// form; anything else is compared with surrounding whitespace and trailing slashes
/// removed.
pub fn merge_url_sources<'a, I>(sources: I) -> MergedUrls
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = MergedUrls::default();

    for (source, urls) in sources {
        let mut contribution = SourceContribution {
            source: source.to_string(),
            submitted: 0,
            unique_added: 0,
            duplicates: 0,
        };
        for raw in urls {
            let key = merge_key(raw);
            if key.is_empty() {
                continue;
            }
            contribution.submitted += 1;
            if !seen.insert(key.clone()) {
                contribution.duplicates += 1;
                continue;
            }
            merged.urls.push(MergedUrl {
                url: key,
                source: source.to_string(),
            });
            contribution.unique_added += 1;
        }
        merged.per_source.push(contribution);
    }

    merged
}

fn merge_key(url: &str) -> String {
    normalize_profile_url(url).unwrap_or_else(|| url.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_first_source_keeps_attribution() {
        let a = list(&[
            "https://www.linkedin.com/in/u1",
            "https://www.linkedin.com/in/u2",
        ]);
        let b = list(&[
            "https://www.linkedin.com/in/u2/",
            "https://www.linkedin.com/in/u3",
        ]);

        let merged = merge_url_sources([("A", a.as_slice()), ("B", b.as_slice())]);

        assert_eq!(
            merged.url_list(),
            vec![
                "https://www.linkedin.com/in/u1",
                "https://www.linkedin.com/in/u2",
                "https://www.linkedin.com/in/u3",
            ]
        );
        assert_eq!(merged.source_of("https://www.linkedin.com/in/u2?x=1"), Some("A"));
        assert_eq!(merged.source_of("https://www.linkedin.com/in/u3"), Some("B"));
        assert_eq!(merged.per_source[1].duplicates, 1);
        assert_eq!(merged.per_source[1].unique_added, 1);
    }

    #[test]
    fn test_non_profile_urls_merge_on_trimmed_form() {
        let manual = list(&["https://example.com/team/jane/", "  "]);
        let adhoc = list(&["https://example.com/team/jane"]);

        let merged = merge_url_sources([("manual", manual.as_slice()), ("adhoc", adhoc.as_slice())]);

        assert_eq!(merged.urls.len(), 1);
        assert_eq!(merged.urls[0].url, "https://example.com/team/jane");
        assert_eq!(merged.per_source[0].submitted, 1);
        assert_eq!(merged.per_source[1].duplicates, 1);
    }

    #[test]
    fn test_duplicates_within_one_source() {
        let only = list(&["https://www.linkedin.com/in/a", "https://www.linkedin.com/in/a/"]);
        let merged = merge_url_sources([("targeted", only.as_slice())]);
        assert_eq!(merged.urls.len(), 1);
        assert_eq!(merged.per_source[0].duplicates, 1);
    }
}
