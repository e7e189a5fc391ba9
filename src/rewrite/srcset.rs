//! `srcset` attribute parsing
//!
//! Follows the candidate grammar of the HTML standard closely enough for
//! archiving: a URL, an optional descriptor, and a comma between candidates.

use super::RewriteMap;

/// One image candidate of a `srcset` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcsetCandidate<'a> {
    pub url: &'a str,
    /// Width or density descriptor, empty when absent
    pub descriptor: &'a str,
}

#[must_use]
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate<'_>> {
    let mut candidates = Vec::new();
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let (raw_url, after) = rest.split_at(url_end);
        let url = raw_url.trim_end_matches(',');
        if url.len() != raw_url.len() {
            // A trailing comma ends the candidate without a descriptor.
            candidates.push(SrcsetCandidate { url, descriptor: "" });
            rest = after;
            continue;
        }

        let after = after.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let descriptor_end = descriptor_end(after);
        candidates.push(SrcsetCandidate {
            url,
            descriptor: after[..descriptor_end].trim_end(),
        });
        rest = &after[descriptor_end..];
    }

    candidates
}

/// End of a descriptor: the next comma outside parentheses
fn descriptor_end(s: &str) -> usize {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return i,
            _ => {}
        }
    }
    s.len()
}

#[must_use]
pub fn urls_in_srcset(srcset: &str) -> Vec<String> {
    parse_srcset(srcset)
        .into_iter()
        .map(|candidate| candidate.url.to_string())
        .filter(|url| !url.is_empty() && !url.starts_with("data:"))
        .collect()
}

/// Replace candidate URLs found in `replacements`, keeping descriptors.
///
/// Returns `None` when no candidate changed, so the attribute can be left
/// exactly as it was.
#[must_use]
pub fn rewrite_srcset(srcset: &str, replacements: &RewriteMap) -> Option<String> {
    let candidates = parse_srcset(srcset);
    if !candidates.iter().any(|c| replacements.contains_key(c.url)) {
        return None;
    }

    let rewritten = candidates
        .iter()
        .map(|candidate| {
            let url = replacements
                .get(candidate.url)
                .map_or(candidate.url, String::as_str);
            if candidate.descriptor.is_empty() {
                url.to_string()
            } else {
                format!("{url} {}", candidate.descriptor)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    Some(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidates_and_descriptors() {
        assert_eq!(urls_in_srcset(" https://example.com 3x, "), vec!["https://example.com"]);
        assert_eq!(
            urls_in_srcset(" https://example.com 3x, https://a.com/?a=1 , https://b.com"),
            vec!["https://example.com", "https://a.com/?a=1", "https://b.com"]
        );

        let candidates = parse_srcset("a.png 1x,b.png, c.png 200w");
        assert_eq!(
            candidates,
            vec![
                SrcsetCandidate { url: "a.png", descriptor: "1x" },
                SrcsetCandidate { url: "b.png", descriptor: "" },
                SrcsetCandidate { url: "c.png", descriptor: "200w" },
            ]
        );
    }

    #[test]
    fn leading_commas_and_data_urls_are_skipped() {
        assert_eq!(urls_in_srcset(",, a.png 2x"), vec!["a.png"]);
        assert!(urls_in_srcset("data:image/png;base64,AAAA 1x").is_empty());
        assert!(urls_in_srcset("   ").is_empty());
    }

    #[test]
    fn rewrite_keeps_descriptors_and_unmapped_candidates() {
        let mut map = RewriteMap::new();
        map.insert("https://a.com/1.png".to_string(), "../rc/1.png".to_string());

        assert_eq!(
            rewrite_srcset("https://a.com/1.png 1x, https://a.com/2.png 2x", &map).as_deref(),
            Some("../rc/1.png 1x, https://a.com/2.png 2x")
        );
        assert_eq!(rewrite_srcset("https://b.com/1.png 1x", &map), None);
    }
}
