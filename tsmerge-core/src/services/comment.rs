use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<extracomment>(.+)</extracomment>|<comment>(.+)</comment>").unwrap());

/// Finds the comment to attach to a unit in its raw skeleton.
///
/// An `<extracomment>` wins over a `<comment>` wherever they appear.
pub fn extract_comment(skeleton: &str) -> Option<String> {
    let mut plain: Option<&str> = None;

    for caps in COMMENT.captures_iter(skeleton) {
        if let Some(extra) = caps.get(1).filter(|m| !m.as_str().trim().is_empty()) {
            return Some(unescape(extra.as_str()));
        }
        if plain.is_none() {
            plain = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|s| !s.trim().is_empty());
        }
    }

    plain.map(unescape)
}

fn unescape(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_comment_wins() {
        let skel = "<extracomment>A</extracomment><comment>B</comment>";
        assert_eq!(extract_comment(skel).as_deref(), Some("A"));
    }

    #[test]
    fn extra_comment_wins_even_when_it_comes_second() {
        let skel = "<message>\n  <comment>B</comment>\n  <extracomment>A</extracomment>\n</message>";
        assert_eq!(extract_comment(skel).as_deref(), Some("A"));
    }

    #[test]
    fn plain_comment() {
        assert_eq!(extract_comment("<comment>B</comment>").as_deref(), Some("B"));
    }

    #[test]
    fn blank_or_missing() {
        assert_eq!(extract_comment("<comment> </comment>"), None);
        assert_eq!(extract_comment("<translatorcomment>T</translatorcomment>"), None);
        assert_eq!(extract_comment("<source>x</source>"), None);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(
            extract_comment("<comment>a &amp; b</comment>").as_deref(),
            Some("a & b")
        );
    }
}
