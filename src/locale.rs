//! Locale negotiation inputs.
//!
//! Turns request-side preference values (an override value, an
//! `Accept-Language` header) into ordered candidates and matches them
//! against the configured supported tags. The matching itself is the
//! standard BCP-47 lookup provided by `fluent-langneg`.

use fluent_langneg::{
    NegotiationStrategy,
    negotiate_languages,
};
use unic_langid::LanguageIdentifier;

/// One `Accept-Language` entry with its quality weight in thousandths.
///
/// Weights are kept as integers (`q=0.9` → 900) so ordering stays exact.
struct AcceptLanguageEntry {
    /// The language tag as sent by the client.
    tag: String,
    /// Quality weight, 0..=1000.
    weight: u16,
}

/// Parses an `Accept-Language` header into tags ordered by preference.
///
/// Wildcard and malformed entries are dropped. Entries without an
/// explicit `q` parameter default to weight 1. The sort is stable, so
/// entries of equal weight keep their header order.
///
/// # Examples
/// ```
/// use request_i18n::locale::parse_accept_language;
///
/// let tags = parse_accept_language("fr-CH, fr;q=0.9, en;q=0.8, *;q=0.5");
/// assert_eq!(tags, vec!["fr-CH", "fr", "en"]);
/// ```
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<AcceptLanguageEntry> = header
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let mut split = part.splitn(2, ';');
            let tag = split.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let weight = match split.next() {
                Some(param) => parse_quality(param)?,
                None => 1000,
            };
            Some(AcceptLanguageEntry { tag: tag.to_string(), weight })
        })
        .collect();

    entries.sort_by(|a, b| b.weight.cmp(&a.weight));
    entries.into_iter().map(|entry| entry.tag).collect()
}

/// Parses a `q=0.9`-style parameter into thousandths.
///
/// Only the first three fractional digits are significant per RFC 7231.
/// Returns `None` for malformed parameters so the entry gets dropped.
fn parse_quality(param: &str) -> Option<u16> {
    let value = param.trim().strip_prefix("q=")?.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let whole: u16 = whole.parse().ok()?;
    if whole > 1 {
        return None;
    }
    let mut thousandths = whole.checked_mul(1000)?;
    if !fraction.is_empty() {
        let digits: String = fraction.chars().take(3).collect();
        if digits.chars().any(|c| !c.is_ascii_digit()) {
            return None;
        }
        let padded = format!("{digits:0<3}");
        thousandths = thousandths.checked_add(padded.parse().ok()?)?;
    }
    Some(thousandths.min(1000))
}

/// Picks the best supported locale for ordered candidate tags.
///
/// Returns the index into `supported` of the winner, or `None` when no
/// candidate matches. Earlier candidates win ties, per the standard
/// lookup rules.
#[must_use]
pub fn negotiate(candidates: &[String], supported: &[LanguageIdentifier]) -> Option<usize> {
    let requested: Vec<LanguageIdentifier> =
        candidates.iter().filter_map(|candidate| candidate.trim().parse().ok()).collect();
    let matched = negotiate_languages(&requested, supported, None, NegotiationStrategy::Lookup);
    let winner = matched.first()?;
    supported.iter().position(|tag| &tag == winner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn tags(raw: &[&str]) -> Vec<LanguageIdentifier> {
        raw.iter().map(|tag| tag.parse().unwrap()).collect()
    }

    #[rstest]
    #[case::unweighted("en-US,fr", vec!["en-US", "fr"])]
    #[case::weighted("en;q=0.8,fr;q=0.9", vec!["fr", "en"])]
    #[case::default_weight_wins("en;q=0.8,fr", vec!["fr", "en"])]
    #[case::wildcard_dropped("*,en", vec!["en"])]
    #[case::weighted_wildcard_dropped("fr-CH, fr;q=0.9, *;q=0.5", vec!["fr-CH", "fr"])]
    #[case::malformed_quality_dropped("en;q=abc,fr", vec!["fr"])]
    #[case::empty_header("", Vec::<&str>::new())]
    #[case::stable_within_weight("en;q=0.5,fr;q=0.5", vec!["en", "fr"])]
    #[case::three_digit_quality("en;q=0.125,fr;q=0.12", vec!["en", "fr"])]
    fn accept_language_ordering(#[case] header: &str, #[case] expected: Vec<&str>) {
        assert_that!(parse_accept_language(header), container_eq(expected));
    }

    #[rstest]
    #[case::one("q=1", Some(1000))]
    #[case::one_fraction("q=1.0", Some(1000))]
    #[case::tenths("q=0.9", Some(900))]
    #[case::hundredths("q=0.05", Some(50))]
    #[case::thousandths("q=0.125", Some(125))]
    #[case::extra_digits_truncated("q=0.1239", Some(123))]
    #[case::zero("q=0", Some(0))]
    #[case::spaces(" q=0.7 ", Some(700))]
    #[case::above_one("q=2", None)]
    #[case::not_a_number("q=abc", None)]
    #[case::missing_prefix("0.9", None)]
    fn quality_parsing(#[case] param: &str, #[case] expected: Option<u16>) {
        assert_that!(parse_quality(param), eq(expected));
    }

    #[rstest]
    fn negotiate_prefers_first_candidate() {
        let supported = tags(&["en-US", "zh-CN"]);

        let candidates = vec!["zh-CN".to_string(), "en-US".to_string()];

        assert_that!(negotiate(&candidates, &supported), some(eq(1)));
    }

    #[rstest]
    fn negotiate_matches_language_only_candidate() {
        let supported = tags(&["en-US", "zh-CN"]);

        let candidates = vec!["zh".to_string()];

        assert_that!(negotiate(&candidates, &supported), some(eq(1)));
    }

    #[rstest]
    fn negotiate_skips_unsupported_candidates() {
        let supported = tags(&["en-US", "zh-CN"]);

        let candidates = vec!["ja-JP".to_string(), "zh-CN".to_string()];

        assert_that!(negotiate(&candidates, &supported), some(eq(1)));
    }

    #[rstest]
    fn negotiate_returns_none_without_a_match() {
        let supported = tags(&["en-US"]);

        let candidates = vec!["ja-JP".to_string()];

        assert_that!(negotiate(&candidates, &supported), none());
    }

    #[rstest]
    fn negotiate_ignores_unparseable_candidates() {
        let supported = tags(&["en-US"]);

        let candidates = vec!["!!!".to_string(), "en-US".to_string()];

        assert_that!(negotiate(&candidates, &supported), some(eq(0)));
    }
}
