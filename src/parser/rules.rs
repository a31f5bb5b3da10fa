//! Ordered classification rules over a [`TokenShape`].
//!
//! Rules are tried in table order; the first one that returns a reference
//! wins. A token no rule accepts is rejected as an unrecognized shape.

use super::reference::{ClassifiedReference, RejectReason};
use super::shape::{LinkShape, TokenShape, digit_run};

/// Path segments that name a beatmap set container.
pub const SET_CONTAINER_SEGMENTS: [&str; 2] = ["beatmapsets", "s"];

/// Path segments that name user profiles; digits after them are never beatmaps.
const USER_SEGMENTS: [&str; 2] = ["u", "users"];

/// A single named classification rule.
pub struct ClassificationRule {
    /// Rule name, used in trace output
    pub name: &'static str,
    /// Returns a reference when the rule accepts the shape
    pub apply: fn(&TokenShape<'_>) -> Option<ClassifiedReference>,
}

/// The rule table, in precedence order.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "set-container",
        apply: set_container,
    },
    ClassificationRule {
        name: "direct-item",
        apply: direct_item,
    },
    ClassificationRule {
        name: "legacy-query-item",
        apply: legacy_query_item,
    },
];

/// Runs the rule table over a shape, falling back to rejection.
#[must_use]
pub fn apply_rules(token: &str, shape: &TokenShape<'_>) -> ClassifiedReference {
    for rule in RULES {
        if let Some(reference) = (rule.apply)(shape) {
            tracing::trace!(rule = rule.name, token, "classification rule matched");
            return reference;
        }
    }

    let reason = match shape {
        TokenShape::BareDigits(_) => RejectReason::IdOutOfRange,
        TokenShape::Link(_) => RejectReason::UnrecognizedShape,
    };
    ClassifiedReference::Rejected {
        token: token.to_string(),
        reason,
    }
}

fn is_set_container(segment: &str) -> bool {
    SET_CONTAINER_SEGMENTS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(segment))
}

fn is_user_segment(segment: &str) -> bool {
    USER_SEGMENTS.iter().any(|s| s.eq_ignore_ascii_case(segment))
}

/// `…/beatmapsets/<digits>` or `…/s/<digits>` with nothing after the ID.
fn set_container(shape: &TokenShape<'_>) -> Option<ClassifiedReference> {
    let TokenShape::Link(LinkShape {
        segments,
        has_fragment: false,
        ..
    }) = shape
    else {
        return None;
    };

    let container = segments.iter().position(|s| is_set_container(s))?;
    // The ID must be the final segment: a trailing segment selects a sub-item.
    if container + 2 != segments.len() {
        return None;
    }
    let id = digit_run(segments[container + 1])?;
    Some(ClassifiedReference::Set { id })
}

/// A bare leading number, or `<segment>/<digits>` where the single segment
/// is neither a set container nor a user profile.
fn direct_item(shape: &TokenShape<'_>) -> Option<ClassifiedReference> {
    match shape {
        TokenShape::BareDigits(digits) => {
            digit_run(digits).map(|id| ClassifiedReference::Item { id })
        }
        TokenShape::Link(link) => {
            let [segment, digits] = link.segments.as_slice() else {
                return None;
            };
            if is_set_container(segment) || is_user_segment(segment) {
                return None;
            }
            digit_run(digits).map(|id| ClassifiedReference::Item { id })
        }
    }
}

/// Old-site `beatmap?b=<digits>` links.
fn legacy_query_item(shape: &TokenShape<'_>) -> Option<ClassifiedReference> {
    let TokenShape::Link(link) = shape else {
        return None;
    };
    let query = link.query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "b")
        .and_then(|(_, value)| digit_run(&value))
        .map(|id| ClassifiedReference::Item { id })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn classify_link(token: &str) -> ClassifiedReference {
        apply_rules(token, &TokenShape::Link(LinkShape::parse(token)))
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["set-container", "direct-item", "legacy-query-item"]);
    }

    #[test]
    fn test_set_container_long_form() {
        assert_eq!(
            classify_link("https://osu.ppy.sh/beatmapsets/123"),
            ClassifiedReference::Set { id: 123 }
        );
    }

    #[test]
    fn test_set_container_short_form() {
        assert_eq!(
            classify_link("osu.ppy.sh/s/55"),
            ClassifiedReference::Set { id: 55 }
        );
    }

    #[test]
    fn test_set_container_trailing_slash() {
        assert_eq!(
            classify_link("https://osu.ppy.sh/beatmapsets/123/"),
            ClassifiedReference::Set { id: 123 }
        );
    }

    #[test]
    fn test_set_container_with_fragment_is_rejected() {
        for token in [
            "https://osu.ppy.sh/beatmapsets/123#osu/456",
            "https://osu.ppy.sh/beatmapsets/123%23osu/456",
            "https://osu.ppy.sh/beatmapsets/123#",
        ] {
            assert!(classify_link(token).is_rejected(), "{token} should be rejected");
        }
    }

    #[test]
    fn test_set_container_sub_path_is_rejected() {
        assert_eq!(
            classify_link("https://osu.ppy.sh/beatmapsets/123/456"),
            ClassifiedReference::Rejected {
                token: "https://osu.ppy.sh/beatmapsets/123/456".to_string(),
                reason: RejectReason::UnrecognizedShape,
            }
        );
    }

    #[test]
    fn test_direct_item_paths() {
        assert_eq!(
            classify_link("https://osu.ppy.sh/b/99"),
            ClassifiedReference::Item { id: 99 }
        );
        assert_eq!(
            classify_link("https://osu.ppy.sh/beatmaps/1234567"),
            ClassifiedReference::Item { id: 1_234_567 }
        );
    }

    #[test]
    fn test_direct_item_after_fragment_ignored() {
        // Digits inside the fragment are never considered.
        assert!(classify_link("https://osu.ppy.sh/home#b/12").is_rejected());
    }

    #[test]
    fn test_user_links_rejected() {
        assert!(classify_link("https://osu.ppy.sh/users/2").is_rejected());
        assert!(classify_link("https://osu.ppy.sh/u/2").is_rejected());
    }

    #[test]
    fn test_deep_links_with_digits_are_rejected() {
        for token in [
            "https://osu.ppy.sh/community/forums/topics/1234567",
            "https://osu.ppy.sh/scores/osu/4567890",
            "https://osu.ppy.sh/community/matches/111222",
            "https://github.com/foo/bar/issues/77",
            "https://osu.ppy.sh/b/12/extra",
        ] {
            assert!(classify_link(token).is_rejected(), "{token} should be rejected");
        }
    }

    #[test]
    fn test_zero_id_is_rejected() {
        assert!(classify_link("https://osu.ppy.sh/beatmaps/0").is_rejected());
        assert!(classify_link("https://osu.ppy.sh/beatmapsets/000").is_rejected());
        assert_eq!(
            apply_rules("0", &TokenShape::BareDigits("0")),
            ClassifiedReference::Rejected {
                token: "0".to_string(),
                reason: RejectReason::IdOutOfRange,
            }
        );
    }

    #[test]
    fn test_host_followed_by_digits_is_rejected() {
        assert!(classify_link("https://osu.ppy.sh/123").is_rejected());
    }

    #[test]
    fn test_digit_run_too_long_in_link() {
        assert_eq!(
            classify_link("https://osu.ppy.sh/b/123456789"),
            ClassifiedReference::Rejected {
                token: "https://osu.ppy.sh/b/123456789".to_string(),
                reason: RejectReason::UnrecognizedShape,
            }
        );
    }

    #[test]
    fn test_legacy_query_item() {
        assert_eq!(
            classify_link("http://osu.ppy.sh/p/beatmap?b=314&m=2"),
            ClassifiedReference::Item { id: 314 }
        );
    }

    #[test]
    fn test_bare_digits() {
        assert_eq!(
            apply_rules("42", &TokenShape::BareDigits("42")),
            ClassifiedReference::Item { id: 42 }
        );
        assert_eq!(
            apply_rules("123456789", &TokenShape::BareDigits("123456789")),
            ClassifiedReference::Rejected {
                token: "123456789".to_string(),
                reason: RejectReason::IdOutOfRange,
            }
        );
    }
}
