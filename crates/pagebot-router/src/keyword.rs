// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword routing.
//!
//! Rules are evaluated in stored order against the inbound text and the
//! first match wins. All three match types are case-insensitive. Regex
//! patterns are compiled once per rule and recompiled when the rule's pattern
//! changes; a pattern that fails to compile is remembered as failed, reported
//! once, and skipped. Cached rules of a page that no longer appear in its
//! rule list are evicted.

use std::collections::HashMap;
use std::sync::Mutex;

use pagebot_core::types::{KeywordRule, MatchType};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Upper bound on the compiled size of a page-supplied pattern.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Compiled pattern of one rule.
struct CachedPattern {
    page_id: String,
    pattern: String,
    compiled: Option<Regex>,
}

/// A rule that matched an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub rule_id: String,
    pub flow_id: String,
}

/// Matches inbound text against a page's keyword rules.
#[derive(Default)]
pub struct KeywordRouter {
    /// Keyed by rule id.
    cache: Mutex<HashMap<String, CachedPattern>>,
}

impl KeywordRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the first rule in `rules` matching `text`.
    pub fn route(&self, rules: &[KeywordRule], text: &str) -> Option<RouteMatch> {
        self.evict_stale(rules);
        let lowered = text.to_lowercase();
        let hit = rules.iter().find(|rule| match rule.match_type {
            MatchType::Exact => lowered == rule.keyword.to_lowercase(),
            MatchType::Contains => lowered.contains(&rule.keyword.to_lowercase()),
            MatchType::Regex => self.regex_matches(rule, text),
        })?;

        debug!(
            rule_id = hit.id.as_str(),
            flow_id = hit.flow_id.as_str(),
            match_type = %hit.match_type,
            "keyword matched"
        );
        Some(RouteMatch {
            rule_id: hit.id.clone(),
            flow_id: hit.flow_id.clone(),
        })
    }

    fn regex_matches(&self, rule: &KeywordRule, text: &str) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = cache
            .get(&rule.id)
            .is_some_and(|c| c.pattern == rule.keyword);
        if !fresh {
            cache.insert(
                rule.id.clone(),
                CachedPattern {
                    page_id: rule.page_id.clone(),
                    pattern: rule.keyword.clone(),
                    compiled: compile(rule),
                },
            );
        }
        cache
            .get(&rule.id)
            .and_then(|c| c.compiled.as_ref())
            .is_some_and(|re| re.is_match(text))
    }

    /// Drop cached patterns of the pages in `rules` whose rule is gone.
    fn evict_stale(&self, rules: &[KeywordRule]) {
        let Some(first) = rules.first() else {
            return;
        };
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|id, cached| {
            cached.page_id != first.page_id || rules.iter().any(|r| r.id == *id)
        });
    }

    /// Forget every cached pattern of a page, e.g. after its last rule is deleted.
    pub fn forget_page(&self, page_id: &str) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|_, cached| cached.page_id != page_id);
    }

    /// Number of regex rules currently cached.
    pub fn cached_patterns(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn compile(rule: &KeywordRule) -> Option<Regex> {
    match build_regex(&rule.keyword) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(
                rule_id = rule.id.as_str(),
                pattern = rule.keyword.as_str(),
                error = %e,
                "invalid keyword regex, skipping rule"
            );
            None
        }
    }
}

fn build_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

/// Reject keywords that could never match: empty text, or a regex that does
/// not compile.
pub fn check_keyword(keyword: &str, match_type: MatchType) -> Result<(), String> {
    if keyword.trim().is_empty() {
        return Err("keyword must not be empty".to_string());
    }
    if match_type == MatchType::Regex {
        build_regex(keyword).map_err(|e| format!("invalid regex: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn rule(id: &str, keyword: &str, match_type: MatchType, flow_id: &str) -> KeywordRule {
        KeywordRule {
            id: id.into(),
            page_id: "p1".into(),
            keyword: keyword.into(),
            match_type,
            flow_id: flow_id.into(),
        }
    }

    #[test]
    fn exact_is_case_insensitive_equality() {
        let router = KeywordRouter::new();
        let rules = [rule("k1", "Menu", MatchType::Exact, "f1")];
        assert_eq!(router.route(&rules, "MENU").unwrap().flow_id, "f1");
        assert!(router.route(&rules, "show menu").is_none());
    }

    #[test]
    fn contains_matches_substring() {
        let router = KeywordRouter::new();
        let rules = [rule("k1", "price", MatchType::Contains, "f2")];
        assert_eq!(
            router.route(&rules, "What is the PRICE?"),
            Some(RouteMatch {
                rule_id: "k1".into(),
                flow_id: "f2".into()
            })
        );
    }

    #[test]
    fn regex_is_case_insensitive() {
        let router = KeywordRouter::new();
        let rules = [rule("k1", r"^order\s+#?\d+$", MatchType::Regex, "f3")];
        assert!(router.route(&rules, "ORDER #123").is_some());
        assert!(router.route(&rules, "my order").is_none());
    }

    #[test]
    fn first_match_wins() {
        let router = KeywordRouter::new();
        let rules = [
            rule("k1", "help", MatchType::Contains, "first"),
            rule("k2", "help", MatchType::Exact, "second"),
        ];
        assert_eq!(router.route(&rules, "help").unwrap().flow_id, "first");
    }

    #[test]
    #[traced_test]
    fn invalid_regex_is_skipped_and_reported_once() {
        let router = KeywordRouter::new();
        let rules = [
            rule("bad", "([", MatchType::Regex, "never"),
            rule("good", "hi", MatchType::Exact, "f1"),
        ];
        assert_eq!(router.route(&rules, "hi").unwrap().rule_id, "good");
        assert_eq!(router.route(&rules, "hi").unwrap().rule_id, "good");
        assert!(logs_contain("invalid keyword regex"));
        logs_assert(|lines: &[&str]| {
            let count = lines
                .iter()
                .filter(|l| l.contains("invalid keyword regex"))
                .count();
            if count == 1 {
                Ok(())
            } else {
                Err(format!("expected one warning, saw {count}"))
            }
        });
        assert_eq!(router.cached_patterns(), 1);
    }

    #[test]
    fn edited_pattern_is_recompiled() {
        let router = KeywordRouter::new();
        let mut rules = [rule("k1", "^refund$", MatchType::Regex, "f1")];
        assert!(router.route(&rules, "refund").is_some());

        rules[0].keyword = "^return$".into();
        assert!(router.route(&rules, "refund").is_none());
        assert!(router.route(&rules, "RETURN").is_some());
        assert_eq!(router.cached_patterns(), 1);
    }

    #[test]
    fn deleted_rules_are_evicted() {
        let router = KeywordRouter::new();
        let rules = [
            rule("k1", "^a+$", MatchType::Regex, "f1"),
            rule("k2", "^b+$", MatchType::Regex, "f2"),
        ];
        router.route(&rules, "bbb");
        assert_eq!(router.cached_patterns(), 2);

        router.route(&rules[1..], "bbb");
        assert_eq!(router.cached_patterns(), 1);

        router.forget_page("p1");
        assert_eq!(router.cached_patterns(), 0);
    }

    #[test]
    fn other_pages_keep_their_patterns() {
        let router = KeywordRouter::new();
        let mut other = rule("k9", "^z$", MatchType::Regex, "f9");
        other.page_id = "p2".into();
        router.route(&[other], "z");
        router.route(&[rule("k1", "^a$", MatchType::Regex, "f1")], "a");
        assert_eq!(router.cached_patterns(), 2);
    }

    #[test]
    fn keyword_check_rejects_unusable_rules() {
        assert!(check_keyword("help", MatchType::Contains).is_ok());
        assert!(check_keyword("  ", MatchType::Exact).is_err());
        assert!(check_keyword("([", MatchType::Regex).is_err());
        assert!(check_keyword(r"^order\s+\d+$", MatchType::Regex).is_ok());
    }

    #[test]
    fn no_rules_no_match() {
        assert!(KeywordRouter::new().route(&[], "anything").is_none());
    }
}
