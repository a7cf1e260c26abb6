//! FILENAME: core/engine/src/fuzzy.rs
//! PURPOSE: Keyword rules that merge free-text values into canonical labels.
//! CONTEXT: Rule text comes from the user as "target1=kw1|kw2;target2=kw3".
//! Rules apply only when classification falls through to plain text and no
//! text bin matched; the first matching rule wins.

use serde::{Deserialize, Serialize};

// ============================================================================
// RULE MODEL
// ============================================================================

/// One merge rule: any value containing one of `keywords` (case-insensitive)
/// is grouped under `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyRule {
    pub target: String,
    pub keywords: Vec<String>,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parses rule text into an ordered rule list. Separators accept both the
/// ASCII and fullwidth forms since rule text is often typed with a CJK IME.
/// Malformed fragments (no target, no keywords) are skipped, not fatal.
pub fn parse_rules(text: &str) -> Vec<FuzzyRule> {
    let mut rules = Vec::new();

    for fragment in text.split(|c| c == ';' || c == '；' || c == '\n') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        let (target, keyword_text) = match fragment.split_once(['=', '＝']) {
            Some((t, k)) => (t.trim(), k),
            None => continue,
        };
        if target.is_empty() {
            continue;
        }

        let keywords: Vec<String> = keyword_text
            .split(['|', '｜'])
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            continue;
        }

        rules.push(FuzzyRule {
            target: target.to_string(),
            keywords,
        });
    }

    rules
}

// ============================================================================
// MATCHING
// ============================================================================

/// Returns the target of the first rule with a keyword contained in `value`
/// (case-insensitive substring).
pub fn match_target<'a>(value: &str, rules: &'a [FuzzyRule]) -> Option<&'a str> {
    if rules.is_empty() {
        return None;
    }
    let haystack = value.to_lowercase();
    for rule in rules {
        for keyword in &rule.keywords {
            if haystack.contains(&keyword.to_lowercase()) {
                return Some(&rule.target);
            }
        }
    }
    None
}
