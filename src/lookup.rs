//! Classification and tokenization collaborators.
//!
//! The pipeline treats degree naming, corporation tagging, and employer-name
//! tokenization as external services: each is a trait the stages call through,
//! with a deterministic built-in implementation shipped for standalone use.

/// Resolves a categorical degree code to a display label.
pub trait DegreeLookup: Send + Sync {
    /// Returns the label for `code`, or an empty string for unknown codes.
    fn degree_name(&self, code: &str) -> anyhow::Result<String>;
}

/// Returns the tag set for an employer name.
pub trait CorporationTagger: Send + Sync {
    fn corp_tags(&self, name: &str) -> anyhow::Result<Vec<String>>;
}

/// Produces the tokenized form of a free-text value.
pub trait TermTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> anyhow::Result<String>;
}

/// Built-in degree table. Codes are the upstream extractor's categorical
/// values; unknown codes resolve to an empty label rather than an error.
pub struct StaticDegreeTable;

const DEGREE_TABLE: &[(&str, &str)] = &[
    ("0", "Other"),
    ("1", "High School"),
    ("2", "Technical Diploma"),
    ("3", "Associate"),
    ("4", "Bachelor"),
    ("5", "MBA"),
    ("6", "EMBA"),
    ("7", "Master"),
    ("8", "Doctor"),
    ("9", "Postdoc"),
];

impl DegreeLookup for StaticDegreeTable {
    fn degree_name(&self, code: &str) -> anyhow::Result<String> {
        let code = code.trim();
        Ok(DEGREE_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| (*name).to_string())
            .unwrap_or_default())
    }
}

/// Built-in corporation tagger: a short table of well-known employers plus
/// keyword rules over the name itself. Unknown names get an empty tag set.
pub struct KeywordCorpTagger;

const KNOWN_CORPORATIONS: &[(&str, &[&str])] = &[
    ("bytedance", &["internet", "consumer"]),
    ("tencent", &["internet", "gaming"]),
    ("alibaba", &["internet", "commerce"]),
    ("boeing", &["aerospace", "manufacturing"]),
    ("amazon", &["internet", "commerce"]),
    ("microsoft", &["internet", "software"]),
];

const KEYWORD_TAGS: &[(&str, &str)] = &[
    ("bank", "finance"),
    ("capital", "finance"),
    ("insurance", "finance"),
    ("university", "education"),
    ("college", "education"),
    ("school", "education"),
    ("hospital", "healthcare"),
    ("clinic", "healthcare"),
    ("software", "internet"),
    ("tech", "internet"),
    ("labs", "internet"),
    ("studio", "media"),
];

impl CorporationTagger for KeywordCorpTagger {
    fn corp_tags(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        if let Some((_, tags)) = KNOWN_CORPORATIONS
            .iter()
            .find(|(known, _)| needle.contains(known))
        {
            return Ok(tags.iter().map(|t| (*t).to_string()).collect());
        }

        let mut tags = Vec::new();
        for (keyword, tag) in KEYWORD_TAGS {
            if needle.contains(keyword) && !tags.iter().any(|t| t == tag) {
                tags.push((*tag).to_string());
            }
        }
        Ok(tags)
    }
}

/// Built-in tokenizer: lowercase, split on non-alphanumeric runs, join with
/// single spaces.
pub struct SimpleTokenizer;

impl TermTokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> anyhow::Result<String> {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        Ok(tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_codes_resolve() {
        let table = StaticDegreeTable;
        assert_eq!(table.degree_name("7").unwrap(), "Master");
        assert_eq!(table.degree_name(" 4 ").unwrap(), "Bachelor");
        assert_eq!(table.degree_name("42").unwrap(), "");
    }

    #[test]
    fn known_corporation_gets_table_tags() {
        let tagger = KeywordCorpTagger;
        let tags = tagger.corp_tags("ByteDance Ltd").unwrap();
        assert_eq!(tags, vec!["internet", "consumer"]);
    }

    #[test]
    fn keyword_rules_apply_to_unknown_names() {
        let tagger = KeywordCorpTagger;
        let tags = tagger.corp_tags("First National Bank").unwrap();
        assert_eq!(tags, vec!["finance"]);
        assert!(tagger.corp_tags("Acme Widgets").unwrap().is_empty());
        assert!(tagger.corp_tags("").unwrap().is_empty());
    }

    #[test]
    fn tokenizer_splits_and_lowercases() {
        let tokenizer = SimpleTokenizer;
        assert_eq!(
            tokenizer.tokenize("Blue Moon Labs, Inc.").unwrap(),
            "blue moon labs inc"
        );
        assert_eq!(tokenizer.tokenize("  ").unwrap(), "");
    }
}
