//! Error-page detection
//!
//! Some hosts answer a broken URL with a 2xx response whose body is an error page.
//! The classifier checks the page title and visible text against a fixed table of
//! phrases. Short pages are only logged: some real pages are short.

use crate::url::CrawlTarget;
use scraper::{Html, Selector};
use std::fmt;

/// Where a rule looks for its phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// The text of the first `<title>` element
    Title,
    /// All text in the document
    Body,
}

/// What kind of soft failure a phrase signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ServerError,
    NotFound,
    AccessDenied,
    Unavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ServerError => "server error",
            Self::NotFound => "not found",
            Self::AccessDenied => "access denied",
            Self::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

/// A phrase that marks a page as an error page when found in `scope`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorRule {
    pub scope: RuleScope,
    pub phrase: &'static str,
    pub kind: ErrorKind,
}

const fn rule(scope: RuleScope, phrase: &'static str, kind: ErrorKind) -> ErrorRule {
    ErrorRule {
        scope,
        phrase,
        kind,
    }
}

/// Rules are checked in order; the first match decides the rejection reason.
pub const ERROR_RULES: &[ErrorRule] = &[
    rule(RuleScope::Title, "Internal Server Error", ErrorKind::ServerError),
    rule(RuleScope::Title, "Error", ErrorKind::ServerError),
    rule(RuleScope::Title, "Page Not Found", ErrorKind::NotFound),
    rule(RuleScope::Title, "404 Not Found", ErrorKind::NotFound),
    rule(RuleScope::Title, "Access Denied", ErrorKind::AccessDenied),
    rule(RuleScope::Title, "Service Unavailable", ErrorKind::Unavailable),
    rule(RuleScope::Body, "An error occurred on the server", ErrorKind::ServerError),
    rule(RuleScope::Body, "We apologize for the problem", ErrorKind::ServerError),
    rule(RuleScope::Body, "The page you are looking for doesn't exist", ErrorKind::NotFound),
    rule(RuleScope::Body, "This page cannot be found", ErrorKind::NotFound),
    rule(RuleScope::Body, "You don't have permission to access", ErrorKind::AccessDenied),
    rule(RuleScope::Body, "Service is temporarily unavailable", ErrorKind::Unavailable),
];

/// Why a page was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub rule: ErrorRule,
    pub title: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule.scope {
            RuleScope::Title => write!(
                f,
                "{} (title '{}' contains '{}')",
                self.rule.kind, self.title, self.rule.phrase
            ),
            RuleScope::Body => write!(
                f,
                "{} (body contains '{}')",
                self.rule.kind, self.rule.phrase
            ),
        }
    }
}

/// Outcome of classifying a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Real content; `short` is set when the page is below the short-content threshold
    Accepted { short: bool },
    /// Error page
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Classifies fetched or cached HTML as real page or error page
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ErrorRule>,
    short_content_chars: usize,
}

impl Classifier {
    /// Creates a classifier with the standard rule table
    pub fn new(short_content_chars: usize) -> Self {
        Self::with_rules(ERROR_RULES.to_vec(), short_content_chars)
    }

    pub fn with_rules(rules: Vec<ErrorRule>, short_content_chars: usize) -> Self {
        Self {
            rules,
            short_content_chars,
        }
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    /// Classifies `content` fetched for `target`
    pub fn classify(&self, content: &str, target: &CrawlTarget) -> Verdict {
        let document = Html::parse_document(content);
        let title = page_title(&document);
        let body_text: String = document.root_element().text().collect();

        for rule in &self.rules {
            let haystack = match rule.scope {
                RuleScope::Title => title.as_str(),
                RuleScope::Body => body_text.as_str(),
            };
            if haystack.contains(rule.phrase) {
                tracing::debug!(
                    "Error phrase '{}' found in {:?} of {}",
                    rule.phrase,
                    rule.scope,
                    target
                );
                return Verdict::Rejected(Rejection { rule: *rule, title });
            }
        }

        let length = content.chars().count();
        let short = length < self.short_content_chars;
        if short {
            let preview: String = body_text.trim().chars().take(200).collect();
            tracing::debug!(
                "Suspiciously short content for {}: {} chars, title '{}', body starts '{}'",
                target,
                length,
                title,
                preview
            );
        }

        Verdict::Accepted { short }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(500)
    }
}

fn page_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
