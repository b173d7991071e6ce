use once_cell::sync::Lazy;
use regex::RegexSet;

/// Phrases that ask the mentor to just write the solution.
/// Checked before intake or streaming, whatever the session state.
static CODE_REQUEST_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?im)\bgive\s+me\s+(the|all\s+the)\s+(full\s+|complete\s+|entire\s+|whole\s+)?(source\s+)?code(\s+(for|to)\b|\s*(please|now)?\s*[.!?]*\s*$)",
        r"(?i)\bwrite\s+(the|all\s+the|all|my)?\s*code\s+for\s+me\b",
        r"(?i)\b(write|build|code|do|solve|finish)\s+(it|this|everything)\s+for\s+me\b",
        r"(?i)\b(give|write|send|show)\s+me\s+(the|a)\s+(full|complete|entire|whole)\s+(source\s+)?(code|solution|implementation)\b",
        r"(?i)\bjust\s+give\s+me\s+the\s+(answer|solution)\b",
        r"(?i)\bcopy[\s-]+paste(able)?\s+(code|solution)\b",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

pub const REFUSAL: &str = "I'm here to mentor you, not to write your project for you. \
Handing over finished code would skip the part where you actually learn it. \
Tell me which step you're stuck on and what you've tried, and I'll help you work through it.";

pub struct CodeRequestGuard;

impl CodeRequestGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn is_direct_code_request(&self, text: &str) -> bool {
        CODE_REQUEST_PATTERNS.is_match(text)
    }
}

impl Default for CodeRequestGuard {
    fn default() -> Self {
        Self::new()
    }
}
