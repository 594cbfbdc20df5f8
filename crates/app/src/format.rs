//! Cosmetic reflow of comparison text for terminal display.
//!
//! Applied only by the CLI client. The backend always returns the model
//! output untouched.

use regex::Regex;

const HEADINGS: &str = r"(Alignment with Legal Standards|Missing or Risky Clauses|Summary)";

pub struct ComparisonFormatter {
    bullet_emphasis: Regex,
    colon_bullet: Regex,
    emphasis: Regex,
    indented_line: Regex,
    headings: Regex,
}

impl ComparisonFormatter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bullet_emphasis: Regex::new(r"•\s*\*\*")?,
            colon_bullet: Regex::new(r":•")?,
            emphasis: Regex::new(r"\*\*\s*")?,
            indented_line: Regex::new(r"\n\s+")?,
            headings: Regex::new(HEADINGS)?,
        })
    }

    pub fn format(&self, text: &str) -> String {
        let text = text.trim();
        let text = self.bullet_emphasis.replace_all(text, "• **");
        let text = self.colon_bullet.replace_all(&text, ":");
        let text = self.emphasis.replace_all(&text, "** ");
        let text = self.indented_line.replace_all(&text, "\n");
        let text = text.replace('•', "\n-");
        let text = self.headings.replace_all(&text, "### ${1}");
        text.replace(". ", ".\n").replace(": ", ":\n")
    }
}
