/// Markdown emphasis the display layer cannot render; the model is told to omit it.
pub const FORBIDDEN_MARKER: &str = "**";

pub fn build_comparison_prompt(
    document_hits: &[String],
    legal_hits: &[String],
    query: &str,
) -> String {
    format!(
        "You are a legal compliance AI.\n\
         Compare the following:\n\
         \n\
         Contract sections:\n\
         {}\n\
         \n\
         Legal standards:\n\
         {}\n\
         \n\
         Query: \"{}\"\n\
         \n\
         Output a summary showing:\n\
         - Whether the contract aligns with legal standards\n\
         - Missing or risky clauses\n\
         - Recommendations for improvement\n\
         \n\
         Please provide a well-formatted response with no {} marks.\n",
        render_section(document_hits),
        render_section(legal_hits),
        query.trim(),
        FORBIDDEN_MARKER,
    )
}

fn render_section(hits: &[String]) -> String {
    if hits.is_empty() {
        return "(no matching sections)".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(index, text)| format!("[{}] {}", index + 1, text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
