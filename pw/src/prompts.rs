//! Embedded prompt templates
//!
//! Handlebars templates for plan generation and refinement, rendered with
//! HTML escaping off since output goes to an API body, not a page.

use handlebars::Handlebars;
use serde::Serialize;

/// System prompt for generating a business case from intake answers
pub const GENERATE_SYSTEM: &str = r#"You are a business consultant turning intake answers into a structured business case.

Respond with a single JSON object using exactly these keys (omit any key you cannot fill):
- "problem_statement": string
- "objectives": array of strings
- "current_state": string
- "proposed_solution": array of objects {"pillar", "effort", "impact", "actions": [strings], "timeline"?, "investment"?}
- "expected_outcomes": array of strings
- "next_steps": array of strings
- "risk_assessment": string (optional)
- "competitive_advantage": string (optional)

Ground every section in what the client actually said. Do not invent facts.
Keep arrays ordered by priority. Output only the JSON object.
"#;

/// User message template for plan generation
pub const GENERATE_USER: &str = r#"Client intake answers:

{{#each answers}}
### {{this.question}}
{{this.answer}}

{{/each}}
Produce the business case JSON now.
"#;

/// System prompt template for a refinement exchange
pub const REFINE_SYSTEM: &str = r#"You are refining an existing business case document based on the client's instruction.

Current document (JSON):
{{document}}

{{#if focus_section}}
The client is focused on the "{{focus_section}}" section. Prefer changing only it unless the instruction clearly requires touching others.
{{/if}}

Respond with a single JSON object:
{"refined_content": {<only the top-level sections you changed, with their complete new values>}, "changes_summary": "<one sentence describing the change>"}

Rules:
- Include a section in refined_content only if you changed it, and include its full new value.
- Never include sections you did not change.
- Use only the document's existing top-level keys.
- Output only the JSON object.
"#;

/// Render a template with the given data
pub fn render<T: Serialize>(template: &str, data: &T) -> Result<String, handlebars::RenderError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.render_template(template, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_generate_user() {
        let data = json!({
            "answers": [
                { "question": "Tell me about your business idea.", "answer": "A mobile bakery." },
                { "question": "Biggest challenges?", "answer": "Finding customers." },
            ]
        });

        let rendered = render(GENERATE_USER, &data).unwrap();
        assert!(rendered.contains("### Tell me about your business idea."));
        assert!(rendered.contains("A mobile bakery."));
        assert!(rendered.contains("Finding customers."));
    }

    #[test]
    fn test_render_refine_system_with_focus() {
        let data = json!({
            "document": "{\"problem_statement\":\"x\"}",
            "focus_section": "objectives",
        });

        let rendered = render(REFINE_SYSTEM, &data).unwrap();
        assert!(rendered.contains("{\"problem_statement\":\"x\"}"));
        assert!(rendered.contains("focused on the \"objectives\" section"));
    }

    #[test]
    fn test_render_refine_system_without_focus() {
        let data = json!({ "document": "{}" });
        let rendered = render(REFINE_SYSTEM, &data).unwrap();
        assert!(!rendered.contains("focused on the"));
    }

    #[test]
    fn test_render_does_not_html_escape() {
        let data = json!({ "document": "{\"a\":\"<b> & more\"}" });
        let rendered = render(REFINE_SYSTEM, &data).unwrap();
        assert!(rendered.contains("<b> & more"));
    }
}
