use html_escape::{encode_double_quoted_attribute, encode_text};
use rw_core::Reference;

use crate::references::ReferenceArticle;

/// The single prompt sent to the LLM for a rewrite.
///
/// References appear in collection order; a missing second reference
/// leaves its section empty.
pub fn build_rewrite_prompt(original_html: &str, references: &[ReferenceArticle]) -> String {
    let reference = |i: usize| references.get(i).map(|r| r.content.as_str()).unwrap_or("");

    format!(
        r#"You are a professional SEO blog writer.

Rewrite the ORIGINAL ARTICLE so that:
- It keeps the same topic and core ideas.
- It adopts the formatting and tone similar to the REFERENCE ARTICLES.
- It uses headings, subheadings, short paragraphs, and bullet points.
- It does NOT copy any sentences from the references; everything must be rephrased.
- At the end, add a "References" section with links to the reference URLs.

ORIGINAL ARTICLE (HTML allowed):
{original}

REFERENCE ARTICLE 1 (plain text):
{first}

REFERENCE ARTICLE 2 (plain text):
{second}

Return ONLY the final HTML of the rewritten article."#,
        original = original_html,
        first = reference(0),
        second = reference(1),
    )
}

/// `<h3>References</h3>` followed by one link per reference, opening in a new tab.
pub fn references_html(references: &[Reference]) -> String {
    let items: Vec<String> = references
        .iter()
        .map(|r| {
            format!(
                r#"  <li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                encode_double_quoted_attribute(&r.url),
                encode_text(&r.title)
            )
        })
        .collect();
    format!("<h3>References</h3>\n<ul>\n{}\n</ul>", items.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_article(title: &str, content: &str) -> ReferenceArticle {
        ReferenceArticle {
            title: title.to_string(),
            url: format!("https://{}.example/", title.to_lowercase()),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_sections_in_order() {
        let refs = vec![reference_article("One", "first body"), reference_article("Two", "second body")];
        let prompt = build_rewrite_prompt("<p>original</p>", &refs);

        let original = prompt.find("<p>original</p>").unwrap();
        let first = prompt.find("first body").unwrap();
        let second = prompt.find("second body").unwrap();
        assert!(original < first && first < second);
        assert!(prompt.starts_with("You are a professional SEO blog writer."));
        assert!(prompt.ends_with("Return ONLY the final HTML of the rewritten article."));
    }

    #[test]
    fn test_prompt_with_single_reference() {
        let refs = vec![reference_article("One", "only body")];
        let prompt = build_rewrite_prompt("", &refs);
        assert!(prompt.contains("REFERENCE ARTICLE 1 (plain text):\nonly body\n"));
        assert!(prompt.contains("REFERENCE ARTICLE 2 (plain text):\n\n"));
    }

    #[test]
    fn test_references_html() {
        let refs = vec![
            Reference { title: "First".to_string(), url: "https://a.example/1".to_string() },
            Reference { title: "Q&A <2024>".to_string(), url: "https://b.example/?a=1&b=\"2\"".to_string() },
        ];
        let html = references_html(&refs);
        assert_eq!(
            html,
            "<h3>References</h3>\n<ul>\n  \
             <li><a href=\"https://a.example/1\" target=\"_blank\" rel=\"noopener noreferrer\">First</a></li>\n  \
             <li><a href=\"https://b.example/?a=1&amp;b=&quot;2&quot;\" target=\"_blank\" rel=\"noopener noreferrer\">Q&amp;A &lt;2024&gt;</a></li>\n\
             </ul>"
        );
    }
}
