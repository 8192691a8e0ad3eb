//! Email bodies. HTML is rendered with tera; the plaintext alternative is the
//! same markup with every tag stripped.

use tera::{Context, Tera};

use crate::error::MailError;

pub const NEW_ASSIGNMENT: &str = "new_assignment.html";
pub const ASSESSMENT_GRADED: &str = "assessment_graded.html";

const NEW_ASSIGNMENT_TPL: &str = r#"<p>Hello {{ student_name }},</p>
<p>A new assignment, <strong>{{ assignment_title }}</strong>, has been posted in {{ course_title }}.</p>
<p>Due date: {{ due_date }}</p>
<p>View it here: <a href="{{ assignment_link }}">{{ assignment_link }}</a></p>
"#;

const ASSESSMENT_GRADED_TPL: &str = r#"<p>Hello {{ student_name }},</p>
<p>Your submission for <strong>{{ assignment_title }}</strong> in {{ course_title }} has been graded.</p>
<p>Score: {{ score }} / {{ max_score }}</p>
{% if feedback %}<p>Feedback: {{ feedback }}</p>
{% endif %}<p>See the details here: <a href="{{ submission_link }}">{{ submission_link }}</a></p>
"#;

pub struct EmailTemplates {
    tera: Tera,
}

/// An email body in both renditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub html: String,
    pub text: String,
}

impl EmailTemplates {
    /// # Errors
    ///
    /// Returns `MailError::Template` if a built-in template fails to parse.
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (NEW_ASSIGNMENT, NEW_ASSIGNMENT_TPL),
            (ASSESSMENT_GRADED, ASSESSMENT_GRADED_TPL),
        ])?;
        Ok(Self { tera })
    }

    /// # Errors
    ///
    /// Returns `MailError::Template` for an unknown template or a missing variable.
    pub fn render(&self, name: &str, context: &Context) -> Result<RenderedBody, MailError> {
        let html = self.tera.render(name, context)?;
        let text = strip_tags(&html);
        Ok(RenderedBody { html, text })
    }
}

fn strip_tags(html: &str) -> String {
    let text = ammonia::Builder::empty().clean(html).to_string();
    // `&amp;` goes last so an escaped entity stays literal.
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_html_and_plaintext() {
        let templates = EmailTemplates::new().unwrap();
        let mut context = Context::new();
        context.insert("student_name", "Ada");
        context.insert("assignment_title", "Quiz 1");
        context.insert("course_title", "Rust 101");
        context.insert("due_date", "2023-11-20 12:00");
        context.insert("assignment_link", "http://localhost:8000/courses/1/");

        let body = templates.render(NEW_ASSIGNMENT, &context).unwrap();
        assert!(body.html.contains("<strong>Quiz 1</strong>"));
        assert!(!body.text.contains('<'));
        assert!(body.text.contains("Hello Ada,"));
        assert!(body.text.contains("http://localhost:8000/courses/1/"));
    }

    #[test]
    fn user_text_is_escaped_in_html() {
        let templates = EmailTemplates::new().unwrap();
        let mut context = Context::new();
        context.insert("student_name", "<script>x</script>");
        context.insert("assignment_title", "Essay");
        context.insert("course_title", "History");
        context.insert("score", "8.00");
        context.insert("max_score", &10);
        context.insert("feedback", "");
        context.insert("submission_link", "http://localhost:8000/submissions/4/");

        let body = templates.render(ASSESSMENT_GRADED, &context).unwrap();
        assert!(!body.html.contains("<script>"));
        assert!(!body.html.contains("Feedback:"));
    }

    #[test]
    fn plaintext_shows_entities_as_characters() {
        let templates = EmailTemplates::new().unwrap();
        let mut context = Context::new();
        context.insert("student_name", "O'Neil");
        context.insert("assignment_title", "Budget <draft>");
        context.insert("course_title", "R&D");
        context.insert("due_date", "2023-11-20 12:00");
        context.insert("assignment_link", "http://localhost:8000/courses/1/");

        let body = templates.render(NEW_ASSIGNMENT, &context).unwrap();
        assert!(body.html.contains("R&amp;D"));
        assert!(body.text.contains("in R&D."));
        assert!(body.text.contains("Budget <draft>"));
        assert!(body.text.contains("Hello O'Neil,"));
        assert!(!body.text.contains("&amp;"));
    }

    #[test]
    fn missing_variable_is_a_template_error() {
        let templates = EmailTemplates::new().unwrap();
        assert!(matches!(
            templates.render(NEW_ASSIGNMENT, &Context::new()),
            Err(MailError::Template(_))
        ));
    }
}
