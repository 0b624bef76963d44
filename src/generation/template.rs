//! Placeholder substitution for prompt templates
//!
//! Templates use single-brace placeholders (`{user_query}`), with `{{` and
//! `}}` standing for literal braces. A placeholder that isn't one of the
//! supplied fields is an error, as is an unbalanced brace.

/// Error type for template rendering
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// `{name}` where `name` was not supplied
    UnknownField(String),
    /// `{` without a closing `}`
    Unclosed,
    /// `}` that doesn't close anything and isn't doubled
    UnmatchedBrace,
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::UnknownField(name) => {
                write!(f, "Template references unknown field '{}'", name)
            }
            TemplateError::Unclosed => write!(f, "Template has an unclosed '{{'"),
            TemplateError::UnmatchedBrace => write!(f, "Template has a single '}}'"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Substitute `fields` into `template`
pub fn render(template: &str, fields: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(TemplateError::Unclosed),
                    }
                }
                let value = fields
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or(TemplateError::UnknownField(name))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::UnmatchedBrace),
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_fields() {
        let out = render(
            "Docs:\n{kb_content}\nTask: {user_query} with {input_params}",
            &[
                ("kb_content", "GET /status"),
                ("user_query", "check signal"),
                ("input_params", "device=cam1"),
            ],
        )
        .unwrap();
        assert_eq!(out, "Docs:\nGET /status\nTask: check signal with device=cam1");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        // Braces inside substituted values stay as they are
        let out = render("{a}", &[("a", "{\"json\": {}}")]).unwrap();
        assert_eq!(out, "{\"json\": {}}");
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let out = render("headers = {{\"Authorization\": \"{auth_token}\"}}", &[("auth_token", "t")])
            .unwrap();
        assert_eq!(out, "headers = {\"Authorization\": \"t\"}");
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            render("{missing}", &[]),
            Err(TemplateError::UnknownField("missing".to_string()))
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(render("oops {user_query", &[]), Err(TemplateError::Unclosed));
        assert_eq!(render("oops }", &[]), Err(TemplateError::UnmatchedBrace));
    }
}
