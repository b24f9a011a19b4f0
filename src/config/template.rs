//! Output templates for `config view -o template`
//!
//! Supports the subset completion relies on: literal text, field access
//! (`{{ .contexts }}`, `{{ .a.b }}`, `{{ . }}`) and `{{ range .path }}` ...
//! `{{ end }}` blocks, which may nest. Inside a range the dot is the current
//! element.

use serde_json::Value;

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(Vec<String>),
    Range { path: Vec<String>, body: Vec<Node> },
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template text
    ///
    /// # Arguments
    /// * `source` - Template text
    ///
    /// # Returns
    /// * `Result<Template, TemplateError>` - Parsed template or syntax error
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut open: Vec<(Vec<String>, Vec<Node>)> = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                current.push(Node::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateError::Syntax("unclosed action".to_string()))?;
            let action = after[..end].trim();
            rest = &after[end + 2..];

            if action == "end" {
                let (path, outer) = open
                    .pop()
                    .ok_or_else(|| TemplateError::Syntax("unexpected {{ end }}".to_string()))?;
                let body = std::mem::replace(&mut current, outer);
                current.push(Node::Range { path, body });
            } else if let Some(target) = action.strip_prefix("range ") {
                let path = parse_path(target.trim())?;
                open.push((path, std::mem::take(&mut current)));
            } else {
                current.push(Node::Field(parse_path(action)?));
            }
        }

        if !rest.is_empty() {
            current.push(Node::Text(rest.to_string()));
        }
        if !open.is_empty() {
            return Err(TemplateError::Syntax("missing {{ end }}".to_string()));
        }

        Ok(Self { nodes: current })
    }

    /// Evaluate against `data`.
    ///
    /// Missing fields render as nothing and ranging over a missing field runs
    /// zero times.
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out)?;
        Ok(out)
    }
}

/// Parse and render in one step
pub fn render(source: &str, data: &Value) -> Result<String, TemplateError> {
    Template::parse(source)?.render(data)
}

fn parse_path(text: &str) -> Result<Vec<String>, TemplateError> {
    if text == "." {
        return Ok(Vec::new());
    }
    let Some(rest) = text.strip_prefix('.') else {
        return Err(TemplateError::Syntax(format!("unsupported action '{text}'")));
    };

    let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
    let valid = segments.iter().all(|s| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });
    if !valid {
        return Err(TemplateError::Syntax(format!("bad field path '{text}'")));
    }
    Ok(segments)
}

fn lookup<'a>(dot: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(dot, |value, segment| value.get(segment.as_str()))
}

fn render_nodes(nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(path) => {
                if let Some(value) = lookup(dot, path) {
                    write_value(value, out);
                }
            }
            Node::Range { path, body } => match lookup(dot, path) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for item in items {
                        render_nodes(body, item, out)?;
                    }
                }
                Some(Value::Object(map)) => {
                    for item in map.values() {
                        render_nodes(body, item, out)?;
                    }
                }
                Some(_) => return Err(TemplateError::NotIterable(format!(".{}", path.join(".")))),
            },
        }
    }
    Ok(())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(&b.to_string()),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "current_context": "dev",
            "contexts": [
                {"name": "dev", "namespace": "default"},
                {"name": "prod"}
            ],
            "clusters": [],
            "pod": {"spec": {"containers": [{"name": "app"}, {"name": "sidecar"}]}},
            "count": 3
        })
    }

    #[test]
    fn test_range_names() {
        let out = render("{{ range .contexts }}{{ .name }} {{ end }}", &data()).unwrap();
        assert_eq!(out, "dev prod ");
    }

    #[test]
    fn test_nested_path_and_text() {
        let out = render(
            "containers: {{ range .pod.spec.containers }}[{{.name}}]{{ end }}!",
            &data(),
        )
        .unwrap();
        assert_eq!(out, "containers: [app][sidecar]!");
    }

    #[test]
    fn test_nested_ranges() {
        let value = json!({"groups": [{"items": [1, 2]}, {"items": [3]}]});
        let out = render(
            "{{ range .groups }}<{{ range .items }}{{ . }}{{ end }}>{{ end }}",
            &value,
        )
        .unwrap();
        assert_eq!(out, "<12><3>");
    }

    #[test]
    fn test_missing_values_render_empty() {
        let out = render(
            "{{ .missing }}|{{ range .nothing }}x{{ end }}|{{ range .clusters }}x{{ end }}",
            &data(),
        )
        .unwrap();
        assert_eq!(out, "||");
        let out = render("{{ range .contexts }}{{ .namespace }},{{ end }}", &data()).unwrap();
        assert_eq!(out, "default,,");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render("{{ .count }}", &data()).unwrap(), "3");
        assert_eq!(render("{{ .current_context }}", &data()).unwrap(), "dev");
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "{{ .name",
            "{{ end }}",
            "{{ range .contexts }}x",
            "{{ name }}",
            "{{ .a..b }}",
            "{{ range }}{{ end }}",
        ] {
            assert!(
                matches!(Template::parse(bad), Err(TemplateError::Syntax(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_range_over_scalar() {
        assert_eq!(
            render("{{ range .count }}x{{ end }}", &data()),
            Err(TemplateError::NotIterable(".count".to_string()))
        );
    }
}
