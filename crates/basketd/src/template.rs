//! Response templating over captured request data.
//!
//! Configured responses may be text templates using `{{...}}` actions:
//!
//! - `{{.field.path}}` — print a value from the data model
//! - `{{.}}` — print the current value (the element inside a range)
//! - `{{range .list}}...{{end}}` — repeat the body for every element
//! - `{{index .list 0}}` — pick an element of a list or map
//!
//! The data model is rebuilt for every incoming request:
//!
//! - `body` — the captured body parsed as JSON, present only when the
//!   request carried a JSON media type and the body parsed.
//! - `query` — map from parameter name to the list of its values.
//! - every query parameter is additionally exposed at the top level for
//!   backward compatibility; on collision the `query` sub-namespace wins.
//!
//! Example: a `GET ?name=Adam&name=Dan` against the template body
//! `hello {{range .name}}{{.}} {{end}}` renders `hello Adam Dan `.

use crate::basket::types::RequestData;
use serde_json::{Map, Value};

/// One parsed template node.
#[derive(Debug, Clone)]
enum Node {
    Text(String),
    /// `{{.a.b}}`; an empty path is `{{.}}`.
    Field(Vec<String>),
    /// `{{index .collection <arg>...}}`.
    Index(Vec<Arg>),
    /// `{{range .list}}body{{end}}`.
    Range { path: Vec<String>, body: Vec<Node> },
}

#[derive(Debug, Clone)]
enum Arg {
    Path(Vec<String>),
    Number(usize),
}

/// Syntax-check a template string without rendering it.
pub fn compile(template: &str) -> Result<(), String> {
    parse(template).map(|_| ())
}

/// Render a template against data built from the captured request.
pub fn render(template: &str, data: &Value) -> Result<String, String> {
    let nodes = parse(template)?;
    let mut out = String::new();
    exec(&nodes, data, &mut out)?;
    Ok(out)
}

fn parse(source: &str) -> Result<Vec<Node>, String> {
    struct Frame {
        range_path: Option<Vec<String>>,
        nodes: Vec<Node>,
    }
    let mut stack = vec![Frame {
        range_path: None,
        nodes: Vec::new(),
    }];

    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            let top = stack.last_mut().expect("parse stack is never empty");
            top.nodes.push(Node::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let Some(close) = after.find("}}") else {
            return Err("unclosed action".to_string());
        };
        let action = after[..close].trim();
        rest = &after[close + 2..];

        let mut words = action.split_whitespace();
        let Some(first) = words.next() else {
            return Err("missing value for command".to_string());
        };
        match first {
            "end" => {
                if words.next().is_some() {
                    return Err("unexpected text after end".to_string());
                }
                let frame = stack.pop().expect("parse stack is never empty");
                match frame.range_path {
                    Some(path) => {
                        let top = stack.last_mut().expect("parse stack is never empty");
                        top.nodes.push(Node::Range {
                            path,
                            body: frame.nodes,
                        });
                    }
                    None => return Err("unexpected {{end}}".to_string()),
                }
            }
            "range" => {
                let arg = words
                    .next()
                    .ok_or_else(|| "missing argument for range".to_string())?;
                if words.next().is_some() {
                    return Err("too many arguments for range".to_string());
                }
                stack.push(Frame {
                    range_path: Some(parse_path(arg)?),
                    nodes: Vec::new(),
                });
            }
            "index" => {
                let mut args = Vec::new();
                for word in words {
                    if word.starts_with('.') || word == "." {
                        args.push(Arg::Path(parse_path(word)?));
                    } else if let Ok(n) = word.parse::<usize>() {
                        args.push(Arg::Number(n));
                    } else {
                        return Err(format!("bad argument {word:?} for index"));
                    }
                }
                if args.is_empty() {
                    return Err("missing argument for index".to_string());
                }
                let top = stack.last_mut().expect("parse stack is never empty");
                top.nodes.push(Node::Index(args));
            }
            _ => {
                if words.next().is_some() {
                    return Err(format!("unexpected arguments after {first:?}"));
                }
                let top = stack.last_mut().expect("parse stack is never empty");
                top.nodes.push(Node::Field(parse_path(first)?));
            }
        }
    }
    if !rest.is_empty() {
        let top = stack.last_mut().expect("parse stack is never empty");
        top.nodes.push(Node::Text(rest.to_string()));
    }

    let frame = stack.pop().expect("parse stack is never empty");
    if !stack.is_empty() || frame.range_path.is_some() {
        return Err("unexpected EOF, unclosed range".to_string());
    }
    Ok(frame.nodes)
}

/// Parse a `.a.b.c` field reference; a bare word is an unknown function.
fn parse_path(token: &str) -> Result<Vec<String>, String> {
    if token == "." {
        return Ok(Vec::new());
    }
    let Some(rest) = token.strip_prefix('.') else {
        return Err(format!("function {token:?} not defined"));
    };
    let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(format!("bad character in field path {token:?}"));
    }
    Ok(segments)
}

fn exec(nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), String> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(path) => out.push_str(&print_value(lookup(dot, path))),
            Node::Index(args) => out.push_str(&print_value(Some(eval_index(args, dot)?))),
            Node::Range { path, body } => {
                let value = lookup(dot, path);
                let Some(Value::Array(items)) = value else {
                    return Err(format!(
                        "range can't iterate over {}",
                        print_value(value)
                    ));
                };
                for item in items {
                    exec(body, item, out)?;
                }
            }
        }
    }
    Ok(())
}

/// Resolve a field path against the current value; `None` is rendered
/// as `<no value>` rather than failing the whole template.
fn lookup<'a>(dot: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = dot;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn eval_index<'a>(args: &[Arg], dot: &'a Value) -> Result<&'a Value, String> {
    let mut iter = args.iter();
    let mut current = match iter.next() {
        Some(Arg::Path(path)) => {
            lookup(dot, path).ok_or_else(|| "index of untyped nil".to_string())?
        }
        _ => return Err("index wants a collection as its first argument".to_string()),
    };
    for arg in iter {
        current = match arg {
            Arg::Number(n) => current
                .as_array()
                .and_then(|items| items.get(*n))
                .ok_or_else(|| format!("index out of range: {n}"))?,
            Arg::Path(path) => {
                let key = lookup(dot, path).ok_or_else(|| "index of untyped nil".to_string())?;
                match key {
                    Value::String(key) => current
                        .as_object()
                        .and_then(|map| map.get(key))
                        .ok_or_else(|| format!("map has no entry for key {key:?}"))?,
                    Value::Number(n) => {
                        let n = n
                            .as_u64()
                            .ok_or_else(|| format!("cannot index with {n}"))?
                            as usize;
                        current
                            .as_array()
                            .and_then(|items| items.get(n))
                            .ok_or_else(|| format!("index out of range: {n}"))?
                    }
                    other => return Err(format!("cannot index with {}", print_value(Some(other)))),
                }
            }
        };
    }
    Ok(current)
}

fn print_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "<no value>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Build the template data model for one captured request.
pub fn template_data(request: &RequestData) -> Value {
    let mut data = Map::new();
    let query = parse_query_values(&request.query);

    // back-compat: query parameters at the top level
    for (name, values) in &query {
        data.insert(
            name.clone(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }

    if is_json_media_type(request.first_header("Content-Type")) {
        if let Ok(parsed) = serde_json::from_str::<Value>(&request.body) {
            data.insert("body".to_string(), parsed);
        }
    }

    // the sub-namespace wins over a same-named top-level parameter
    let query_map: Map<String, Value> = query
        .into_iter()
        .map(|(name, values)| {
            (
                name,
                Value::Array(values.into_iter().map(Value::String).collect()),
            )
        })
        .collect();
    data.insert("query".to_string(), Value::Object(query_map));

    Value::Object(data)
}

/// Split a raw query string into name -> values, decoding percent escapes.
fn parse_query_values(query: &str) -> Vec<(String, Vec<String>)> {
    let mut params: Vec<(String, Vec<String>)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = urlencoding::decode(name).unwrap_or_default().into_owned();
        let value = urlencoding::decode(value).unwrap_or_default().into_owned();
        match params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => params.push((name, vec![value])),
        }
    }
    params
}

fn is_json_media_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::types::HeaderDict;

    fn request(body: &str, content_type: &str, query: &str) -> RequestData {
        let mut headers = HeaderDict::new();
        if !content_type.is_empty() {
            headers.insert("Content-Type".to_string(), vec![content_type.to_string()]);
        }
        RequestData {
            date: 0,
            headers,
            content_length: body.len() as i64,
            body: body.to_string(),
            method: "GET".to_string(),
            path: "/".to_string(),
            query: query.to_string(),
        }
    }

    #[test]
    fn test_compile_accepts_valid_templates() {
        assert!(compile("hello {{range .name}}{{.}} {{end}}").is_ok());
        assert!(compile("plain text, no placeholders").is_ok());
        assert!(compile("{{index .query.name 0}}").is_ok());
        assert!(compile("{{.body.data.authorizationId}}").is_ok());
        assert!(compile("{{range .a}}{{range .b}}{{.}}{{end}}{{end}}").is_ok());
    }

    #[test]
    fn test_compile_rejects_unknown_function() {
        let err = compile("data: {{data}}").unwrap_err();
        assert!(err.contains("function \"data\" not defined"), "got: {err}");
    }

    #[test]
    fn test_compile_rejects_unclosed_range() {
        assert!(compile("hello {{range .name}}{{.}} ").is_err());
    }

    #[test]
    fn test_compile_rejects_stray_end() {
        assert!(compile("oops {{end}}").is_err());
    }

    #[test]
    fn test_compile_rejects_unclosed_action() {
        assert!(compile("broken {{.name").is_err());
    }

    #[test]
    fn test_render_range_over_query_values() {
        let data = template_data(&request("test", "", "name=Adam&name=Dan"));
        let out = render("hello {{range .name}}{{.}} {{end}}", &data).unwrap();
        assert_eq!(out, "hello Adam Dan ");
    }

    #[test]
    fn test_template_data_model() {
        let body = "{\n    \"data\": {\n        \"authorizationId\": \"4bc09f83-19d3-41ca-b6ee-68d5fb293ae7\"\n    },\n    \"eventName\": \"request\",\n    \"eventType\": \"authorization\"\n}";
        let data = template_data(&request(body, "application/json", "name=ming&test=aa"));
        let out = render(
            "{\"authorizationId\":\"{{.body.data.authorizationId}}\",\
             \"query\":\"{{index .query.name 0}}\",\
             \"query-back-compatibility\":\"{{index .name 0}}\",\
             \"responseCode\":\"00\"}",
            &data,
        )
        .unwrap();
        assert_eq!(
            out,
            "{\"authorizationId\":\"4bc09f83-19d3-41ca-b6ee-68d5fb293ae7\",\
             \"query\":\"ming\",\
             \"query-back-compatibility\":\"ming\",\
             \"responseCode\":\"00\"}"
        );
    }

    #[test]
    fn test_render_missing_field_prints_no_value() {
        let data = template_data(&request("", "", ""));
        assert_eq!(render("x={{.absent}}", &data).unwrap(), "x=<no value>");
        assert_eq!(
            render("x={{.body.data.id}}", &data).unwrap(),
            "x=<no value>"
        );
    }

    #[test]
    fn test_render_range_over_missing_field_fails() {
        let data = template_data(&request("", "", ""));
        assert!(render("{{range .absent}}{{.}}{{end}}", &data).is_err());
    }

    #[test]
    fn test_render_index_out_of_range_fails() {
        let data = template_data(&request("", "", "name=only"));
        assert!(render("{{index .name 5}}", &data).is_err());
    }

    #[test]
    fn test_body_absent_without_json_content_type() {
        let data = template_data(&request("{\"a\":1}", "text/plain", ""));
        assert!(data.get("body").is_none());
    }

    #[test]
    fn test_body_absent_when_json_does_not_parse() {
        let data = template_data(&request("{broken", "application/json", ""));
        assert!(data.get("body").is_none());
    }

    #[test]
    fn test_body_present_for_json_suffix_media_type() {
        let data = template_data(&request("{\"a\":1}", "application/hal+json; charset=utf-8", ""));
        assert_eq!(data["body"]["a"], 1);
    }

    #[test]
    fn test_query_collision_favors_sub_namespace() {
        let data = template_data(&request("", "", "query=top&other=1"));
        // the "query" key holds the namespace, not the parameter value
        assert!(data["query"].is_object());
        assert_eq!(data["query"]["query"][0], "top");
        assert_eq!(data["other"][0], "1");
    }

    #[test]
    fn test_query_values_are_decoded() {
        let data = template_data(&request("", "", "greeting=hello%20world"));
        assert_eq!(data["query"]["greeting"][0], "hello world");
        assert_eq!(
            render("{{index .query.greeting 0}}", &data).unwrap(),
            "hello world"
        );
    }
}
