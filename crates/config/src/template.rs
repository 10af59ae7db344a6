//! Ghost display name templates.
//!
//! A small subset of Go template syntax, enough for the common bridge
//! configs: literal text, `{{.Field}}`, string literals and
//! `{{or .A .B "fallback"}}` (first non-empty argument).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed action at byte {0}")]
    Unclosed(usize),
    #[error("empty action at byte {0}")]
    EmptyAction(usize),
    #[error("unknown field .{0}")]
    UnknownField(String),
    #[error("unknown function {0:?}")]
    UnknownFunction(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("wrong number of args for or: want at least 1 got 0")]
    EmptyOr,
}

/// Contact fields available to the display name template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaynameParams {
    pub push_name: String,
    pub business_name: String,
    pub full_name: String,
    pub first_name: String,
    /// `+` followed by the phone number.
    pub phone: String,
    pub jid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PushName,
    BusinessName,
    FullName,
    FirstName,
    Phone,
    Jid,
}

impl Field {
    fn parse(name: &str) -> Result<Self, TemplateError> {
        Ok(match name {
            "PushName" => Self::PushName,
            "BusinessName" => Self::BusinessName,
            "FullName" => Self::FullName,
            "FirstName" => Self::FirstName,
            "Phone" => Self::Phone,
            "JID" => Self::Jid,
            other => return Err(TemplateError::UnknownField(other.to_string())),
        })
    }

    fn get(self, params: &DisplaynameParams) -> &str {
        match self {
            Self::PushName => &params.push_name,
            Self::BusinessName => &params.business_name,
            Self::FullName => &params.full_name,
            Self::FirstName => &params.first_name,
            Self::Phone => &params.phone,
            Self::Jid => &params.jid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Field(Field),
    Literal(String),
}

impl Arg {
    fn eval<'a>(&'a self, params: &'a DisplaynameParams) -> &'a str {
        match self {
            Self::Field(f) => f.get(params),
            Self::Literal(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Value(Arg),
    Or(Vec<Arg>),
}

#[derive(Clone, PartialEq, Eq)]
pub struct DisplaynameTemplate {
    source: String,
    nodes: Vec<Node>,
}

impl fmt::Debug for DisplaynameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisplaynameTemplate")
            .field(&self.source)
            .finish()
    }
}

impl DisplaynameTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                nodes.push(Node::Text(rest[..start].to_string()));
            }
            let action_start = offset + start;
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or(TemplateError::Unclosed(action_start))?;
            nodes.push(parse_action(&after[..end], action_start)?);
            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            nodes.push(Node::Text(rest.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, params: &DisplaynameParams) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Value(arg) => out.push_str(arg.eval(params)),
                Node::Or(args) => {
                    let picked = args
                        .iter()
                        .map(|a| a.eval(params))
                        .find(|v| !v.is_empty())
                        .unwrap_or_default();
                    out.push_str(picked);
                },
            }
        }
        out
    }
}

fn parse_action(body: &str, at: usize) -> Result<Node, TemplateError> {
    let tokens = tokenize(body.trim())?;
    let Some((first, args)) = tokens.split_first() else {
        return Err(TemplateError::EmptyAction(at));
    };
    match first.as_str() {
        "or" => {
            if args.is_empty() {
                return Err(TemplateError::EmptyOr);
            }
            Ok(Node::Or(
                args.iter().map(|t| parse_arg(t)).collect::<Result<_, _>>()?,
            ))
        },
        _ if args.is_empty() => Ok(Node::Value(parse_arg(first)?)),
        other => Err(TemplateError::UnknownFunction(other.to_string())),
    }
}

fn parse_arg(token: &str) -> Result<Arg, TemplateError> {
    if let Some(field) = token.strip_prefix('.') {
        return Ok(Arg::Field(Field::parse(field)?));
    }
    if let Some(lit) = token.strip_prefix('"') {
        return Ok(Arg::Literal(lit.trim_end_matches('"').to_string()));
    }
    Err(TemplateError::UnknownFunction(token.to_string()))
}

/// Split on whitespace, keeping double-quoted strings (with their leading
/// and trailing quote) as single tokens.
fn tokenize(body: &str) -> Result<Vec<String>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            token.push(c);
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                token.push(c);
                if c == '"' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(TemplateError::UnterminatedString);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}
