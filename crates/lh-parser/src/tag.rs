use std::sync::OnceLock;

use lh_core::ExposedVariable;
use regex::Regex;

pub const EDITOR_ONLY: &str = "EditorOnly";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedTag<'a> {
    EditorOnly,
    Serialize { variable: &'a str },
    Exposed { type_name: &'a str, variable: &'a str },
    /// `Exposed` without the `type=name` part.
    MalformedExposed,
    Custom(&'a str),
}

fn serialize_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^Serialize\s+(\S+)$").expect("serialize tag regex must compile"))
}

fn exposed_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^Exposed\s+([^\s=]+)\s*=\s*(\S+)$").expect("exposed tag regex must compile")
    })
}

pub fn parse_tag(token: &str) -> ReservedTag<'_> {
    if token == EDITOR_ONLY {
        return ReservedTag::EditorOnly;
    }

    if let Some(captures) = serialize_regex().captures(token) {
        if let Some(variable) = captures.get(1) {
            return ReservedTag::Serialize {
                variable: variable.as_str(),
            };
        }
    }

    if token.starts_with("Exposed") {
        return match exposed_regex().captures(token) {
            Some(captures) => match (captures.get(1), captures.get(2)) {
                (Some(type_name), Some(variable)) => ReservedTag::Exposed {
                    type_name: type_name.as_str(),
                    variable: variable.as_str(),
                },
                _ => ReservedTag::MalformedExposed,
            },
            None => ReservedTag::MalformedExposed,
        };
    }

    ReservedTag::Custom(token)
}

/// Names of every global marked `#Serialize <name>`, in tag order, without duplicates.
pub fn serialized_variables<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut names: Vec<String> = Vec::new();
    for tag in tags {
        if let ReservedTag::Serialize { variable } = parse_tag(tag) {
            if !names.iter().any(|name| name == variable) {
                names.push(variable.to_string());
            }
        }
    }
    names
}

pub fn exposed_variables<'a, I>(tags: I) -> Vec<ExposedVariable>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut variables: Vec<ExposedVariable> = Vec::new();
    for tag in tags {
        if let ReservedTag::Exposed {
            type_name,
            variable,
        } = parse_tag(tag)
        {
            if variables.iter().any(|existing| existing.name == variable) {
                continue;
            }
            variables.push(ExposedVariable {
                type_name: type_name.to_string(),
                name: variable.to_string(),
            });
        }
    }
    variables
}

pub fn malformed_exposed_tags<'a, I>(tags: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .filter(|tag| matches!(parse_tag(tag), ReservedTag::MalformedExposed))
        .map(String::as_str)
        .collect()
}
