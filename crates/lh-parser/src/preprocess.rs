use std::collections::{BTreeMap, BTreeSet};

use lh_core::FunctionDecl;

const TAG_MARKER: char = '#';
const FUNCTION_KEYWORD: &str = "function ";

/// Tags found in a script and their attachment to declared functions.
///
/// `function_to_tags` and `tag_to_functions` always describe the same
/// relation from opposite sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    pub tags: BTreeSet<String>,
    pub function_to_tags: BTreeMap<String, BTreeSet<String>>,
    pub tag_to_functions: BTreeMap<String, BTreeSet<String>>,
}

impl TagIndex {
    fn attach(&mut self, function: &str, tag: &str) {
        self.function_to_tags
            .entry(function.to_string())
            .or_default()
            .insert(tag.to_string());
        self.tag_to_functions
            .entry(tag.to_string())
            .or_default()
            .insert(function.to_string());
    }

    pub fn has_tag(&self, function: &str, tag: &str) -> bool {
        self.function_to_tags
            .get(function)
            .is_some_and(|tags| tags.contains(tag))
    }

    pub fn functions_with_tag(&self, tag: &str) -> Vec<&str> {
        self.tag_to_functions
            .get(tag)
            .map(|functions| functions.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn tags_of(&self, function: &str) -> Vec<&str> {
        self.function_to_tags
            .get(function)
            .map(|tags| tags.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of (function, tag) attachments.
    pub fn attachment_count(&self) -> usize {
        self.function_to_tags.values().map(BTreeSet::len).sum()
    }

    /// Drops attachments for functions rejected by `keep`. The general
    /// `tags` set is left untouched.
    pub fn retain_functions(&mut self, keep: impl Fn(&str) -> bool) {
        self.function_to_tags.retain(|function, _| keep(function));
        for functions in self.tag_to_functions.values_mut() {
            functions.retain(|function| keep(function));
        }
        self.tag_to_functions
            .retain(|_, functions| !functions.is_empty());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessedSource {
    /// Source with tag lines removed and `\r\n` normalized to `\n`.
    pub source: String,
    pub declarations: Vec<FunctionDecl>,
    pub tags: TagIndex,
}

/// Line-oriented scan of Lua source for tag comments and function declarations.
///
/// A tag line starts with `#` in its first column and carries comma separated
/// tags for the next declaration line. Consecutive tag lines stack; any other
/// line in between drops them. Declarations must fit on a single line.
pub fn preprocess(source: &str) -> PreprocessedSource {
    let normalized = source.replace("\r\n", "\n");
    let mut cleaned = String::with_capacity(normalized.len());
    let mut declarations = Vec::new();
    let mut index = TagIndex::default();
    let mut pending: Vec<String> = Vec::new();

    for (line_index, line) in normalized.lines().enumerate() {
        if line.starts_with(TAG_MARKER) {
            for token in split_tag_line(line) {
                index.tags.insert(token.clone());
                pending.push(token);
            }
            continue;
        }

        if let Some((name, arity)) = parse_declaration(line) {
            if !name.is_empty() {
                for tag in &pending {
                    index.attach(name, tag);
                }
                declarations.push(FunctionDecl {
                    name: name.to_string(),
                    arity,
                    line: line_index + 1,
                });
            }
        }

        pending.clear();
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    PreprocessedSource {
        source: cleaned,
        declarations,
        tags: index,
    }
}

fn split_tag_line(line: &str) -> Vec<String> {
    line[TAG_MARKER.len_utf8()..]
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the (possibly empty) name and the declared arity when `line`
/// holds `function <name>(...)`.
fn parse_declaration(line: &str) -> Option<(&str, usize)> {
    let keyword = line.find(FUNCTION_KEYWORD)?;
    let name_start = keyword + FUNCTION_KEYWORD.len();
    let open = name_start + line[name_start..].find('(')?;
    let close = open + line[open..].find(')')?;
    let name = line[name_start..open].trim();
    Some((name, count_parameters(&line[open..=close])))
}

/// Counts letter runs closed by a space, comma or `)`. Not a lexer: `...`
/// and identifiers made only of underscores or digits are not counted.
fn count_parameters(parameter_list: &str) -> usize {
    let mut count = 0;
    let mut reading = false;
    for ch in parameter_list.chars() {
        if ch.is_alphabetic() {
            reading = true;
        } else if matches!(ch, ' ' | ',' | ')') && reading {
            count += 1;
            reading = false;
        }
    }
    count
}
