//! Markdown grammar primitives shared by the serializer and the parser.
//!
//! This is the only place that knows Markdown syntax. Render functions take
//! raw text and escape it; parse functions return raw (unescaped) text.

use crate::error::{ParseError, Result};
use regex::Regex;
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})(?: (.*))?$").unwrap());

static RE_CHECKLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\](?: (.*))?$").unwrap());

static RE_ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.(?: (.*))?$").unwrap());

/// Characters escaped wherever they appear.
const ALWAYS_ESCAPED: &[char] = &['\\', '|', '*', '`'];

/// Characters escaped only at the start of a value, where they would read
/// as a heading, list item, blockquote or list marker.
const LEADING_ESCAPED: &[char] = &['#', '-', '>', '+'];

// -- Escaping -----------------------------------------------------------------

/// Escape text so it occupies a single line and cannot be mistaken for
/// structure.
///
/// The result never contains a newline, an unescaped `|`, `*` or backtick,
/// and never starts or ends with a space.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let last = s.chars().count().saturating_sub(1);
    for (i, c) in s.chars().enumerate() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' if i == 0 || i == last => out.push_str("\\s"),
            c if ALWAYS_ESCAPED.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c if i == 0 && LEADING_ESCAPED.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_text`]. Unknown escape sequences are kept verbatim.
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some(e) if ALWAYS_ESCAPED.contains(&e) || LEADING_ESCAPED.contains(&e) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Trim the padding the renderers put around values. Only spaces are
/// trimmed; escaped values never carry meaningful edge spaces.
fn trim_padding(s: &str) -> &str {
    s.trim_matches(' ')
}

// -- Headings -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
}

pub fn render_heading(level: usize, text: &str) -> String {
    let level = level.clamp(1, 6);
    let text = escape_text(text);
    if text.is_empty() {
        "#".repeat(level)
    } else {
        format!("{} {}", "#".repeat(level), text)
    }
}

pub fn match_heading(line: &str) -> Option<Heading> {
    let caps = RE_HEADING.captures(line)?;
    let text = caps.get(2).map(|m| trim_padding(m.as_str())).unwrap_or("");
    Some(Heading {
        level: caps[1].len(),
        text: unescape_text(text),
    })
}

// -- Heading tree -------------------------------------------------------------

/// A heading and everything under it.
///
/// The root section has level 0 and an empty title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub level: usize,
    pub title: String,
    /// Lines between this heading and the next heading of any level
    pub body: Vec<&'a str>,
    pub children: Vec<Section<'a>>,
}

impl<'a> Section<'a> {
    fn new(level: usize, title: String) -> Self {
        Self {
            level,
            title,
            body: Vec::new(),
            children: Vec::new(),
        }
    }

    /// First direct child with the given title.
    pub fn child(&self, title: &str) -> Option<&Section<'a>> {
        self.children.iter().find(|c| c.title == title)
    }

    /// Body lines outside fenced code blocks.
    pub fn prose(&self) -> Vec<&'a str> {
        let mut fence: Option<&str> = None;
        let mut out = Vec::new();
        for &line in &self.body {
            match fence {
                Some(f) => {
                    if line == f {
                        fence = None;
                    }
                }
                None => match fence_marker(line) {
                    Some(f) => fence = Some(f),
                    None => out.push(line),
                },
            }
        }
        out
    }
}

/// Split a document into a heading tree.
///
/// Lines inside fenced code blocks never open a section.
pub fn split_sections(markdown: &str) -> Section<'_> {
    let mut stack: Vec<Section<'_>> = vec![Section::new(0, String::new())];
    let mut fence: Option<&str> = None;

    for line in markdown.split('\n') {
        if let Some(f) = fence {
            if line == f {
                fence = None;
            }
            push_body(&mut stack, line);
            continue;
        }
        if let Some(f) = fence_marker(line) {
            fence = Some(f);
            push_body(&mut stack, line);
            continue;
        }
        if let Some(heading) = match_heading(line) {
            close_sections(&mut stack, heading.level);
            stack.push(Section::new(heading.level, heading.text));
            continue;
        }
        push_body(&mut stack, line);
    }

    close_sections(&mut stack, 1);
    stack.pop().unwrap_or_else(|| Section::new(0, String::new()))
}

fn push_body<'a>(stack: &mut [Section<'a>], line: &'a str) {
    if let Some(top) = stack.last_mut() {
        top.body.push(line);
    }
}

/// Pop every open section at `level` or deeper into its parent.
fn close_sections(stack: &mut Vec<Section<'_>>, level: usize) {
    while stack.len() > 1 && stack.last().map_or(false, |s| s.level >= level) {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(done);
            }
        }
    }
}

// -- Field lines --------------------------------------------------------------

/// `**Key:** value`
pub fn render_field(key: &str, value: &str) -> String {
    let value = escape_text(value);
    if value.is_empty() {
        format!("**{}:**", key)
    } else {
        format!("**{}:** {}", key, value)
    }
}

/// Find the first `**Key:**` line and return its unescaped value.
pub fn find_field(lines: &[&str], key: &str) -> Option<String> {
    lines.iter().find_map(|line| {
        let rest = line
            .strip_prefix("**")?
            .strip_prefix(key)?
            .strip_prefix(":**")?;
        Some(unescape_text(trim_padding(rest)))
    })
}

/// Key of a `**Key:** value` line.
pub fn field_key(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("**")?;
    let end = rest.find(":**")?;
    Some(&rest[..end])
}

// -- Tables -------------------------------------------------------------------

/// Pipe table with raw (unescaped) cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(columns.iter().map(|c| escape_text(c))));
    lines.push(render_row(columns.iter().map(|_| "---".to_string())));
    for row in rows {
        lines.push(render_row(row.iter().map(|c| escape_text(c))));
    }
    lines.join("\n")
}

fn render_row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

/// Parse the first pipe table in `lines`.
///
/// Returns `Ok(None)` when there is no table. The header must have exactly
/// `columns.len()` cells, and so must every row.
pub fn parse_table(section: &str, columns: &[&str], lines: &[&str]) -> Result<Option<Table>> {
    let mut table_lines = lines
        .iter()
        .skip_while(|l| !l.starts_with('|'))
        .take_while(|l| l.starts_with('|'));

    let Some(header_line) = table_lines.next() else {
        return Ok(None);
    };
    let header = split_row(header_line);
    if header.len() != columns.len() {
        return Err(ParseError::TableColumnMismatch {
            section: section.to_string(),
            expected: columns.len(),
            found: header.len(),
            row: header_line.to_string(),
        });
    }
    let header: Vec<String> = header.iter().map(|c| unescape_text(c)).collect();
    if let Some((found, expected)) = header.iter().zip(columns).find(|(h, c)| h != c) {
        return Err(ParseError::InvalidValue {
            section: section.to_string(),
            field: format!("column {}", expected),
            value: found.clone(),
        });
    }

    let mut rows = Vec::new();
    for (index, line) in table_lines.enumerate() {
        let cells = split_row(line);
        if index == 0 && is_separator(&cells) {
            continue;
        }
        if cells.len() != columns.len() {
            return Err(ParseError::TableColumnMismatch {
                section: section.to_string(),
                expected: columns.len(),
                found: cells.len(),
                row: line.to_string(),
            });
        }
        rows.push(cells.iter().map(|c| unescape_text(c)).collect());
    }

    Ok(Some(Table {
        header,
        rows,
    }))
}

/// Split a table row on unescaped pipes, dropping the outer delimiters.
/// Cells keep their escape sequences.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    cells.push(current);

    if line.starts_with('|') {
        cells.remove(0);
    }
    if cells.len() > 1 && cells.last().map_or(false, |c| trim_padding(c).is_empty()) {
        cells.pop();
    }
    cells
        .into_iter()
        .map(|c| trim_padding(&c).to_string())
        .collect()
}

fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            c.contains('-') && c.chars().all(|ch| ch == '-' || ch == ':')
        })
}

// -- Lists --------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub done: bool,
}

pub fn render_checklist(items: &[ChecklistItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mark = if item.done { "x" } else { " " };
            list_line(&format!("- [{}]", mark), &item.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a checklist. Every non-blank line must be a checklist item.
pub fn parse_checklist(section: &str, lines: &[&str]) -> Result<Vec<ChecklistItem>> {
    let mut items = Vec::new();
    for line in lines.iter().filter(|l| !is_blank(l)) {
        let caps = RE_CHECKLIST
            .captures(line)
            .ok_or_else(|| ParseError::MalformedChecklistItem {
                section: section.to_string(),
                line: line.to_string(),
            })?;
        items.push(ChecklistItem {
            text: caps
                .get(2)
                .map(|m| unescape_text(trim_padding(m.as_str())))
                .unwrap_or_default(),
            done: &caps[1] != " ",
        });
    }
    Ok(items)
}

pub fn render_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| list_line("-", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a `-` list. Every non-blank line must be a list item.
pub fn parse_list(section: &str, lines: &[&str]) -> Result<Vec<String>> {
    lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|line| {
            line.strip_prefix('-')
                .filter(|rest| rest.is_empty() || rest.starts_with(' '))
                .map(|rest| unescape_text(trim_padding(rest)))
                .ok_or_else(|| stray_line(section, "list item", line))
        })
        .collect()
}

pub fn render_ordered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| list_line(&format!("{}.", i + 1), item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a numbered list. Every non-blank line must be a list item.
pub fn parse_ordered_list(section: &str, lines: &[&str]) -> Result<Vec<String>> {
    lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|line| {
            let caps = RE_ORDERED
                .captures(line)
                .ok_or_else(|| stray_line(section, "ordered list item", line))?;
            Ok(caps
                .get(2)
                .map(|m| unescape_text(trim_padding(m.as_str())))
                .unwrap_or_default())
        })
        .collect()
}

fn is_blank(line: &str) -> bool {
    trim_padding(line).is_empty()
}

fn stray_line(section: &str, what: &str, line: &str) -> ParseError {
    ParseError::InvalidValue {
        section: section.to_string(),
        field: what.to_string(),
        value: line.to_string(),
    }
}

fn list_line(marker: &str, text: &str) -> String {
    let text = escape_text(text);
    if text.is_empty() {
        marker.to_string()
    } else {
        format!("{} {}", marker, text)
    }
}

// -- Fenced code --------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub language: String,
    pub content: String,
}

/// Render a fenced block whose fence is longer than any backtick run in
/// the content.
pub fn render_fence(language: &str, content: &str) -> String {
    let longest = longest_backtick_run(content);
    let fence = "`".repeat((longest + 1).max(3));
    let info = escape_text(language);
    if content.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{content}\n{fence}")
    }
}

/// Parse the first fenced block in `lines`. Returns `None` when there is
/// no fence or it is never closed.
pub fn parse_fence(lines: &[&str]) -> Option<Fence> {
    let start = lines.iter().position(|l| fence_marker(l).is_some())?;
    let open = lines[start];
    let fence = fence_marker(open)?;
    let language = unescape_text(trim_padding(&open[fence.len()..]));

    let rest = &lines[start + 1..];
    let end = rest.iter().position(|l| *l == fence)?;
    Some(Fence {
        language,
        content: rest[..end].join("\n"),
    })
}

/// Leading backtick run of a line that opens a fence (three or more).
fn fence_marker(line: &str) -> Option<&str> {
    let run = line.len() - line.trim_start_matches('`').len();
    (run >= 3).then(|| &line[..run])
}

fn longest_backtick_run(s: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in s.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_structural_characters() {
        assert_eq!(escape_text("a|b"), "a\\|b");
        assert_eq!(escape_text("**bold**"), "\\*\\*bold\\*\\*");
        assert_eq!(escape_text("# title"), "\\# title");
        assert_eq!(escape_text("- item"), "\\- item");
        assert_eq!(escape_text("a-b#c"), "a-b#c");
    }

    #[test]
    fn escape_whitespace() {
        assert_eq!(escape_text("two\nlines"), "two\\nlines");
        assert_eq!(escape_text(" padded "), "\\spadded\\s");
        assert_eq!(escape_text(" "), "\\s");
        assert_eq!(escape_text("a b"), "a b");
    }

    #[test]
    fn unescape_inverts_escape() {
        for s in [
            "",
            " ",
            "\\",
            "\\n",
            "already \\| escaped",
            "- [x] looks like a checklist",
            "| a | b |",
            "```rust",
            "trailing backslash \\",
            "# heading\n## another",
            "\t tab and space \r\n",
        ] {
            assert_eq!(unescape_text(&escape_text(s)), s, "roundtrip of {:?}", s);
        }
    }

    #[test]
    fn unescape_keeps_unknown_sequences() {
        assert_eq!(unescape_text("C:\\path"), "C:\\path");
        assert_eq!(unescape_text("end\\"), "end\\");
    }

    #[test]
    fn heading_roundtrip() {
        let line = render_heading(3, "Feature 1: Parse # things");
        assert_eq!(line, "### Feature 1: Parse # things");
        assert_eq!(
            match_heading(&line),
            Some(Heading {
                level: 3,
                text: "Feature 1: Parse # things".to_string()
            })
        );
    }

    #[test]
    fn heading_rejects_non_headings() {
        assert_eq!(match_heading("#hashtag"), None);
        assert_eq!(match_heading("####### seven"), None);
        assert_eq!(match_heading("\\# escaped"), None);
    }

    #[test]
    fn sections_nest_by_level() {
        let md = "# Top\nintro\n## A\na body\n### A1\n## B\nb body\n";
        let root = split_sections(md);
        assert_eq!(root.children.len(), 1);
        let top = &root.children[0];
        assert_eq!(top.title, "Top");
        assert_eq!(top.children.len(), 2);
        assert_eq!(top.children[0].title, "A");
        assert_eq!(top.children[0].children[0].title, "A1");
        assert_eq!(top.child("B").map(|s| s.body[0]), Some("b body"));
    }

    #[test]
    fn sections_ignore_headings_in_fences() {
        let md = "## Evidence\n```sh\n# not a heading\n```\n## Next\n";
        let root = split_sections(md);
        assert_eq!(root.children.len(), 2);
        let evidence = &root.children[0];
        assert!(evidence.body.contains(&"# not a heading"));
        assert!(!evidence.prose().contains(&"# not a heading"));
    }

    #[test]
    fn table_roundtrip_with_pipes() {
        let rows = vec![
            vec!["1".to_string(), "a | b".to_string()],
            vec!["2".to_string(), String::new()],
        ];
        let rendered = render_table(&["ID", "Name"], &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        let table = parse_table("T", &["ID", "Name"], &lines).unwrap().unwrap();
        assert_eq!(table.header, vec!["ID", "Name"]);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn table_tolerates_whitespace() {
        let lines = ["|ID|   Name  |", "|:--|--:|", "|  7 |x|"];
        let table = parse_table("T", &["ID", "Name"], &lines).unwrap().unwrap();
        assert_eq!(table.rows, vec![vec!["7".to_string(), "x".to_string()]]);
    }

    #[test]
    fn table_column_mismatch() {
        let lines = ["| ID | Name |", "| --- | --- |", "| 1 | a | extra |"];
        let err = parse_table("Features", &["ID", "Name"], &lines).unwrap_err();
        assert_eq!(
            err,
            ParseError::TableColumnMismatch {
                section: "Features".to_string(),
                expected: 2,
                found: 3,
                row: "| 1 | a | extra |".to_string(),
            }
        );
    }

    #[test]
    fn table_columns_must_match_by_name() {
        let lines = ["| Name | ID |", "| --- | --- |", "| a | 1 |"];
        let err = parse_table("Features", &["ID", "Name"], &lines).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                section: "Features".to_string(),
                field: "column ID".to_string(),
                value: "Name".to_string(),
            }
        );
    }

    #[test]
    fn table_absent() {
        assert_eq!(parse_table("T", &["A"], &["just text"]).unwrap(), None);
    }

    #[test]
    fn checklist_roundtrip() {
        let items = vec![
            ChecklistItem { text: "done".to_string(), done: true },
            ChecklistItem { text: String::new(), done: false },
            ChecklistItem { text: "- [x] nested".to_string(), done: false },
        ];
        let rendered = render_checklist(&items);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(parse_checklist("C", &lines).unwrap(), items);
    }

    #[test]
    fn checklist_malformed() {
        let err = parse_checklist("Caps", &["- [x] ok", "- [?] bad"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedChecklistItem {
                section: "Caps".to_string(),
                line: "- [?] bad".to_string(),
            }
        );
    }

    #[test]
    fn checklist_rejects_other_markers() {
        for line in ["+ [x] plus", "* [ ] star", "a stray paragraph"] {
            let err = parse_checklist("Caps", &["- [x] ok", "", line]).unwrap_err();
            assert!(matches!(err, ParseError::MalformedChecklistItem { line: ref l, .. } if l == line));
        }
    }

    #[test]
    fn lists_reject_stray_lines() {
        let err = parse_list("Strengths", &["- kept", "* hand-written"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                section: "Strengths".to_string(),
                field: "list item".to_string(),
                value: "* hand-written".to_string(),
            }
        );
        assert!(parse_list("Strengths", &["-dash"]).is_err());
        assert!(parse_ordered_list("Actions", &["1. ok", "2) paren"]).is_err());
        assert!(parse_ordered_list("Actions", &["1. ok", "note"]).is_err());
        assert_eq!(parse_list("Strengths", &["", "- a", "  "]).unwrap(), vec!["a"]);
    }

    #[test]
    fn field_keys() {
        assert_eq!(field_key("**Trigger:** load"), Some("Trigger"));
        assert_eq!(field_key("**Empty:**"), Some("Empty"));
        assert_eq!(field_key("1. **Bold:** item"), None);
        assert_eq!(field_key("\\*\\*Not:\\*\\*"), None);
    }

    #[test]
    fn ordered_list_roundtrip() {
        let items = vec!["first".to_string(), "2. second".to_string(), String::new()];
        let rendered = render_ordered_list(&items);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(parse_ordered_list("O", &lines).unwrap(), items);
    }

    #[test]
    fn plain_list_roundtrip() {
        let items = vec!["- dash".to_string(), String::new(), "x".to_string()];
        let rendered = render_list(&items);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(parse_list("L", &lines).unwrap(), items);
    }

    #[test]
    fn field_lookup() {
        let lines = ["**Rating:** Full", "**Ratings:** no", "**Empty:**"];
        assert_eq!(find_field(&lines, "Rating").as_deref(), Some("Full"));
        assert_eq!(find_field(&lines, "Empty").as_deref(), Some(""));
        assert_eq!(find_field(&lines, "Missing"), None);
    }

    #[test]
    fn fence_grows_past_content() {
        let rendered = render_fence("md", "```\ninner\n```");
        assert!(rendered.starts_with("````md\n"));
        let lines: Vec<&str> = rendered.split('\n').collect();
        assert_eq!(
            parse_fence(&lines),
            Some(Fence {
                language: "md".to_string(),
                content: "```\ninner\n```".to_string(),
            })
        );
    }

    #[test]
    fn fence_empty_and_blank_content() {
        for content in ["", "\n", " ", "\n\nx"] {
            let rendered = render_fence("", content);
            let lines: Vec<&str> = rendered.split('\n').collect();
            assert_eq!(parse_fence(&lines).map(|f| f.content), Some(content.to_string()));
        }
    }
}
