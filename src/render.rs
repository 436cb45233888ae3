//! Markdown rendering for report chunks.
//!
//! Three renditions are produced from the same Markdown: HTML (for saving),
//! plain text (what a reader would select and copy), and terminal text with
//! ANSI emphasis.

use colored::*;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// One report chunk in every rendition the console needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub markdown: String,
    pub html: String,
    pub plain: String,
}

impl RenderedReport {
    pub fn from_markdown(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            html: render_html(markdown),
            plain: render_plain(markdown),
        }
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render Markdown to an HTML fragment.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render Markdown to plain text: markup stripped, blocks on their own lines,
/// list markers kept.
pub fn render_plain(markdown: &str) -> String {
    TextWriter::new(false).write(markdown)
}

/// Render Markdown for a terminal, with ANSI styling for headings, emphasis
/// and code.
pub fn render_terminal(markdown: &str) -> String {
    TextWriter::new(true).write(markdown)
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dt", "dd", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section",
    "table", "tr", "ul",
];

/// Lowercased element name of a tag body such as `/div` or `br /`. Empty for
/// comments and declarations.
fn html_tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[derive(Default, Clone, Copy)]
struct Emphasis {
    heading: bool,
    strong: bool,
    italic: bool,
    strike: bool,
    code_block: bool,
}

struct TextWriter {
    ansi: bool,
    out: String,
    // One counter per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    at_item_start: bool,
    emphasis: Emphasis,
}

impl TextWriter {
    fn new(ansi: bool) -> Self {
        Self {
            ansi,
            out: String::new(),
            lists: Vec::new(),
            at_item_start: false,
            emphasis: Emphasis::default(),
        }
    }

    fn write(mut self, markdown: &str) -> String {
        for event in Parser::new_ext(markdown, options()) {
            self.event(event);
        }
        self.out.trim_end().to_string()
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                self.at_item_start = false;
                if self.ansi {
                    self.out.push_str(&code.yellow().to_string());
                } else {
                    self.out.push_str(&code);
                }
            }
            Event::SoftBreak => self.out.push(' '),
            Event::HardBreak => self.out.push('\n'),
            Event::Rule => {
                self.block_break();
                self.out.push_str("---\n");
            }
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked { "[x] " } else { "[ ] " });
            }
            Event::Html(raw) | Event::InlineHtml(raw) => self.raw_html(&raw),
            _ => {}
        }
    }

    /// Keep only the text between tags. `<br>` becomes a newline and block
    /// tags start a new line.
    fn raw_html(&mut self, raw: &str) {
        let mut rest = raw;
        while !rest.is_empty() {
            let Some(open) = rest.find('<') else {
                self.html_text(rest);
                break;
            };
            self.html_text(&rest[..open]);
            let Some(close) = rest[open..].find('>') else {
                self.html_text(&rest[open..]);
                break;
            };
            let name = html_tag_name(&rest[open + 1..open + close]);
            if name == "br" {
                self.out.push('\n');
            } else if BLOCK_TAGS.contains(&name.as_str()) {
                self.line_break();
            }
            rest = &rest[open + close + 1..];
        }
    }

    fn html_text(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.line_break();
            }
            if !line.trim().is_empty() {
                self.text(line);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.block_break();
                self.emphasis.heading = true;
            }
            Tag::Paragraph => {
                if !self.at_item_start {
                    self.block_break();
                }
            }
            Tag::BlockQuote(_) | Tag::Table(_) | Tag::HtmlBlock => self.block_break(),
            Tag::CodeBlock(kind) => {
                self.block_break();
                self.emphasis.code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if self.ansi && !lang.is_empty() {
                        self.out.push_str(&format!("[{lang}]").dimmed().to_string());
                        self.out.push('\n');
                    }
                }
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.block_break();
                } else {
                    self.line_break();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.line_break();
                let depth = self.lists.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.out.push_str(&marker);
                self.at_item_start = true;
            }
            Tag::Strong => self.emphasis.strong = true,
            Tag::Emphasis => self.emphasis.italic = true,
            Tag::Strikethrough => self.emphasis.strike = true,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.emphasis.heading = false;
                self.line_break();
            }
            TagEnd::Paragraph | TagEnd::BlockQuote(..) | TagEnd::Item | TagEnd::HtmlBlock => {
                self.line_break()
            }
            TagEnd::CodeBlock => {
                self.emphasis.code_block = false;
                self.line_break();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.line_break();
            }
            TagEnd::TableCell => self.out.push('\t'),
            TagEnd::TableHead | TagEnd::TableRow => {
                if self.out.ends_with('\t') {
                    self.out.pop();
                }
                self.out.push('\n');
            }
            TagEnd::Strong => self.emphasis.strong = false,
            TagEnd::Emphasis => self.emphasis.italic = false,
            TagEnd::Strikethrough => self.emphasis.strike = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        self.at_item_start = false;
        if !self.ansi {
            self.out.push_str(text);
            return;
        }
        let e = self.emphasis;
        let mut styled = text.normal();
        if e.heading {
            styled = styled.bright_cyan().bold();
        }
        if e.strong {
            styled = styled.bold();
        }
        if e.italic {
            styled = styled.italic();
        }
        if e.strike {
            styled = styled.strikethrough();
        }
        if e.code_block {
            styled = styled.yellow();
        }
        self.out.push_str(&styled.to_string());
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_html_heading_and_emphasis() {
        let html = render_html("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_render_html_table() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_render_plain_blocks() {
        let plain = render_plain("# Title\n\nSome *text* here.\n\n- one\n- two\n");
        assert_eq!(plain, "Title\n\nSome text here.\n\n- one\n- two");
    }

    #[test]
    fn test_render_plain_ordered_list_numbers_from_start() {
        let plain = render_plain("3. c\n4. d\n");
        assert_eq!(plain, "3. c\n4. d");
    }

    #[test]
    fn test_render_plain_nested_list() {
        let plain = render_plain("- a\n  - b\n- c\n");
        assert_eq!(plain, "- a\n  - b\n- c");
    }

    #[test]
    fn test_render_plain_link_keeps_text() {
        let plain = render_plain("See [the source](https://example.com).");
        assert_eq!(plain, "See the source.");
    }

    #[test]
    fn test_render_plain_code_block_verbatim() {
        let plain = render_plain("Intro\n\n```rust\nfn main() {}\n```\n");
        assert_eq!(plain, "Intro\n\nfn main() {}");
    }

    #[test]
    fn test_render_plain_soft_break_is_space() {
        assert_eq!(render_plain("one\ntwo"), "one two");
    }

    #[test]
    fn test_render_plain_table_rows() {
        let plain = render_plain("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(plain, "a\tb\n1\t2");
    }

    #[test]
    fn test_render_plain_strips_inline_and_block_html() {
        let plain = render_plain("Hello <b>world</b><br>\n\n<div>\nblock\n</div>\n");
        assert_eq!(plain, "Hello world\n\nblock");
        assert!(!plain.contains('<'));
    }

    #[test]
    fn test_render_plain_html_comment_dropped() {
        assert_eq!(render_plain("Kept <!-- hidden --> text"), "Kept  text");
    }

    #[test]
    fn test_render_html_keeps_raw_html() {
        assert!(render_html("Hello <b>world</b>").contains("<b>world</b>"));
    }

    #[test]
    fn test_html_tag_name() {
        assert_eq!(html_tag_name("/DIV"), "div");
        assert_eq!(html_tag_name("br /"), "br");
        assert_eq!(html_tag_name("!-- note --"), "");
    }

    #[test]
    fn test_render_plain_empty() {
        assert_eq!(render_plain(""), "");
    }

    #[test]
    fn test_render_terminal_keeps_words() {
        let out = render_terminal("## Findings\n\n**Bold** claim with `code`.");
        assert!(out.contains("Findings"));
        assert!(out.contains("Bold"));
        assert!(out.contains("code"));
    }

    #[test]
    fn test_rendered_report_fills_all_fields() {
        let r = RenderedReport::from_markdown("# A");
        assert_eq!(r.markdown, "# A");
        assert!(r.html.contains("<h1>A</h1>"));
        assert_eq!(r.plain, "A");
    }
}
