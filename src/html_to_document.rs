use crate::document::{Block, BlockKind, Document};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::warn;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::cell::RefCell;

/// Stands in for `<br>` while whitespace is collapsed.
const LINE_BREAK: char = '\u{E000}';

/// Converts chapter XHTML into layout blocks.
///
/// Headings, paragraphs, quotes, list items, preformatted text, rules,
/// images and form fields become blocks of their own. Any other container
/// flushes the inline text gathered so far as a paragraph. Elements marked
/// `contenteditable` keep that flag so reading mode can leave them alone.
pub struct HtmlToDocumentConverter {
    show_images: bool,
    whitespace_re: Regex,
}

#[derive(Default)]
struct Walk {
    title: Option<String>,
    blocks: Vec<Block>,
    inline: String,
    /// Kind given to flushed inline text; paragraphs when unset.
    kind: Option<BlockKind>,
}

impl HtmlToDocumentConverter {
    pub fn new(show_images: bool) -> Self {
        Self {
            show_images,
            whitespace_re: Regex::new(r"\s+").expect("Failed to compile whitespace regex"),
        }
    }

    pub fn convert(&self, html: &str) -> Document {
        let dom = match parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
        {
            Ok(dom) => dom,
            Err(e) => {
                warn!("Failed to parse chapter markup: {e}");
                return Document::unavailable("malformed markup");
            }
        };

        let mut walk = Walk::default();
        self.visit(&dom.document, &mut walk);
        self.flush(&mut walk);

        Document {
            title: walk.title,
            blocks: walk.blocks,
        }
    }

    fn visit(&self, node: &Handle, walk: &mut Walk) {
        match node.data {
            NodeData::Text { ref contents } => {
                walk.inline.push_str(&contents.borrow());
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                self.visit_element(name.local.as_ref(), attrs, node, walk);
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.visit(child, walk);
                }
            }
        }
    }

    fn visit_element(
        &self,
        tag: &str,
        attrs: &RefCell<Vec<html5ever::Attribute>>,
        node: &Handle,
        walk: &mut Walk,
    ) {
        if is_content_editable(attrs) {
            self.flush(walk);
            let text = self.text_of(node);
            walk.blocks.push(Block::paragraph(text).content_editable());
            return;
        }

        match tag {
            "head" => {
                if let Some(title) = find_descendant(node, "title") {
                    let title = self.text_of(&title);
                    if !title.is_empty() {
                        walk.title = Some(title);
                    }
                }
            }
            "style" | "script" => {}
            "br" => walk.inline.push(LINE_BREAK),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush(walk);
                let level = tag[1..].parse().unwrap_or(1);
                self.visit_as(BlockKind::Heading(level), node, walk);
            }
            "p" => {
                self.flush(walk);
                for child in node.children.borrow().iter() {
                    self.visit(child, walk);
                }
                self.flush(walk);
            }
            "blockquote" => self.visit_as(BlockKind::Quote, node, walk),
            "li" | "dt" | "dd" => self.visit_as(BlockKind::ListItem, node, walk),
            "pre" => {
                self.flush(walk);
                let mut raw = String::new();
                collect_text(node, &mut raw, '\n');
                let raw = raw.trim_end_matches('\n').to_string();
                if !raw.trim().is_empty() {
                    walk.blocks.push(Block::new(BlockKind::Preformatted, raw));
                }
            }
            "hr" => {
                self.flush(walk);
                walk.blocks.push(Block::new(BlockKind::Rule, ""));
            }
            "img" | "image" => {
                self.flush(walk);
                let src = attr(attrs, "src").or_else(|| attr(attrs, "href"));
                let alt = attr(attrs, "alt").filter(|a| !a.trim().is_empty());
                walk.blocks.push(self.image_block(src.as_deref(), alt));
            }
            "input" => {
                if attr(attrs, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden")) {
                    return;
                }
                self.flush(walk);
                let text = attr(attrs, "value")
                    .or_else(|| attr(attrs, "placeholder"))
                    .unwrap_or_default();
                walk.blocks.push(Block::new(BlockKind::TextInput, text));
            }
            "textarea" => {
                self.flush(walk);
                let mut raw = String::new();
                collect_text(node, &mut raw, '\n');
                walk.blocks
                    .push(Block::new(BlockKind::TextArea, raw.trim().to_string()));
            }
            "html" | "body" | "div" | "section" | "article" | "main" | "header" | "footer"
            | "aside" | "nav" | "figure" | "figcaption" | "table" | "thead" | "tbody"
            | "tr" | "td" | "th" | "ul" | "ol" | "dl" | "center" => {
                self.flush(walk);
                for child in node.children.borrow().iter() {
                    self.visit(child, walk);
                }
                self.flush(walk);
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.visit(child, walk);
                }
            }
        }
    }

    /// Walks the children of a heading, quote or list item. Inline text
    /// inside takes `kind`; nested fields and images stay blocks of their own.
    fn visit_as(&self, kind: BlockKind, node: &Handle, walk: &mut Walk) {
        self.flush(walk);
        let outer = walk.kind.replace(kind);
        for child in node.children.borrow().iter() {
            self.visit(child, walk);
        }
        self.flush(walk);
        walk.kind = outer;
    }

    fn flush(&self, walk: &mut Walk) {
        if walk.inline.is_empty() {
            return;
        }
        let text = self.normalize(&std::mem::take(&mut walk.inline));
        if !text.is_empty() {
            let kind = walk.kind.unwrap_or(BlockKind::Paragraph);
            walk.blocks.push(Block::new(kind, text));
        }
    }

    fn text_of(&self, node: &Handle) -> String {
        let mut raw = String::new();
        collect_text(node, &mut raw, LINE_BREAK);
        self.normalize(&raw)
    }

    fn normalize(&self, raw: &str) -> String {
        let collapsed = self.whitespace_re.replace_all(raw, " ");
        collapsed
            .split(LINE_BREAK)
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn image_block(&self, src: Option<&str>, alt: Option<String>) -> Block {
        let file_name = src
            .map(|s| percent_decode(s.rsplit('/').next().unwrap_or(s)))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "image".to_string());
        let text = if self.show_images {
            format!("[Image: {}]", alt.unwrap_or(file_name))
        } else {
            format!("[Image hidden: {file_name}]")
        };
        Block::new(BlockKind::Image, text)
    }
}

/// Decodes `%XX` escapes in a resource path. Malformed escapes are kept as
/// written.
pub(crate) fn percent_decode(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();

    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hex: Vec<u8> = bytes.by_ref().take(2).collect();
        let decoded = std::str::from_utf8(&hex)
            .ok()
            .filter(|h| h.len() == 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match decoded {
            Some(byte) => out.push(byte),
            None => {
                out.push(b'%');
                out.extend_from_slice(&hex);
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn collect_text(node: &Handle, out: &mut String, line_break: char) {
    match node.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        NodeData::Element { ref name, .. } => match name.local.as_ref() {
            "script" | "style" => {}
            "br" => out.push(line_break),
            _ => {
                for child in node.children.borrow().iter() {
                    collect_text(child, out, line_break);
                }
            }
        },
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out, line_break);
            }
        }
    }
}

fn find_descendant(node: &Handle, tag: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if let NodeData::Element { ref name, .. } = child.data {
            if name.local.as_ref() == tag {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_descendant(child, tag) {
            return Some(found);
        }
    }
    None
}

fn attr(attrs: &RefCell<Vec<html5ever::Attribute>>, name: &str) -> Option<String> {
    attrs
        .borrow()
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| attr.value.to_string())
}

fn is_content_editable(attrs: &RefCell<Vec<html5ever::Attribute>>) -> bool {
    attr(attrs, "contenteditable").is_some_and(|value| !value.eq_ignore_ascii_case("false"))
}
