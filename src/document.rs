/// Block-level content of one chapter, ready for layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    Quote,
    ListItem,
    Preformatted,
    Image,
    Rule,
    TextInput,
    TextArea,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    pub content_editable: bool,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            content_editable: false,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading(level.clamp(1, 6)), text)
    }

    pub fn content_editable(mut self) -> Self {
        self.content_editable = true;
        self
    }

    /// HTML tag this block was produced from, as reported to hit testing.
    pub fn tag_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Heading(1) => "h1",
            BlockKind::Heading(2) => "h2",
            BlockKind::Heading(3) => "h3",
            BlockKind::Heading(4) => "h4",
            BlockKind::Heading(5) => "h5",
            BlockKind::Heading(_) => "h6",
            BlockKind::Paragraph => "p",
            BlockKind::Quote => "blockquote",
            BlockKind::ListItem => "li",
            BlockKind::Preformatted => "pre",
            BlockKind::Image => "img",
            BlockKind::Rule => "hr",
            BlockKind::TextInput => "input",
            BlockKind::TextArea => "textarea",
        }
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            title: None,
            blocks,
        }
    }

    /// Placeholder shown for chapters that could not be read.
    pub fn unavailable(reason: &str) -> Self {
        Self::new(vec![Block::paragraph(format!(
            "This chapter could not be displayed: {reason}"
        ))])
    }
}
