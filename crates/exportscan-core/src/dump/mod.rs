//! Line classification and block location for `aapt dump xmltree` output.
//!
//! The dump is not XML. Every line announces one node, and nesting is
//! encoded only by leading whitespace:
//!
//! ```text
//! N: android=http://schemas.android.com/apk/res/android
//!   E: manifest (line=2)
//!     E: application (line=12)
//!       E: activity (line=20)
//!         A: android:name(0x01010003)="com.example.MainActivity" (Raw: "com.example.MainActivity")
//!         A: android:exported(0x01010010)=(type 0x12)0xffffffff
//!         E: intent-filter (line=24)
//!           E: action (line=25)
//!             A: android:name(0x01010003)="android.intent.action.MAIN" (Raw: "android.intent.action.MAIN")
//! ```
//!
//! ## Algorithm Overview
//!
//! 1. Classify every line once ([`DumpLine`]) and keep them in an
//!    index-addressed array
//! 2. Walk the array with a small state machine (`Outside`,
//!    `InApplication`, `InComponent`) to cut out component [`Block`]s
//! 3. Inside a block, locate nested children (`intent-filter`, `data`)
//!    with the same span rule one level deeper
//!
//! A line that ends a block is never consumed by it: the walker keeps its
//! cursor in place and re-examines the line in the next state.

mod attribute;

use tracing::trace;

pub use attribute::{is_hex_value_true, Attribute, AttributeValue, HexValue, HEX_TRUE};

/// Element that encloses every component declaration
pub const APPLICATION_TAG: &str = "application";

/// Prefix announcing an element line
const ELEMENT_MARKER: &str = "E: ";

/// Prefix announcing an attribute line
const ATTRIBUTE_MARKER: &str = "A: ";

/// Prefix announcing a namespace line
const NAMESPACE_MARKER: &str = "N: ";

/// What a single dump line announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `E: <tag> ...` structural node
    Element {
        /// Element tag, e.g. `activity`
        tag: &'a str,
    },
    /// `A: <ns>:<attr>...=...` key/value attached to the preceding element
    Attribute {
        /// Everything after the `A: ` marker
        body: &'a str,
    },
    /// `N: <prefix>=<uri>` namespace declaration
    Namespace,
    /// Whitespace only
    Blank,
    /// Anything else (`C:` text nodes, wrapped continuation text)
    Text,
}

/// One classified line of the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpLine<'a> {
    /// Zero-based line number in the original text
    pub number: usize,
    /// Count of leading whitespace characters
    pub indent: usize,
    /// The line without its trailing whitespace
    pub raw: &'a str,
    /// Classification of the line
    pub kind: LineKind<'a>,
}

impl<'a> DumpLine<'a> {
    /// Classifies a single line
    pub fn classify(number: usize, line: &'a str) -> Self {
        let raw = line.trim_end();
        let content = raw.trim_start_matches(|c: char| c == ' ' || c == '\t');
        let indent = raw.len() - content.len();

        let kind = if content.is_empty() {
            LineKind::Blank
        } else if let Some(rest) = content.strip_prefix(ELEMENT_MARKER) {
            let tag = rest.split_whitespace().next().unwrap_or("");
            LineKind::Element { tag }
        } else if let Some(body) = content.strip_prefix(ATTRIBUTE_MARKER) {
            LineKind::Attribute { body }
        } else if content.starts_with(NAMESPACE_MARKER) {
            LineKind::Namespace
        } else {
            LineKind::Text
        };

        Self {
            number,
            indent,
            raw,
            kind,
        }
    }

    /// Returns true if this line announces an element of any tag
    pub fn is_any_element(&self) -> bool {
        matches!(self.kind, LineKind::Element { .. })
    }

    /// Returns true if this line announces an element with exactly this tag
    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self.kind, LineKind::Element { tag: t } if t == tag)
    }

    /// Returns true if this line is whitespace only
    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }

    /// Parses the attribute carried by this line, if it is an attribute line
    pub fn attribute(&self) -> Option<Attribute<'a>> {
        match self.kind {
            LineKind::Attribute { body } => Attribute::parse(body),
            _ => None,
        }
    }

    /// Returns true if this line still belongs to a block whose first line
    /// sits at `start_indent`
    fn continues_block(&self, start_indent: usize) -> bool {
        self.is_blank()
            || self.indent > start_indent
            || (self.indent == start_indent && !self.is_any_element())
    }

    /// Returns true if this line closes a container opened at `indent`
    fn closes_container(&self, indent: usize) -> bool {
        self.is_any_element() && self.indent <= indent
    }
}

/// A classified dump, ready for block location
#[derive(Debug, Clone)]
pub struct Dump<'a> {
    lines: Vec<DumpLine<'a>>,
}

impl<'a> Dump<'a> {
    /// Classifies every line of the dump text
    pub fn parse(text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(number, line)| DumpLine::classify(number, line))
            .collect();
        Self { lines }
    }

    /// Returns the classified lines
    pub fn lines(&self) -> &[DumpLine<'a>] {
        &self.lines
    }

    /// Locates every block that starts with a `tag` element inside the
    /// `application` element
    ///
    /// Blocks are returned in source order and never nest. No filtering is
    /// applied here; callers decide which blocks are meaningful.
    pub fn application_children(&self, tag: &str) -> Vec<Block<'_, 'a>> {
        let lines = self.lines.as_slice();
        let mut blocks = Vec::new();
        let mut state = WalkState::Outside;
        let mut cursor = 0;

        while cursor < lines.len() {
            let line = &lines[cursor];

            match state {
                WalkState::Outside => {
                    if line.is_element(APPLICATION_TAG) {
                        trace!("application opens at line {}", line.number);
                        state = WalkState::InApplication {
                            indent: line.indent,
                        };
                    }
                    cursor += 1;
                }
                WalkState::InApplication { indent } => {
                    if line.closes_container(indent) {
                        trace!("application closes at line {}", line.number);
                        state = WalkState::Outside;
                        continue;
                    }
                    if line.is_element(tag) && line.indent > indent {
                        state = WalkState::InComponent {
                            application_indent: indent,
                            start: cursor,
                        };
                    }
                    cursor += 1;
                }
                WalkState::InComponent {
                    application_indent,
                    start,
                } => {
                    let restarts = line.is_element(tag) && line.indent > application_indent;
                    if restarts || !line.continues_block(lines[start].indent) {
                        blocks.push(Block::new(&lines[start..cursor]));
                        state = WalkState::InApplication {
                            indent: application_indent,
                        };
                        continue;
                    }
                    cursor += 1;
                }
            }
        }

        if let WalkState::InComponent { start, .. } = state {
            blocks.push(Block::new(&lines[start..]));
        }

        blocks
    }
}

/// States of the top-level walk
#[derive(Debug, Clone, Copy)]
enum WalkState {
    Outside,
    InApplication {
        indent: usize,
    },
    InComponent {
        application_indent: usize,
        start: usize,
    },
}

/// The lines of one element, including all of its nested children
#[derive(Debug, Clone, Copy)]
pub struct Block<'d, 'a> {
    lines: &'d [DumpLine<'a>],
}

impl<'d, 'a> Block<'d, 'a> {
    fn new(lines: &'d [DumpLine<'a>]) -> Self {
        debug_assert!(!lines.is_empty());
        Self { lines }
    }

    /// Returns the lines of this block, starting with its element line
    pub fn lines(&self) -> &'d [DumpLine<'a>] {
        self.lines
    }

    /// Returns the element line that opens this block
    pub fn head(&self) -> &'d DumpLine<'a> {
        &self.lines[0]
    }

    /// Indentation of the opening element line
    pub fn indent(&self) -> usize {
        self.head().indent
    }

    /// Zero-based line number of the opening element line
    pub fn line_number(&self) -> usize {
        self.head().number
    }

    /// Returns true if any nested line announces a `tag` element
    pub fn contains_element(&self, tag: &str) -> bool {
        self.lines[1..].iter().any(|line| line.is_element(tag))
    }

    /// Locates nested `tag` children of this block
    ///
    /// Uses the same span rule as the top-level walk: a child continues
    /// while lines are more indented than its opening line, are blank, or
    /// are same-indentation non-element text. A new `tag` line always
    /// starts a new child.
    pub fn children(&self, tag: &str) -> Vec<Block<'d, 'a>> {
        let parent_indent = self.indent();
        let lines = &self.lines[1..];
        let mut children = Vec::new();
        let mut start: Option<usize> = None;
        let mut cursor = 0;

        while cursor < lines.len() {
            let line = &lines[cursor];
            let opens = line.is_element(tag) && line.indent > parent_indent;

            match start {
                Some(begin) => {
                    if opens || !line.continues_block(lines[begin].indent) {
                        children.push(Block::new(&lines[begin..cursor]));
                        start = None;
                        continue;
                    }
                }
                None => {
                    if opens {
                        start = Some(cursor);
                    }
                }
            }
            cursor += 1;
        }

        if let Some(begin) = start {
            children.push(Block::new(&lines[begin..]));
        }

        children
    }

    /// Iterates over the attributes found anywhere in this block
    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'a>> + 'd {
        self.lines.iter().filter_map(|line| line.attribute())
    }

    /// Finds the first string-form value of `namespace:local` in this block
    pub fn string_attribute(&self, namespace: &str, local: &str) -> Option<&'a str> {
        self.attributes()
            .filter(|attr| attr.is_named(namespace, local))
            .find_map(|attr| attr.value.as_str())
    }

    /// Finds the first typed hex value of `namespace:local` in this block
    pub fn hex_attribute(&self, namespace: &str, local: &str) -> Option<HexValue<'a>> {
        self.attributes()
            .filter(|attr| attr.is_named(namespace, local))
            .find_map(|attr| attr.value.as_hex())
    }

    /// Resolves a boolean attribute, string form first, then hex form
    ///
    /// The string form is true only for the exact text `true`; the hex
    /// form only for the exact literal `0xffffffff`.
    pub fn flag_attribute(&self, namespace: &str, local: &str) -> Option<Flag> {
        if let Some(text) = self.string_attribute(namespace, local) {
            return Some(Flag::String(text == "true"));
        }
        self.hex_attribute(namespace, local)
            .map(|hex| Flag::Hex(is_hex_value_true(hex.literal)))
    }
}

/// A resolved boolean attribute and the encoding it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Read from a quoted string value
    String(bool),
    /// Read from a typed hex literal
    Hex(bool),
}

impl Flag {
    /// The resolved boolean
    pub fn value(self) -> bool {
        match self {
            Flag::String(v) | Flag::Hex(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
N: android=http://schemas.android.com/apk/res/android
  E: manifest (line=2)
    A: package=\"com.example\" (Raw: \"com.example\")
    E: activity (line=5)
      A: android:name(0x01010003)=\"com.example.Outside\" (Raw: \"com.example.Outside\")
    E: application (line=8)
      A: android:label(0x01010001)=@0x7f0f001b
      E: activity (line=10)
        A: android:name(0x01010003)=\"com.example.First\" (Raw: \"com.example.First\")
        E: intent-filter (line=12)
          E: action (line=13)
            A: android:name(0x01010003)=\"android.intent.action.MAIN\" (Raw: \"android.intent.action.MAIN\")

      E: service (line=16)
        A: android:name(0x01010003)=\"com.example.Sync\" (Raw: \"com.example.Sync\")
      E: activity (line=18)
        A: android:name(0x01010003)=\"com.example.Second\" (Raw: \"com.example.Second\")
      E: activity-alias (line=20)
        A: android:name(0x01010003)=\"com.example.Alias\" (Raw: \"com.example.Alias\")
    E: uses-permission (line=22)
      E: activity (line=23)
        A: android:name(0x01010003)=\"com.example.AfterApplication\" (Raw: \"com.example.AfterApplication\")
";

    fn names(blocks: &[Block<'_, '_>]) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|b| b.string_attribute("android", "name"))
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_classify_lines() {
        let element = DumpLine::classify(0, "    E: activity (line=5)");
        assert_eq!(element.indent, 4);
        assert!(element.is_element("activity"));
        assert!(!element.is_element("activity-alias"));

        let attr = DumpLine::classify(1, "\t\tA: android:name(0x01010003)=\"x\"  ");
        assert_eq!(attr.indent, 2);
        assert!(matches!(attr.kind, LineKind::Attribute { .. }));
        assert_eq!(attr.raw, "\t\tA: android:name(0x01010003)=\"x\"");

        assert!(DumpLine::classify(2, "   ").is_blank());
        assert_eq!(DumpLine::classify(3, "N: android=uri").kind, LineKind::Namespace);
        assert_eq!(DumpLine::classify(4, "  C: \"text\"").kind, LineKind::Text);
    }

    #[test]
    fn test_only_application_children_are_located() {
        let dump = Dump::parse(DUMP);
        let activities = dump.application_children("activity");
        assert_eq!(names(&activities), vec!["com.example.First", "com.example.Second"]);
    }

    #[test]
    fn test_block_spans_nested_lines_and_blank_lines() {
        let dump = Dump::parse(DUMP);
        let activities = dump.application_children("activity");
        let first = activities[0];
        assert_eq!(first.line_number(), 7);
        // head, name, intent-filter, action, action name, blank line
        assert_eq!(first.lines().len(), 6);
        assert!(first.contains_element("intent-filter"));
        assert!(!activities[1].contains_element("intent-filter"));
    }

    #[test]
    fn test_sibling_element_closes_block() {
        let dump = Dump::parse(DUMP);
        let services = dump.application_children("service");
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].lines().len(), 2);
    }

    #[test]
    fn test_adjacent_blocks_do_not_merge() {
        let text = "\
E: application (line=1)
  E: receiver (line=2)
    A: android:name(0x01010003)=\"a.One\"
  E: receiver (line=3)
    A: android:name(0x01010003)=\"a.Two\"
";
        let dump = Dump::parse(text);
        let receivers = dump.application_children("receiver");
        assert_eq!(names(&receivers), vec!["a.One", "a.Two"]);
    }

    #[test]
    fn test_deeper_block_start_force_closes_previous() {
        let text = "\
E: application (line=1)
  E: provider (line=2)
    A: android:name(0x01010003)=\"a.Outer\"
    E: provider (line=3)
      A: android:name(0x01010003)=\"a.Inner\"
";
        let dump = Dump::parse(text);
        let providers = dump.application_children("provider");
        assert_eq!(names(&providers), vec!["a.Outer", "a.Inner"]);
        assert_eq!(providers[0].lines().len(), 2);
    }

    #[test]
    fn test_lower_indented_text_closes_component_but_not_application() {
        let text = "\
    E: application (line=1)
      E: service (line=2)
        A: android:name(0x01010003)=\"a.First\"
  C: \"stray\"
      E: service (line=4)
        A: android:name(0x01010003)=\"a.Second\"
";
        let dump = Dump::parse(text);
        let services = dump.application_children("service");
        assert_eq!(names(&services), vec!["a.First", "a.Second"]);
        assert_eq!(services[0].lines().len(), 2);
    }

    #[test]
    fn test_children_of_block() {
        let text = "\
E: application (line=1)
  E: activity (line=2)
    A: android:name(0x01010003)=\"a.Main\"
    E: intent-filter (line=3)
      E: action (line=4)
        A: android:name(0x01010003)=\"a.ONE\"
    E: meta-data (line=5)
      A: android:name(0x01010003)=\"a.meta\"
    E: intent-filter (line=6)
      E: action (line=7)
        A: android:name(0x01010003)=\"a.TWO\"
";
        let dump = Dump::parse(text);
        let activity = dump.application_children("activity")[0];
        let filters = activity.children("intent-filter");
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].lines().len(), 3);
        assert_eq!(filters[1].lines().len(), 3);
        assert!(activity.children("data").is_empty());
    }

    #[test]
    fn test_flag_attribute_prefers_string_form() {
        let text = "\
E: application (line=1)
  E: activity (line=2)
    A: android:exported(0x01010010)=(type 0x12)0xffffffff
    A: android:exported(0x01010010)=\"false\"
";
        let dump = Dump::parse(text);
        let activity = dump.application_children("activity")[0];
        assert_eq!(
            activity.flag_attribute("android", "exported"),
            Some(Flag::String(false))
        );
        assert_eq!(activity.flag_attribute("android", "enabled"), None);
    }

    #[test]
    fn test_crlf_input() {
        let text = "E: application (line=1)\r\n  E: service (line=2)\r\n    A: android:name(0x01010003)=\"a.Crlf\"\r\n";
        let dump = Dump::parse(text);
        assert_eq!(names(&dump.application_children("service")), vec!["a.Crlf"]);
    }

    #[test]
    fn test_empty_input() {
        let dump = Dump::parse("");
        assert!(dump.lines().is_empty());
        assert!(dump.application_children("activity").is_empty());
    }
}
