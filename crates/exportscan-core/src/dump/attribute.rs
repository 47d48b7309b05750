//! Attribute line parsing.
//!
//! aapt writes the same logical value in one of two encodings:
//!
//! - String form: `android:exported(0x01010010)="true" (Raw: "true")`
//! - Typed form:  `android:exported(0x01010010)=(type 0x12)0xffffffff`
//!
//! Resource references (`=@0x7f0f001b`) and anything else are kept as raw
//! text and never interpreted.

/// The only hex literal that encodes boolean `true`
pub const HEX_TRUE: &str = "0xffffffff";

/// Returns true if a typed hex literal encodes boolean `true`
///
/// This is an exact, case-sensitive comparison against `0xffffffff`.
/// `0x1` and every other value are false.
pub fn is_hex_value_true(literal: &str) -> bool {
    literal == HEX_TRUE
}

/// A parsed `A:` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Namespace prefix (`android`), absent for bare attributes like `package`
    pub namespace: Option<&'a str>,
    /// Local attribute name (`exported`)
    pub local: &'a str,
    /// Resource id between the parentheses, if present
    pub resource_id: Option<&'a str>,
    /// The encoded value
    pub value: AttributeValue<'a>,
}

/// A typed value such as `(type 0x12)0xffffffff`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexValue<'a> {
    /// Type code, e.g. `0x12` for booleans or `0x10` for decimal integers
    pub type_code: &'a str,
    /// The lowercase hex literal including its `0x` prefix
    pub literal: &'a str,
}

impl HexValue<'_> {
    /// Decodes the literal as a 32-bit two's-complement integer
    pub fn as_i32(&self) -> Option<i32> {
        let digits = self.literal.strip_prefix("0x")?;
        u32::from_str_radix(digits, 16).ok().map(|v| v as i32)
    }
}

/// Value of an attribute line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// Quoted string form
    String(&'a str),
    /// Typed hex form
    Hex(HexValue<'a>),
    /// Any other encoding, kept verbatim
    Raw(&'a str),
}

impl<'a> AttributeValue<'a> {
    /// Returns the string-form value
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the typed hex value
    pub fn as_hex(&self) -> Option<HexValue<'a>> {
        match *self {
            AttributeValue::Hex(hex) => Some(hex),
            _ => None,
        }
    }

    fn parse(text: &'a str) -> Self {
        if let Some(quoted) = text.strip_prefix('"') {
            if let Some(end) = quoted.find('"') {
                return AttributeValue::String(&quoted[..end]);
            }
            return AttributeValue::Raw(text);
        }

        if let Some(typed) = text.strip_prefix("(type ") {
            if let Some(close) = typed.find(')') {
                let type_code = typed[..close].trim();
                let tail = &typed[close + 1..];
                if let Some(literal) = leading_hex_literal(tail) {
                    return AttributeValue::Hex(HexValue { type_code, literal });
                }
            }
        }

        AttributeValue::Raw(text)
    }
}

impl<'a> Attribute<'a> {
    /// Parses the body of an attribute line (everything after `A: `)
    ///
    /// Returns `None` when the body has no `=` separating name and value.
    pub fn parse(body: &'a str) -> Option<Self> {
        let name_end = body.find(|c: char| c == '(' || c == '=')?;
        let qualified = &body[..name_end];
        let mut rest = &body[name_end..];

        let mut resource_id = None;
        if let Some(inner) = rest.strip_prefix('(') {
            let close = inner.find(')')?;
            resource_id = Some(&inner[..close]);
            rest = &inner[close + 1..];
        }

        let value_text = rest.strip_prefix('=')?;

        let (namespace, local) = match qualified.split_once(':') {
            Some((ns, local)) => (Some(ns), local),
            None => (None, qualified),
        };

        Some(Self {
            namespace,
            local,
            resource_id,
            value: AttributeValue::parse(value_text),
        })
    }

    /// Returns true if this attribute is `namespace:local`
    pub fn is_named(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace == Some(namespace)
    }
}

/// Extracts a `0x[0-9a-f]+` literal from the start of `text`
fn leading_hex_literal(text: &str) -> Option<&str> {
    let digits = text.strip_prefix("0x")?;
    let len = digits
        .bytes()
        .take_while(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        .count();
    if len == 0 {
        return None;
    }
    Some(&text[..2 + len])
}
