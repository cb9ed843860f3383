// src/core/argument.rs

//! The lexical slices of typed input and their structural variants.
//!
//! Every argument keeps the exact `prefix`, `text` and `suffix` it was sliced
//! from, so `prefix + source + suffix` always reconstructs the original input.
//! `text` is the value with escapes resolved; `source` is what was typed.
//! Composite variants (merged, named, array) keep their leaves so the engine
//! can trace any assignment back to the characters the user typed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARG_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an argument instance. Clones share the id, so the requisition
/// can find a leaf in its argument list the way one would compare references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgId(u64);

impl ArgId {
    fn next() -> Self {
        Self(NEXT_ARG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which assignment owns an argument. A weak, non-owning back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The command assignment (`paramIndex = -1`).
    Command,
    /// A parameter assignment, by declaration index.
    Param(usize),
    /// The n-th unassigned argument.
    Unassigned(usize),
}

/// The structural variant of an argument.
#[derive(Debug, Clone)]
pub enum ArgumentKind {
    /// A placeholder for a parameter the user has not typed anything for.
    Blank,
    /// One lexical token.
    Simple,
    /// A contiguous run of arguments joined into one.
    Merged(Vec<Argument>),
    /// A `--name value` pair. The value is absent when the name ended the input.
    Named {
        name: Box<Argument>,
        value: Option<Box<Argument>>,
    },
    /// A boolean flag that is present.
    TrueNamed(Box<Argument>),
    /// A boolean flag that is absent. Contributes nothing to the input.
    FalseNamed,
    /// The arguments collected for one array parameter.
    Array(Vec<Argument>),
}

/// A lexical slice of typed input.
#[derive(Debug, Clone)]
pub struct Argument {
    id: ArgId,
    text: String,
    /// The typed form of `text` when escapes make the two differ.
    raw: Option<String>,
    prefix: String,
    suffix: String,
    kind: ArgumentKind,
    owner: Option<Slot>,
}

/// Options for [`Argument::beget`].
#[derive(Debug, Clone, Default)]
pub struct BegetOptions {
    /// The replacement text.
    pub text: Option<String>,
    /// Never wrap the text in quotes, even if it contains spaces.
    pub dont_quote: bool,
    /// Ensure the prefix starts with a space.
    pub prefix_space: bool,
    /// Ensure the suffix ends with a space.
    pub suffix_space: bool,
}

impl Argument {
    fn build(text: String, prefix: String, suffix: String, kind: ArgumentKind) -> Self {
        Self {
            id: ArgId::next(),
            text,
            raw: None,
            prefix,
            suffix,
            kind,
            owner: None,
        }
    }

    /// Creates a simple argument.
    pub fn new(
        text: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self::build(text.into(), prefix.into(), suffix.into(), ArgumentKind::Simple)
    }

    /// A simple argument whose typed form differs from its value, e.g.
    /// `a\ b` for the text `a b`.
    pub fn escaped(
        text: impl Into<String>,
        source: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self::new(text, prefix, suffix).with_raw(Some(source.into()))
    }

    fn with_raw(mut self, raw: Option<String>) -> Self {
        self.raw = raw.filter(|raw| *raw != self.text);
        self
    }

    /// An argument standing for "nothing typed".
    pub fn blank() -> Self {
        Self::build(String::new(), String::new(), String::new(), ArgumentKind::Blank)
    }

    /// Joins a contiguous run of arguments. The prefix of the first and the suffix
    /// of the last are kept outside; everything in between becomes text.
    pub fn merged(args: Vec<Argument>) -> Self {
        let (text, source, prefix, suffix) = match (args.first(), args.last()) {
            (Some(first), Some(last)) => {
                let mut text = String::new();
                let mut source = String::new();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        text.push_str(&arg.prefix);
                        source.push_str(&arg.prefix);
                    }
                    text.push_str(&arg.text);
                    source.push_str(arg.source());
                    if i + 1 < args.len() {
                        text.push_str(&arg.suffix);
                        source.push_str(&arg.suffix);
                    }
                }
                (text, source, first.prefix.clone(), last.suffix.clone())
            }
            _ => (String::new(), String::new(), String::new(), String::new()),
        };
        Self::build(text, prefix, suffix, ArgumentKind::Merged(args)).with_raw(Some(source))
    }

    /// Pairs a name token (`--foo`) with its value token.
    pub fn named(name: Argument, value: Option<Argument>) -> Self {
        let (text, raw, prefix, suffix) = match &value {
            Some(value) => (
                value.text.clone(),
                value.raw.clone(),
                format!("{}{}", name, value.prefix),
                value.suffix.clone(),
            ),
            None => (String::new(), None, name.to_string(), String::new()),
        };
        Self::build(
            text,
            prefix,
            suffix,
            ArgumentKind::Named {
                name: Box::new(name),
                value: value.map(Box::new),
            },
        )
        .with_raw(raw)
    }

    /// A present boolean flag.
    pub fn true_named(arg: Argument) -> Self {
        let (text, raw) = (arg.text.clone(), arg.raw.clone());
        let (prefix, suffix) = (arg.prefix.clone(), arg.suffix.clone());
        Self::build(text, prefix, suffix, ArgumentKind::TrueNamed(Box::new(arg))).with_raw(raw)
    }

    /// An absent boolean flag.
    pub fn false_named() -> Self {
        Self::build(String::new(), String::new(), String::new(), ArgumentKind::FalseNamed)
    }

    /// A collection of arguments for an array parameter.
    pub fn array(args: Vec<Argument>) -> Self {
        Self::build(String::new(), String::new(), String::new(), ArgumentKind::Array(args))
    }

    pub fn id(&self) -> ArgId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text as it was typed, escapes included.
    pub fn source(&self) -> &str {
        self.raw.as_deref().unwrap_or(&self.text)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn kind(&self) -> &ArgumentKind {
        &self.kind
    }

    /// The assignment this argument was last assigned to.
    pub fn owner(&self) -> Option<Slot> {
        self.owner
    }

    pub fn is_blank_kind(&self) -> bool {
        matches!(self.kind, ArgumentKind::Blank)
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, ArgumentKind::Named { .. })
    }

    /// True when nothing but whitespace was typed.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.prefix.trim().is_empty() && self.suffix.trim().is_empty()
    }

    pub(crate) fn append_suffix(&mut self, extra: &str) {
        self.suffix.push_str(extra);
    }

    pub(crate) fn prepend_prefix(&mut self, extra: &str) {
        self.prefix.insert_str(0, extra);
    }

    /// Adds an argument to an array argument. Ignored for other variants.
    pub fn push(&mut self, arg: Argument) {
        if let ArgumentKind::Array(args) = &mut self.kind {
            args.push(arg);
        }
    }

    /// Adds several arguments to an array argument.
    pub fn extend(&mut self, more: impl IntoIterator<Item = Argument>) {
        if let ArgumentKind::Array(args) = &mut self.kind {
            args.extend(more);
        }
    }

    /// The elements of an array argument, or nothing for other variants.
    pub fn elements(&self) -> &[Argument] {
        match &self.kind {
            ArgumentKind::Array(args) => args,
            _ => &[],
        }
    }

    /// Simple concatenation with the following argument. Whatever lies between the
    /// two texts becomes part of the merged text.
    pub fn merge(&self, following: &Argument) -> Argument {
        let between = format!("{}{}", self.suffix, following.prefix);
        Argument::escaped(
            format!("{}{}{}", self.text, between, following.text),
            format!("{}{}{}", self.source(), between, following.source()),
            self.prefix.clone(),
            following.suffix.clone(),
        )
    }

    /// The leaf arguments as they appear in the tokenized input.
    pub fn get_args(&self) -> Vec<&Argument> {
        match &self.kind {
            ArgumentKind::Blank | ArgumentKind::Simple => vec![self],
            ArgumentKind::Merged(args) => args.iter().flat_map(Argument::get_args).collect(),
            ArgumentKind::Named { name, value } => {
                let mut leaves = name.get_args();
                if let Some(value) = value {
                    leaves.extend(value.get_args());
                }
                leaves
            }
            ArgumentKind::TrueNamed(arg) => arg.get_args(),
            ArgumentKind::FalseNamed => Vec::new(),
            ArgumentKind::Array(args) => args.iter().flat_map(Argument::get_args).collect(),
        }
    }

    /// Marks this argument and all its parts as owned by `slot`.
    pub fn assign(&mut self, slot: Slot) {
        self.owner = Some(slot);
        match &mut self.kind {
            ArgumentKind::Blank | ArgumentKind::Simple | ArgumentKind::FalseNamed => {}
            ArgumentKind::Merged(args) | ArgumentKind::Array(args) => {
                args.iter_mut().for_each(|arg| arg.assign(slot));
            }
            ArgumentKind::Named { name, value } => {
                name.assign(slot);
                if let Some(value) = value {
                    value.assign(slot);
                }
            }
            ArgumentKind::TrueNamed(arg) => arg.assign(slot),
        }
    }

    /// Creates a replacement argument that keeps this argument's padding.
    /// Text containing spaces (or empty text) is quoted unless already quoted
    /// or `dont_quote` is set.
    ///
    /// The text is in typed form, escapes included, as `Type::stringify`
    /// produces it. Without new text the typed form of this argument is kept.
    pub fn beget(&self, options: BegetOptions) -> Argument {
        let text = options.text.unwrap_or_else(|| self.source().to_string());
        let mut prefix = self.prefix.clone();
        let mut suffix = self.suffix.clone();

        if !options.dont_quote {
            let needs_quote = text.contains(' ') || text.is_empty();
            let has_quote = prefix.ends_with('\'') || prefix.ends_with('"');
            if needs_quote && !has_quote {
                prefix.push('\'');
                suffix.insert(0, '\'');
            }
        }
        if options.prefix_space && !prefix.starts_with(' ') {
            prefix.insert(0, ' ');
        }
        if options.suffix_space && !suffix.ends_with(' ') {
            suffix.push(' ');
        }

        match &self.kind {
            ArgumentKind::Named { name, .. } => {
                // Keep the name token, replace only the value.
                let value_prefix = prefix
                    .strip_prefix(name.to_string().as_str())
                    .map_or_else(|| " ".to_string(), str::to_string);
                Argument::named(
                    (**name).clone(),
                    Some(Argument::new(text, value_prefix, suffix)),
                )
            }
            _ => Argument::new(text, prefix, suffix),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ArgumentKind::Array(args) => {
                // Debug rendering only; arrays have no text of their own.
                let parts: Vec<String> = args.iter().map(Argument::to_string).collect();
                write!(f, "{{{}}}", parts.join(","))
            }
            _ => write!(f, "{}{}{}", self.prefix, self.source(), self.suffix),
        }
    }
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(&other.kind)
            && self.text == other.text
            && self.source() == other.source()
            && self.prefix == other.prefix
            && self.suffix == other.suffix
            && match (&self.kind, &other.kind) {
                (ArgumentKind::Array(a), ArgumentKind::Array(b)) => a == b,
                _ => true,
            }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_round_trip() {
        let arg = Argument::new("hello", "  ", " ");
        assert_eq!(arg.to_string(), "  hello ");
        assert_eq!(arg.get_args().len(), 1);
    }

    #[test]
    fn test_merged_keeps_inner_padding() {
        let args = vec![
            Argument::new("a", " ", ""),
            Argument::new("b", "  ", ""),
            Argument::new("c", "'", "' "),
        ];
        let merged = Argument::merged(args);
        assert_eq!(merged.text(), "a  b'c");
        assert_eq!(merged.prefix(), " ");
        assert_eq!(merged.suffix(), "' ");
        assert_eq!(merged.to_string(), " a  b'c' ");
        assert_eq!(merged.get_args().len(), 3);
    }

    #[test]
    fn test_merge_pair() {
        let a = Argument::new("pref", "", "");
        let b = Argument::new("set", " ", " ");
        let merged = a.merge(&b);
        assert_eq!(merged.text(), "pref set");
        assert_eq!(merged.to_string(), "pref set ");
    }

    #[test]
    fn test_named_argument() {
        let name = Argument::new("--size", " ", "");
        let value = Argument::new("5", " ", "");
        let named = Argument::named(name, Some(value));
        assert_eq!(named.text(), "5");
        assert_eq!(named.prefix(), " --size ");
        assert_eq!(named.to_string(), " --size 5");
        assert_eq!(named.get_args().len(), 2);

        let dangling = Argument::named(Argument::new("--size", " ", ""), None);
        assert_eq!(dangling.text(), "");
        assert_eq!(dangling.to_string(), " --size");
        assert_eq!(dangling.get_args().len(), 1);
    }

    #[test]
    fn test_boolean_variants() {
        let flag = Argument::true_named(Argument::new("--verbose", " ", ""));
        assert_eq!(flag.to_string(), " --verbose");
        assert_eq!(flag.get_args().len(), 1);

        let absent = Argument::false_named();
        assert_eq!(absent.to_string(), "");
        assert!(absent.get_args().is_empty());
    }

    #[test]
    fn test_array_flattens_leaves() {
        let mut array = Argument::array(Vec::new());
        array.push(Argument::new("x", " ", ""));
        array.extend(vec![
            Argument::new("y", " ", ""),
            Argument::named(Argument::new("--n", " ", ""), Some(Argument::new("z", " ", ""))),
        ]);
        assert_eq!(array.elements().len(), 3);
        assert_eq!(array.get_args().len(), 4);
        assert_eq!(array.to_string(), "{ x, y, --n z}");
    }

    #[test]
    fn test_beget_quotes_spaces() {
        let arg = Argument::new("a", " ", "");
        let replaced = arg.beget(BegetOptions {
            text: Some("a b".to_string()),
            ..Default::default()
        });
        assert_eq!(replaced.to_string(), " 'a b'");

        let empty = Argument::blank().beget(BegetOptions {
            text: Some(String::new()),
            prefix_space: true,
            ..Default::default()
        });
        assert_eq!(empty.to_string(), " ''");

        let unquoted = arg.beget(BegetOptions {
            text: Some("pref set".to_string()),
            dont_quote: true,
            suffix_space: true,
            ..Default::default()
        });
        assert_eq!(unquoted.to_string(), " pref set ");
    }

    #[test]
    fn test_escaped_source_survives_composites() {
        // --- Setup ---
        let escaped = Argument::escaped("a b", "a\\ b", " ", "");

        // --- Execute ---
        let merged = Argument::merged(vec![Argument::new("x", "", ""), escaped.clone()]);
        let named = Argument::named(Argument::new("--n", " ", ""), Some(escaped.clone()));
        let same = escaped.beget(BegetOptions {
            suffix_space: true,
            ..Default::default()
        });

        // --- Assert ---
        assert_eq!(escaped.text(), "a b");
        assert_eq!(escaped.to_string(), " a\\ b");
        assert_eq!(merged.text(), "x a b");
        assert_eq!(merged.to_string(), "x a\\ b");
        assert_eq!(named.text(), "a b");
        assert_eq!(named.to_string(), " --n a\\ b");
        assert_eq!(same.to_string(), " 'a\\ b' ");
        assert_eq!(Argument::escaped("x", "x", "", "").source(), "x");
    }

    #[test]
    fn test_beget_named_keeps_name() {
        let named = Argument::named(
            Argument::new("--size", " ", ""),
            Some(Argument::new("5", " ", "")),
        );
        let replaced = named.beget(BegetOptions {
            text: Some("6".to_string()),
            ..Default::default()
        });
        assert!(replaced.is_named());
        assert_eq!(replaced.to_string(), " --size 6");
    }

    #[test]
    fn test_equality_ignores_identity() {
        let a = Argument::new("x", " ", "");
        let b = Argument::new("x", " ", "");
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_ne!(a, Argument::true_named(b.clone()));
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_assign_marks_leaves() {
        let mut named = Argument::named(
            Argument::new("--size", " ", ""),
            Some(Argument::new("5", " ", "")),
        );
        named.assign(Slot::Param(2));
        assert!(named.get_args().iter().all(|a| a.owner() == Some(Slot::Param(2))));
    }

    #[test]
    fn test_is_blank() {
        assert!(Argument::new("", "  ", " ").is_blank());
        assert!(!Argument::new("", "'", "").is_blank());
        assert!(Argument::blank().is_blank_kind());
    }
}
