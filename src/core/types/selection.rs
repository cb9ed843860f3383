// src/core/types/selection.rs

//! Selection over a named set of values, and the matching logic shared with
//! the boolean and command types.

use super::{ParseContext, Type, TypeError, TypeKind};
use crate::{
    constants::MAX_CORRECTION_DISTANCE,
    core::{
        argument::Argument,
        conversion::{Conversion, Prediction, Status},
    },
    models::TypeSpecDetail,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    borrow::Cow,
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, OnceLock},
};

/// One named option of a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
}

impl Lookup {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }
}

pub type LookupFn = Arc<dyn Fn(&ParseContext) -> Vec<Lookup> + Send + Sync>;
pub type LookupFuture = Pin<Box<dyn Future<Output = Vec<Lookup>> + Send>>;
pub type LoaderFn = Arc<dyn Fn() -> LookupFuture + Send + Sync>;

// --- DEFERRED LOOKUPS ---

/// A lookup list fetched asynchronously. Loaded once, then cached for every
/// clone of the handle.
#[derive(Clone)]
pub struct DeferredLookup {
    loader: LoaderFn,
    cache: Arc<OnceLock<Vec<Lookup>>>,
}

impl fmt::Debug for DeferredLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLookup")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl DeferredLookup {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Lookup>> + Send + 'static,
    {
        Self {
            loader: Arc::new(move || Box::pin(loader()) as LookupFuture),
            cache: Arc::new(OnceLock::new()),
        }
    }

    /// The loaded list, if loading has finished.
    pub fn get(&self) -> Option<&[Lookup]> {
        self.cache.get().map(Vec::as_slice)
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Runs the loader unless a previous load already filled the cache.
    pub async fn load(&self) {
        if self.is_loaded() {
            return;
        }
        let lookups = (self.loader)().await;
        log::debug!("Deferred lookup loaded {} option(s)", lookups.len());
        // A concurrent load may have won the race; either result is fine.
        let _ = self.cache.set(lookups);
    }
}

/// Where a selection gets its options from.
#[derive(Clone)]
pub enum LookupSource {
    Static(Vec<Lookup>),
    /// Computed from the parse context on every use, or once when cached.
    Dynamic {
        func: LookupFn,
        cache: Option<Arc<OnceLock<Vec<Lookup>>>>,
    },
    Deferred(DeferredLookup),
}

impl fmt::Debug for LookupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(lookups) => f.debug_tuple("Static").field(lookups).finish(),
            Self::Dynamic { cache, .. } => f
                .debug_struct("Dynamic")
                .field("cached", &cache.is_some())
                .finish(),
            Self::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
        }
    }
}

impl LookupSource {
    /// The options, or `None` while a deferred source is still loading.
    pub fn resolve(&self, ctx: &ParseContext) -> Option<Cow<'_, [Lookup]>> {
        match self {
            Self::Static(lookups) => Some(Cow::Borrowed(lookups.as_slice())),
            Self::Dynamic {
                func,
                cache: Some(cache),
            } => Some(Cow::Borrowed(cache.get_or_init(|| func(ctx)).as_slice())),
            Self::Dynamic { func, cache: None } => Some(Cow::Owned(func(ctx))),
            Self::Deferred(deferred) => deferred.get().map(Cow::Borrowed),
        }
    }
}

// --- SHARED MATCHING ---

/// Ranks the options against the typed text: exact match first, then prefix
/// matches, then (when few prefixes matched) infix matches. Matching ignores
/// case; only an exact, same-case name makes a selection VALID.
///
/// An argument that already has a suffix (the user moved on) only matches
/// exactly.
pub fn find_predictions(lookup: &[Lookup], arg: &Argument, max: usize) -> Vec<Prediction> {
    let text = arg.text().to_lowercase();
    let text = text.as_str();
    let lowered: Vec<(String, &Lookup)> = lookup.iter().map(|l| (l.name.to_lowercase(), l)).collect();
    let to_prediction = |l: &Lookup| Prediction {
        name: l.name.clone(),
        value: l.value.clone(),
        description: l.description.clone(),
        incomplete: false,
    };

    let mut predictions: Vec<Prediction> = lowered
        .iter()
        .filter(|(name, _)| name == text)
        .take(1)
        .map(|(_, l)| to_prediction(l))
        .collect();
    if !arg.suffix().is_empty() {
        return predictions;
    }

    predictions.extend(
        lowered
            .iter()
            .filter(|(name, _)| name != text && name.starts_with(text))
            .map(|(_, l)| to_prediction(l)),
    );

    if predictions.len() < max / 2 {
        predictions.extend(
            lowered
                .iter()
                .filter(|(name, _)| !name.starts_with(text) && name.contains(text))
                .map(|(_, l)| to_prediction(l)),
        );
    }

    predictions.truncate(max);
    predictions
}

/// Options within a small edit distance of the typed text, closest first.
pub fn find_corrections(lookup: &[Lookup], text: &str, max: usize) -> Vec<Prediction> {
    let mut scored: Vec<(usize, &Lookup)> = lookup
        .iter()
        .map(|l| (strsim::levenshtein(text, &l.name), l))
        .filter(|(distance, _)| *distance <= MAX_CORRECTION_DISTANCE)
        .collect();
    scored.sort_by_key(|(distance, _)| *distance);
    scored
        .into_iter()
        .take(max)
        .map(|(_, l)| Prediction {
            name: l.name.clone(),
            value: l.value.clone(),
            description: l.description.clone(),
            incomplete: false,
        })
        .collect()
}

/// The message for text that matches nothing.
pub(crate) fn no_match_message(text: &str, corrections: &[Prediction]) -> String {
    match corrections.first() {
        Some(best) => format!("Can't use '{}'. Did you mean '{}'?", text, best.name),
        None => format!("Can't use '{}'.", text),
    }
}

/// Converts an argument against a list of options.
///
/// # Logic:
/// - Exact name -> VALID with that option's value.
/// - Some prefix/infix matches -> INCOMPLETE, no value.
/// - Nothing -> ERROR, with "did you mean" corrections as predictions.
pub fn parse_selection(lookup: &[Lookup], arg: &Argument, max: usize) -> Conversion {
    let predictions = find_predictions(lookup, arg, max);

    if let Some(exact) = predictions.iter().find(|p| p.name == arg.text()) {
        let value = exact.value.clone();
        return Conversion::new(value, arg.clone(), Status::Valid, "", predictions);
    }

    if !predictions.is_empty() {
        return Conversion::new(Value::Null, arg.clone(), Status::Incomplete, "", predictions);
    }

    let corrections = find_corrections(lookup, arg.text(), max);
    let message = no_match_message(arg.text(), &corrections);
    Conversion::new(Value::Null, arg.clone(), Status::Error, message, corrections)
}

fn loading(arg: &Argument) -> Conversion {
    Conversion::new(
        Value::Null,
        arg.clone(),
        Status::Incomplete,
        "Loading options…",
        Vec::new(),
    )
}

// --- SELECTION TYPE ---

#[derive(Debug, Clone)]
pub struct SelectionType {
    name: String,
    source: LookupSource,
}

impl SelectionType {
    /// Options whose names are their own values.
    pub fn from_data(data: Vec<String>) -> Self {
        let lookups = data
            .into_iter()
            .map(|name| {
                let value = Value::String(name.clone());
                Lookup::new(name, value)
            })
            .collect();
        Self::from_lookup(lookups)
    }

    pub fn from_lookup(lookups: Vec<Lookup>) -> Self {
        Self {
            name: "selection".to_string(),
            source: LookupSource::Static(lookups),
        }
    }

    /// Options computed from the parse context. With `cacheable`, the function
    /// runs only once.
    pub fn dynamic(func: LookupFn, cacheable: bool) -> Self {
        Self {
            name: "selection".to_string(),
            source: LookupSource::Dynamic {
                func,
                cache: cacheable.then(|| Arc::new(OnceLock::new())),
            },
        }
    }

    /// Options fetched by an async loader.
    pub fn deferred<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Lookup>> + Send + 'static,
    {
        Self {
            name: "selection".to_string(),
            source: LookupSource::Deferred(DeferredLookup::new(loader)),
        }
    }

    /// Test hook: serves a static list through the deferred path, so the
    /// async resolution code runs even without a real loader.
    pub fn force_deferred(mut self, enabled: bool) -> Self {
        if let (true, LookupSource::Static(lookups)) = (enabled, &self.source) {
            let lookups = lookups.clone();
            self.source = LookupSource::Deferred(DeferredLookup::new(move || {
                let lookups = lookups.clone();
                async move { lookups }
            }));
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn from_spec(spec: &TypeSpecDetail) -> Result<Self, TypeError> {
        if let Some(data) = &spec.data {
            return Ok(Self::from_data(data.clone()));
        }
        if let Some(entries) = &spec.lookup {
            let lookups = entries
                .iter()
                .map(|entry| Lookup {
                    name: entry.name.clone(),
                    value: entry
                        .value
                        .clone()
                        .unwrap_or_else(|| Value::String(entry.name.clone())),
                    description: entry.description.clone(),
                })
                .collect();
            return Ok(Self::from_lookup(lookups));
        }
        Err(TypeError::MissingField {
            name: spec.name.clone(),
            field: "data",
        })
    }

    pub fn source(&self) -> &LookupSource {
        &self.source
    }

    /// The current options, or `None` while they are loading.
    pub fn lookups(&self, ctx: &ParseContext) -> Option<Vec<Lookup>> {
        self.source.resolve(ctx).map(Cow::into_owned)
    }

    fn position(lookup: &[Lookup], value: &Value) -> Option<usize> {
        lookup.iter().position(|l| &l.value == value)
    }
}

impl Type for SelectionType {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Selection
    }

    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        match self.source.resolve(ctx) {
            Some(lookup) => parse_selection(&lookup, arg, ctx.max_predictions),
            None => loading(arg),
        }
    }

    fn stringify(&self, value: &Value, ctx: &ParseContext) -> String {
        if value.is_null() {
            return String::new();
        }
        let named = self.source.resolve(ctx).and_then(|lookup| {
            lookup
                .iter()
                .find(|l| &l.value == value)
                .map(|l| l.name.clone())
        });
        named.unwrap_or_else(|| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    // "Decrement" moves forward through the list and "increment" backward.
    // Key bindings depend on this direction.
    fn decrement(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        let lookup = self.source.resolve(ctx)?;
        if lookup.is_empty() {
            return None;
        }
        let index = Self::position(&lookup, value).unwrap_or(0) + 1;
        let index = if index >= lookup.len() { 0 } else { index };
        lookup.get(index).map(|l| l.value.clone())
    }

    fn increment(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        let lookup = self.source.resolve(ctx)?;
        if lookup.is_empty() {
            return None;
        }
        // Starting from nothing lands on the first option.
        let index = Self::position(&lookup, value).unwrap_or(1);
        let index = index.checked_sub(1).unwrap_or(lookup.len() - 1);
        lookup.get(index).map(|l| l.value.clone())
    }

    fn get_blank(&self, ctx: &ParseContext) -> Conversion {
        let arg = Argument::blank();
        match self.source.resolve(ctx) {
            Some(lookup) => {
                let predictions = find_predictions(&lookup, &arg, ctx.max_predictions);
                Conversion::new(Value::Null, arg, Status::Incomplete, "", predictions)
            }
            None => loading(&arg),
        }
    }

    fn pending_lookups(&self, _ctx: &ParseContext) -> Vec<DeferredLookup> {
        match &self.source {
            LookupSource::Deferred(deferred) if !deferred.is_loaded() => vec![deferred.clone()],
            _ => Vec::new(),
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn colors() -> SelectionType {
        SelectionType::from_data(vec![
            "red".to_string(),
            "green".to_string(),
            "blue".to_string(),
        ])
    }

    fn arg(text: &str) -> Argument {
        Argument::new(text, "", "")
    }

    fn names(conversion: &Conversion) -> Vec<&str> {
        conversion
            .predictions
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    #[test]
    fn test_exact_prefix_and_error() {
        let ctx = ParseContext::default();
        let colors = colors();

        let partial = colors.parse(&arg("gr"), &ctx);
        assert_eq!(partial.status(), Status::Incomplete);
        assert_eq!(names(&partial), vec!["green"]);
        assert!(partial.value.is_null());

        let exact = colors.parse(&arg("green"), &ctx);
        assert_eq!(exact.status(), Status::Valid);
        assert_eq!(exact.value, json!("green"));

        let wrong = colors.parse(&arg("purple"), &ctx);
        assert_eq!(wrong.status(), Status::Error);
        assert_eq!(wrong.message, "Can't use 'purple'.");
    }

    #[test]
    fn test_corrections_for_typos() {
        let ctx = ParseContext::default();
        let conversion = colors().parse(&arg("gren"), &ctx);
        assert_eq!(conversion.status(), Status::Error);
        assert_eq!(names(&conversion), vec!["green"]);
        assert!(conversion.message.contains("Did you mean 'green'?"));
    }

    #[test]
    fn test_infix_matches_follow_prefix_matches() {
        let ctx = ParseContext::default();
        let selection = SelectionType::from_data(vec![
            "bread".to_string(),
            "rebar".to_string(),
            "read".to_string(),
        ]);
        let conversion = selection.parse(&arg("re"), &ctx);
        assert_eq!(names(&conversion), vec!["rebar", "read", "bread"]);
    }

    #[test]
    fn test_matching_ignores_case() {
        let ctx = ParseContext::default();
        let colors = colors();

        let shouted = colors.parse(&arg("GR"), &ctx);
        assert_eq!(shouted.status(), Status::Incomplete);
        assert_eq!(names(&shouted), vec!["green"]);

        // Only the exact spelling is accepted as a value.
        let capitalized = colors.parse(&arg("Blue"), &ctx);
        assert_eq!(capitalized.status(), Status::Incomplete);
        assert_eq!(names(&capitalized), vec!["blue"]);
        assert!(capitalized.value.is_null());
    }

    #[test]
    fn test_suffix_forces_exact_match() {
        let ctx = ParseContext::default();
        let conversion = colors().parse(&Argument::new("gr", "", " "), &ctx);
        assert_eq!(conversion.status(), Status::Error);
    }

    #[test]
    fn test_blank_predicts_everything() {
        let ctx = ParseContext::default();
        let blank = colors().get_blank(&ctx);
        assert_eq!(blank.status(), Status::Incomplete);
        assert_eq!(names(&blank), vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_lookup_values_and_stringify() {
        let ctx = ParseContext::default();
        let numbers =
            SelectionType::from_lookup(vec![Lookup::new("one", json!(1)), Lookup::new("two", json!(2))]);
        assert_eq!(numbers.parse(&arg("two"), &ctx).value, json!(2));
        assert_eq!(numbers.stringify(&json!(1), &ctx), "one");
        assert_eq!(numbers.stringify(&Value::Null, &ctx), "");
    }

    #[test]
    fn test_inverted_stepping() {
        let ctx = ParseContext::default();
        let colors = colors();

        // --- Execute & Assert: decrement walks forward ---
        assert_eq!(colors.decrement(&json!("red"), &ctx), Some(json!("green")));
        assert_eq!(colors.decrement(&json!("blue"), &ctx), Some(json!("red")));
        assert_eq!(colors.decrement(&Value::Null, &ctx), Some(json!("green")));

        // --- Execute & Assert: increment walks backward ---
        assert_eq!(colors.increment(&json!("green"), &ctx), Some(json!("red")));
        assert_eq!(colors.increment(&json!("red"), &ctx), Some(json!("blue")));
        assert_eq!(colors.increment(&Value::Null, &ctx), Some(json!("red")));
    }

    #[test]
    fn test_dynamic_source_sees_context() {
        let func: LookupFn = Arc::new(|ctx: &ParseContext| {
            ctx.values
                .keys()
                .map(|k| Lookup::new(k.clone(), json!(k)))
                .collect()
        });
        let selection = SelectionType::dynamic(func, false);
        let mut values = serde_json::Map::new();
        values.insert("alpha".to_string(), json!(1));
        let ctx = ParseContext::with_values(values, 10);
        assert_eq!(selection.parse(&arg("alpha"), &ctx).status(), Status::Valid);
        assert_eq!(
            selection.parse(&arg("alpha"), &ParseContext::default()).status(),
            Status::Error
        );
    }

    #[test]
    fn test_cached_dynamic_source_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let func: LookupFn = Arc::new(move |_: &ParseContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![Lookup::new("x", json!("x"))]
        });
        let selection = SelectionType::dynamic(func, true);
        let ctx = ParseContext::default();
        selection.parse(&arg("x"), &ctx);
        selection.parse(&arg("x"), &ctx);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deferred_source_loads_then_parses() {
        let ctx = ParseContext::default();
        let colors = colors().force_deferred(true);

        let before = colors.parse(&arg("red"), &ctx);
        assert_eq!(before.status(), Status::Incomplete);
        assert_eq!(before.message, "Loading options…");

        let pending = colors.pending_lookups(&ctx);
        assert_eq!(pending.len(), 1);
        for lookup in &pending {
            lookup.load().await;
        }

        assert!(colors.pending_lookups(&ctx).is_empty());
        assert_eq!(colors.parse(&arg("red"), &ctx).status(), Status::Valid);
    }
}
