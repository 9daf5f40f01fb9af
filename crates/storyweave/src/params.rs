//! Walking content parameters.
//!
//! Node parameters are arbitrary JSON documents that may embed further
//! content (`{"library": "H5P.Image 1.1", "params": {...}}`) at any depth.
//! The iterators here walk such documents lazily and depth first, visiting
//! an object before anything nested inside it.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;

const LIBRARY_KEY: &str = "library";
const PARAMS_KEY: &str = "params";

/// Iterator over the distinct `library` strings of a parameter document.
///
/// Created by [`library_names`]. Each call to [`library_names`] starts a
/// fresh walk from the top of the document.
#[derive(Debug, Clone)]
pub struct LibraryNames<'a> {
    seed: Option<&'a str>,
    stack: Vec<&'a Value>,
    seen: HashSet<&'a str>,
}

/// Walks `params` for every distinct `library` string.
///
/// # Examples
///
/// ```
/// # use serde_json::json;
/// # use storyweave::params::library_names;
/// let params = json!({
///     "content": [
///         {"library": "H5P.Text 1.1", "params": {}},
///         {"library": "H5P.Image 1.1", "params": {"library": "H5P.Text 1.1"}}
///     ]
/// });
///
/// let names: Vec<_> = library_names(&params)
///     .with_seed("H5P.BranchingScenario 1.0")
///     .collect();
/// assert_eq!(names, ["H5P.BranchingScenario 1.0", "H5P.Text 1.1", "H5P.Image 1.1"]);
/// ```
pub fn library_names(params: &Value) -> LibraryNames<'_> {
    LibraryNames {
        seed: None,
        stack: vec![params],
        seen: HashSet::new(),
    }
}

impl<'a> LibraryNames<'a> {
    /// Yields `library` first, as the library owning the whole document.
    pub fn with_seed(mut self, library: &'a str) -> Self {
        self.seed = Some(library);
        self
    }
}

impl<'a> Iterator for LibraryNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(seed) = self.seed.take() {
            self.seen.insert(seed);
            return Some(seed);
        }

        while let Some(value) = self.stack.pop() {
            push_nested(&mut self.stack, value);
            if let Some(library) = value.get(LIBRARY_KEY).and_then(Value::as_str) {
                if self.seen.insert(library) {
                    return Some(library);
                }
            }
        }
        None
    }
}

/// Pushes the containers nested in `value` so that they pop in document order.
fn push_nested<'a>(stack: &mut Vec<&'a Value>, value: &'a Value) {
    let start = stack.len();
    match value {
        Value::Object(map) => stack.extend(map.values().filter(|child| is_container(child))),
        Value::Array(items) => stack.extend(items.iter().filter(|child| is_container(child))),
        _ => {}
    }
    stack[start..].reverse();
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Iterator over the string values stored under one key anywhere in a
/// parameter document. Created by [`translation_texts`].
#[derive(Debug, Clone)]
pub struct TranslationTexts<'a> {
    key: &'a str,
    stack: Vec<&'a Value>,
    found: VecDeque<&'a str>,
}

/// Walks `params` for every string stored under `key`.
///
/// Used to guess the current translation of a schema field from existing
/// content; the first value is usually the one that matters.
pub fn translation_texts<'a>(params: &'a Value, key: &'a str) -> TranslationTexts<'a> {
    TranslationTexts {
        key,
        stack: vec![params],
        found: VecDeque::new(),
    }
}

impl<'a> Iterator for TranslationTexts<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(text) = self.found.pop_front() {
                return Some(text);
            }
            let value = self.stack.pop()?;
            if let Value::Object(map) = value {
                if let Some(Value::String(text)) = map.get(self.key) {
                    self.found.push_back(text);
                }
            }
            push_nested(&mut self.stack, value);
        }
    }
}

/// Returns the parameters of the first sub-content using `library`.
///
/// The document itself is checked before anything nested in it.
pub fn sub_params<'a>(params: &'a Value, library: &str) -> Option<&'a Value> {
    if is_sub_content_of(params, library) {
        return params.get(PARAMS_KEY);
    }
    match params {
        Value::Object(map) => map.values().find_map(|child| sub_params(child, library)),
        Value::Array(items) => items.iter().find_map(|child| sub_params(child, library)),
        _ => None,
    }
}

/// Mutable variant of [`sub_params`].
pub fn sub_params_mut<'a>(params: &'a mut Value, library: &str) -> Option<&'a mut Value> {
    if is_sub_content_of(params, library) {
        return params.get_mut(PARAMS_KEY);
    }
    match params {
        Value::Object(map) => map
            .values_mut()
            .find_map(|child| sub_params_mut(child, library)),
        Value::Array(items) => items
            .iter_mut()
            .find_map(|child| sub_params_mut(child, library)),
        _ => None,
    }
}

fn is_sub_content_of(params: &Value, library: &str) -> bool {
    params.get(LIBRARY_KEY).and_then(Value::as_str) == Some(library)
        && params.get(PARAMS_KEY).is_some_and(|params| !params.is_null())
}

/// Stores `value` under `name` in the object reached by following `path`
/// from `root`.
///
/// Path segments index objects by key and arrays by position. Returns
/// `false`, leaving the document untouched, if the path does not lead to an
/// object.
pub fn set_at_path(root: &mut Value, path: &[String], name: &str, value: Value) -> bool {
    let mut current = root;
    for segment in path {
        let next = match current {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index)),
            _ => None,
        };
        match next {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        Value::Object(map) => {
            map.insert(name.to_string(), value);
            true
        }
        _ => false,
    }
}
