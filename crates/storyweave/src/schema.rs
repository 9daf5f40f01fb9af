//! Content-type field schemas.
//!
//! A library describes its parameters as a tree of [`Field`]s: `group`
//! fields hold nested `fields`, `list` fields describe their items through a
//! single `field`. [`Field::flatten`] walks such a tree lazily and reports the
//! parameter path of every field, so a value found through the schema can be
//! written back into the parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const GROUP: &str = "group";
const LIST: &str = "list";

/// One schema field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<Box<Field>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    common: bool,

    /// Every other schema property (`label`, `default`, ...).
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Field {
    /// Creates a `group` field holding `fields`.
    pub fn group(name: Option<&str>, fields: Vec<Field>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: Some(GROUP.to_string()),
            fields,
            ..Self::default()
        }
    }

    /// Creates a field of the given type (builder entry point).
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Marks the field as common to every instance of the library.
    pub fn with_common(mut self, common: bool) -> Self {
        self.common = common;
        self
    }

    /// Sets the item field of a `list`.
    pub fn with_item(mut self, field: Field) -> Self {
        self.field = Some(Box::new(field));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_common(&self) -> bool {
        self.common
    }

    /// Value of a schema property by its JSON name.
    pub fn property(&self, property: &str) -> Option<Value> {
        match property {
            "name" => self.name.clone().map(Value::String),
            "type" => self.kind.clone().map(Value::String),
            "common" => Some(Value::Bool(self.common)),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Walks this field and everything nested in it, parents first.
    pub fn flatten(&self) -> Flatten<'_> {
        Flatten {
            stack: vec![(self, Vec::new())],
        }
    }

    /// Flattened fields matching `filters`, combined with `combine`.
    pub fn filter<'a>(
        &'a self,
        filters: &'a [Filter],
        combine: Combine,
    ) -> impl Iterator<Item = FlatField<'a>> + 'a {
        self.flatten()
            .filter(move |flat| combine.matches(flat.field, filters))
    }

    /// Direct children to descend into, with the path they live under.
    fn nested(&self, path: &[String]) -> Vec<(&Field, Vec<String>)> {
        let mut own_path = path.to_vec();
        own_path.extend(self.name.clone());

        match self.kind.as_deref() {
            Some(GROUP) => self
                .fields
                .iter()
                .map(|field| (field, own_path.clone()))
                .collect(),
            Some(LIST) => match &self.field {
                Some(item) => {
                    let mut item_path = own_path;
                    item_path.extend(item.name.clone());
                    item.fields
                        .iter()
                        .map(|field| (field, item_path.clone()))
                        .collect()
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// A field together with the parameter path of the object that holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatField<'a> {
    pub field: &'a Field,
    pub path: Vec<String>,
}

/// Lazy depth-first walk over a field tree. Created by [`Field::flatten`].
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    stack: Vec<(&'a Field, Vec<String>)>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = FlatField<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (field, path) = self.stack.pop()?;
        self.stack.extend(field.nested(&path).into_iter().rev());
        Some(FlatField { field, path })
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    Equal,
    NotEqual,
}

/// Compares one schema property with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    property: String,
    value: Value,
    comparison: Comparison,
}

impl Filter {
    /// Matches fields whose `property` equals `value`.
    pub fn equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            comparison: Comparison::Equal,
        }
    }

    /// Matches fields whose `property` differs from `value`, including fields
    /// without that property.
    pub fn not_equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            comparison: Comparison::NotEqual,
            ..Self::equal(property, value)
        }
    }

    pub fn matches(&self, field: &Field) -> bool {
        let equal = field.property(&self.property).as_ref() == Some(&self.value);
        match self.comparison {
            Comparison::Equal => equal,
            Comparison::NotEqual => !equal,
        }
    }
}

/// How several filters are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    /// At least one filter matches.
    #[default]
    Any,
    /// Every filter matches.
    All,
}

impl Combine {
    fn matches(self, field: &Field, filters: &[Filter]) -> bool {
        match self {
            Self::Any => filters.iter().any(|filter| filter.matches(field)),
            Self::All => filters.iter().all(|filter| filter.matches(field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> Field {
        let fields: Vec<Field> = serde_json::from_value(json!([
            {"name": "text", "type": "text", "label": "Text"},
            {
                "name": "l10n",
                "type": "group",
                "common": true,
                "fields": [
                    {"name": "next", "type": "text", "default": "Next"},
                    {"name": "size", "type": "number"}
                ]
            },
            {
                "name": "items",
                "type": "list",
                "field": {
                    "name": "item",
                    "type": "group",
                    "fields": [{"name": "label", "type": "text"}]
                }
            }
        ]))
        .unwrap();
        Field::group(None, fields)
    }

    fn names<'a>(fields: impl Iterator<Item = FlatField<'a>>) -> Vec<(String, Vec<String>)> {
        fields
            .map(|flat| (flat.field.name().unwrap_or("").to_string(), flat.path))
            .collect()
    }

    #[test]
    fn test_flatten_reports_paths() {
        let schema = schema();

        assert_eq!(
            names(schema.flatten()),
            vec![
                (String::new(), vec![]),
                ("text".to_string(), vec![]),
                ("l10n".to_string(), vec![]),
                ("next".to_string(), vec!["l10n".to_string()]),
                ("size".to_string(), vec!["l10n".to_string()]),
                ("items".to_string(), vec![]),
                ("label".to_string(), vec!["items".to_string(), "item".to_string()]),
            ]
        );
    }

    #[test]
    fn test_filter_any_and_all() {
        let schema = schema();
        let filters = [Filter::equal("type", "text"), Filter::equal("name", "size")];

        let any: Vec<_> = names(schema.filter(&filters, Combine::Any))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(any, vec!["text", "next", "size", "label"]);

        assert_eq!(schema.filter(&filters, Combine::All).count(), 0);
    }

    #[test]
    fn test_filter_on_extra_property_and_not_equal() {
        let schema = schema();

        let defaults = [Filter::equal("default", "Next")];
        assert_eq!(names(schema.filter(&defaults, Combine::Any))[0].0, "next");

        let not_text = [Filter::not_equal("type", "text")];
        assert_eq!(schema.filter(&not_text, Combine::Any).count(), 4);
    }

    #[test]
    fn test_common_flag() {
        let schema = schema();
        let common = [Filter::equal("common", true)];
        let found: Vec<_> = schema.filter(&common, Combine::Any).collect();

        assert_eq!(found.len(), 1);
        assert!(found[0].field.is_common());
        assert_eq!(found[0].field.fields().len(), 2);
    }

    #[test]
    fn test_roundtrip_keeps_extra_properties() {
        let field = Field::new("next", "text").with_common(true);
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value, json!({"name": "next", "type": "text", "common": true}));
        let list = Field::new("items", "list").with_item(Field::group(Some("item"), vec![field]));
        assert_eq!(list.flatten().count(), 2);
    }
}
