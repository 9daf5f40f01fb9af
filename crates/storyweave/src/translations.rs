//! Discovery of translatable texts.
//!
//! Every library used in a scenario may declare `common` fields: texts such
//! as button labels that are shared by all instances of that library and
//! therefore translated once per scenario. Discovery needs the schema of every
//! library involved; it only produces a result once all of them are known.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use serde_json::Value;

use crate::{
    params::{library_names, set_at_path, sub_params, sub_params_mut, translation_texts},
    schema::{Combine, Field, Filter},
};

/// Source of library field schemas.
pub trait SchemaSource {
    /// Returns the top-level fields of `library`, or `None` while the schema
    /// is not available.
    fn schema(&self, library: &str) -> Option<Vec<Field>>;
}

impl SchemaSource for HashMap<String, Vec<Field>> {
    fn schema(&self, library: &str) -> Option<Vec<Field>> {
        self.get(library).cloned()
    }
}

/// A text field that is shared by all instances of a library.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatableField {
    library: String,
    path: Vec<String>,
    name: String,
    translation: Option<String>,
}

impl TranslatableField {
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Path from the library's parameters to the object holding the text.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current text, guessed from the existing parameters.
    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }
}

/// Translatable fields of one library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryTranslations {
    library: String,
    fields: Vec<TranslatableField>,
}

impl LibraryTranslations {
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn fields(&self) -> &[TranslatableField] {
        &self.fields
    }
}

/// Collects the common text fields of every library used in `params`.
///
/// `seed` names the library owning `params` itself. Returns `None` if the
/// schema of any library is missing; libraries without common text fields
/// are left out of the result.
pub fn discover<S: SchemaSource + ?Sized>(
    source: &S,
    params: &Value,
    seed: Option<&str>,
) -> Option<Vec<LibraryTranslations>> {
    let names = match seed {
        Some(seed) => library_names(params).with_seed(seed).collect::<Vec<_>>(),
        None => library_names(params).collect(),
    };

    let schemas = names
        .iter()
        .map(|library| source.schema(library).map(|fields| (*library, fields)))
        .collect::<Option<Vec<_>>>();
    let Some(schemas) = schemas else {
        debug!(libraries_len = names.len(); "Schemas incomplete, no translations yet");
        return None;
    };

    let common = [Filter::equal("common", true)];
    let text = [Filter::equal("type", "text")];
    let translations: Vec<_> = schemas
        .into_iter()
        .filter_map(|(library, fields)| {
            let root = Field::group(None, fields);
            let current = sub_params(params, library).unwrap_or(params);

            let mut seen = HashSet::new();
            let fields: Vec<_> = root
                .filter(&common, Combine::Any)
                .flat_map(|common_field| {
                    let base = common_field.path;
                    common_field
                        .field
                        .filter(&text, Combine::Any)
                        .map(move |flat| {
                            let mut path = base.clone();
                            path.extend(flat.path);
                            (flat.field, path)
                        })
                })
                .filter_map(|(field, path)| {
                    let name = field.name()?.to_string();
                    seen.insert((path.clone(), name.clone())).then(|| TranslatableField {
                        library: library.to_string(),
                        translation: translation_texts(current, &name)
                            .next()
                            .map(str::to_string),
                        path,
                        name,
                    })
                })
                .collect();

            trace!(library, fields_len = fields.len(); "Discovered translatable fields");
            (!fields.is_empty()).then(|| LibraryTranslations {
                library: library.to_string(),
                fields,
            })
        })
        .collect();

    debug!(libraries_len = translations.len(); "Discovered translations");
    Some(translations)
}

/// Writes `text` into the parameters at the location of `field`.
///
/// The field's path is resolved inside the sub-content of its library when
/// there is one, otherwise from the top of `params`. Returns `false` if the
/// path does not exist.
pub fn apply_translation(params: &mut Value, field: &TranslatableField, text: &str) -> bool {
    let root = if sub_params(params, &field.library).is_some() {
        match sub_params_mut(params, &field.library) {
            Some(root) => root,
            None => return false,
        }
    } else {
        params
    };
    set_at_path(root, &field.path, &field.name, Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schemas() -> HashMap<String, Vec<Field>> {
        let scenario: Vec<Field> = serde_json::from_value(json!([
            {"name": "content", "type": "list", "field": {"name": "item", "type": "group", "fields": []}},
            {"name": "l10n", "type": "group", "common": true, "fields": [
                {"name": "restart", "type": "text"},
                {"name": "nested", "type": "group", "fields": [{"name": "back", "type": "text"}]}
            ]}
        ]))
        .unwrap();
        let text: Vec<Field> = serde_json::from_value(json!([
            {"name": "text", "type": "text"},
            {"name": "next", "type": "text", "common": true}
        ]))
        .unwrap();
        let image: Vec<Field> = serde_json::from_value(json!([
            {"name": "alt", "type": "text"}
        ]))
        .unwrap();

        HashMap::from([
            ("H5P.BranchingScenario 1.0".to_string(), scenario),
            ("H5P.Text 1.1".to_string(), text),
            ("H5P.Image 1.1".to_string(), image),
        ])
    }

    fn params() -> Value {
        json!({
            "l10n": {"restart": "Restart", "nested": {"back": "Back"}},
            "content": [
                {"type": {"library": "H5P.Text 1.1", "params": {"text": "Hi", "next": "Weiter"}}},
                {"type": {"library": "H5P.Image 1.1", "params": {"alt": "Cat"}}}
            ]
        })
    }

    #[test]
    fn test_discover_common_text_fields() {
        let params = params();
        let found = discover(&schemas(), &params, Some("H5P.BranchingScenario 1.0")).unwrap();

        let libraries: Vec<_> = found.iter().map(LibraryTranslations::library).collect();
        assert_eq!(libraries, vec!["H5P.BranchingScenario 1.0", "H5P.Text 1.1"]);

        let scenario = found[0].fields();
        assert_eq!(scenario.len(), 2);
        assert_eq!(scenario[0].name(), "restart");
        assert_eq!(scenario[0].path(), ["l10n".to_string()]);
        assert_eq!(scenario[0].translation(), Some("Restart"));
        assert_eq!(scenario[1].name(), "back");
        assert_eq!(scenario[1].path(), ["l10n".to_string(), "nested".to_string()]);
        assert_eq!(scenario[1].translation(), Some("Back"));

        let text = found[1].fields();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].path(), &[] as &[String]);
        assert_eq!(text[0].translation(), Some("Weiter"));
    }

    #[test]
    fn test_discover_waits_for_all_schemas() {
        let mut schemas = schemas();
        schemas.remove("H5P.Image 1.1");

        assert_eq!(discover(&schemas, &params(), Some("H5P.BranchingScenario 1.0")), None);
    }

    #[test]
    fn test_apply_translation_targets_sub_content() {
        let mut params = params();
        let found = discover(&schemas(), &params, Some("H5P.BranchingScenario 1.0")).unwrap();
        let next = found[1].fields()[0].clone();
        let back = found[0].fields()[1].clone();

        assert!(apply_translation(&mut params, &next, "Next"));
        assert!(apply_translation(&mut params, &back, "Zurück"));

        assert_eq!(params["content"][0]["type"]["params"]["next"], json!("Next"));
        assert_eq!(params["l10n"]["nested"]["back"], json!("Zurück"));
    }
}
