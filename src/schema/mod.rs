mod error;
pub mod validate;

use serde::{Deserialize, Serialize};

pub use error::SchemaError;

/// A named schema definition for a category of records.
///
/// `fields` is kept in display order; a field's position is its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One typed attribute of a collection.
///
/// Serialized in the flat wire shape used by field descriptors:
/// the common flags sit next to `id`, `name`, `type` and the
/// type-specific keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub presentable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(flatten)]
    pub options: FieldOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldOptions {
    Text(TextOptions),
    Number(NumberOptions),
    Bool,
    Date(DateOptions),
    Select(SelectOptions),
    File(FileOptions),
    Autodate(AutodateOptions),
    Relation(RelationOptions),
}

/// Length bounds of `0` mean unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    pub min: u32,
    pub max: u32,
    pub pattern: String,
    pub autogenerate_pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub only_int: bool,
}

/// Bounds are date strings; empty means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateOptions {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOptions {
    pub max_select: u32,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileOptions {
    pub max_select: u32,
    /// Bytes, 0 uses the store default
    pub max_size: u64,
    pub mime_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutodateOptions {
    pub on_create: bool,
    pub on_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationOptions {
    pub collection_id: String,
    pub cascade_delete: bool,
    pub min_select: u32,
    pub max_select: u32,
}

/// A field together with the index it should be inserted at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub position: usize,
    #[serde(flatten)]
    pub field: Field,
}

impl FieldOptions {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldOptions::Text(_) => "text",
            FieldOptions::Number(_) => "number",
            FieldOptions::Bool => "bool",
            FieldOptions::Date(_) => "date",
            FieldOptions::Select(_) => "select",
            FieldOptions::File(_) => "file",
            FieldOptions::Autodate(_) => "autodate",
            FieldOptions::Relation(_) => "relation",
        }
    }
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, options: FieldOptions) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hidden: false,
            presentable: false,
            primary_key: false,
            required: false,
            system: false,
            options,
        }
    }

    /// Unbounded, optional text field
    pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, FieldOptions::Text(TextOptions::default()))
    }

    /// Unbounded, optional number field accepting decimals
    pub fn number(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, FieldOptions::Number(NumberOptions::default()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.options.type_name()
    }
}

impl FieldDescriptor {
    pub fn new(position: usize, field: Field) -> Self {
        Self { position, field }
    }
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn field_by_id(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn position_of(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }

    /// Insert `field` at `position`, shifting later fields back by one.
    ///
    /// A position past the end appends. Returns the index the field ended
    /// up at. Fails with [`SchemaError::Conflict`] when the id is taken.
    pub fn add_field_at(&mut self, position: usize, field: Field) -> Result<usize, SchemaError> {
        if self.field_by_id(&field.id).is_some() {
            return Err(SchemaError::Conflict {
                collection: self.id.clone(),
                field_id: field.id,
            });
        }

        let index = position.min(self.fields.len());
        self.fields.insert(index, field);
        Ok(index)
    }

    /// Remove the field with `field_id`, returning it if it was present.
    pub fn remove_field_by_id(&mut self, field_id: &str) -> Option<Field> {
        let index = self.position_of(field_id)?;
        Some(self.fields.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_field_collection() -> Collection {
        Collection::new("pbc_1", "tracks").with_fields(vec![
            Field::text("text1", "a"),
            Field::text("text2", "b"),
            Field::text("text3", "c"),
        ])
    }

    #[test]
    fn test_add_field_at_shifts_later_fields() {
        let mut collection = three_field_collection();

        let index = collection
            .add_field_at(1, Field::number("number1", "n"))
            .unwrap();

        assert_eq!(index, 1);
        let names: Vec<_> = collection.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "n", "b", "c"]);
        assert_eq!(collection.position_of("text2"), Some(2));
    }

    #[test]
    fn test_add_field_past_end_appends() {
        let mut collection = three_field_collection();

        let index = collection
            .add_field_at(10, Field::text("text9", "late"))
            .unwrap();

        assert_eq!(index, 3);
        assert_eq!(collection.fields.last().unwrap().id, "text9");
    }

    #[test]
    fn test_add_field_duplicate_id_conflicts() {
        let mut collection = three_field_collection();
        let before = collection.clone();

        let result = collection.add_field_at(0, Field::text("text2", "other"));

        assert!(matches!(
            result,
            Err(SchemaError::Conflict { ref field_id, .. }) if field_id == "text2"
        ));
        assert_eq!(collection, before);
    }

    #[test]
    fn test_remove_missing_field_is_none() {
        let mut collection = three_field_collection();

        assert!(collection.remove_field_by_id("nope").is_none());
        assert_eq!(collection.fields.len(), 3);

        let removed = collection.remove_field_by_id("text1").unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(collection.fields.len(), 2);
    }

    #[test]
    fn test_text_descriptor_from_json() {
        let descriptor: FieldDescriptor = serde_json::from_str(
            r#"{
                "autogeneratePattern": "",
                "hidden": false,
                "id": "text724990059",
                "max": 0,
                "min": 0,
                "name": "title",
                "pattern": "",
                "position": 3,
                "presentable": false,
                "primaryKey": false,
                "required": false,
                "system": false,
                "type": "text"
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.position, 3);
        assert_eq!(descriptor.field, Field::text("text724990059", "title"));
    }

    #[test]
    fn test_number_descriptor_with_null_bounds() {
        let descriptor: FieldDescriptor = serde_json::from_str(
            r#"{
                "hidden": false,
                "id": "number2254405824",
                "max": null,
                "min": null,
                "name": "duration",
                "onlyInt": false,
                "position": 6,
                "presentable": false,
                "required": false,
                "system": false,
                "type": "number"
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.position, 6);
        assert_eq!(
            descriptor.field.options,
            FieldOptions::Number(NumberOptions {
                min: None,
                max: None,
                only_int: false,
            })
        );
    }

    #[test]
    fn test_select_descriptor_without_flags() {
        let descriptor: FieldDescriptor = serde_json::from_str(
            r#"{
                "id": "select3120095287",
                "maxSelect": 1,
                "name": "download_status",
                "position": 10,
                "type": "select",
                "values": ["queued", "downloading", "completed", "failed"]
            }"#,
        )
        .unwrap();

        let FieldOptions::Select(select) = &descriptor.field.options else {
            panic!("expected select options, got {:?}", descriptor.field.options);
        };
        assert_eq!(select.max_select, 1);
        assert_eq!(select.values.len(), 4);
        assert!(!descriptor.field.required);
    }

    #[test]
    fn test_field_json_carries_type_tag() {
        let value = serde_json::to_value(Field::number("number1", "duration")).unwrap();

        assert_eq!(value["type"], "number");
        assert_eq!(value["onlyInt"], false);
        assert!(value["min"].is_null());

        let bool_value = serde_json::to_value(Field::new("bool1", "explicit", FieldOptions::Bool))
            .unwrap();
        assert_eq!(bool_value["type"], "bool");
    }
}
