//! Core definition and instance types.
//!
//! Everything serializes to and from the camelCase JSON documents hosts
//! author. Field definitions describe one named, typed value together with
//! its constraints and the parent triggers that make it visible. A form
//! definition is the ordered list of those fields.

use formwork_common::{trigger_keys, FieldValues};
use formwork_units::Dimension;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// The type tag of a field.
///
/// The built-in tags form a closed set with one fixed validator each. Any
/// other tag parses to [`FieldType::Custom`] and is validated by whatever the
/// host registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Number,
    Integer,
    String,
    Text,
    Select,
    MultiSelect,
    NumberArray,
    StringArray,
    Unit,
    File,
    Date,
    Custom(String),
}

impl FieldType {
    /// Every built-in type.
    pub const BUILT_IN: [FieldType; 12] = [
        FieldType::Boolean,
        FieldType::Number,
        FieldType::Integer,
        FieldType::String,
        FieldType::Text,
        FieldType::Select,
        FieldType::MultiSelect,
        FieldType::NumberArray,
        FieldType::StringArray,
        FieldType::Unit,
        FieldType::File,
        FieldType::Date,
    ];

    /// Canonical tag.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiselect",
            FieldType::NumberArray => "number-array",
            FieldType::StringArray => "string-array",
            FieldType::Unit => "unit",
            FieldType::File => "file",
            FieldType::Date => "date",
            FieldType::Custom(tag) => tag,
        }
    }

    pub fn is_built_in(&self) -> bool {
        !matches!(self, FieldType::Custom(_))
    }

    /// The runtime shape values of this type take.
    pub fn shape(&self) -> ValueShape {
        match self {
            FieldType::Boolean => ValueShape::Boolean,
            FieldType::Number | FieldType::Integer => ValueShape::Number,
            FieldType::String | FieldType::Text | FieldType::Select | FieldType::Date => {
                ValueShape::String
            }
            FieldType::MultiSelect | FieldType::StringArray => ValueShape::StringArray,
            FieldType::NumberArray => ValueShape::NumberArray,
            FieldType::Unit => ValueShape::UnitTuple,
            FieldType::File => ValueShape::File,
            FieldType::Custom(_) => ValueShape::Any,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    // Unknown tags are custom types, never an error.
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field_type = match s.trim().to_lowercase().as_str() {
            "boolean" | "bool" | "checkbox" => FieldType::Boolean,
            "number" | "numeric" | "float" | "decimal" => FieldType::Number,
            "integer" | "int" => FieldType::Integer,
            "string" | "str" => FieldType::String,
            "text" | "textarea" => FieldType::Text,
            "select" | "enum" | "choice" => FieldType::Select,
            "multiselect" | "multi-select" | "multi_select" | "multichoice" => {
                FieldType::MultiSelect
            }
            "number-array" | "array-number" | "numberarray" | "number_array" => {
                FieldType::NumberArray
            }
            "string-array" | "array-string" | "stringarray" | "string_array" | "tags" => {
                FieldType::StringArray
            }
            "unit" | "measurement" => FieldType::Unit,
            "file" | "upload" => FieldType::File,
            "date" => FieldType::Date,
            _ => FieldType::Custom(s.trim().to_string()),
        };
        Ok(field_type)
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        match tag.parse::<FieldType>() {
            Ok(field_type) => Ok(field_type),
            Err(never) => match never {},
        }
    }
}

/// Runtime value shape, used to decide whether a value fits a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Boolean,
    Number,
    String,
    NumberArray,
    StringArray,
    UnitTuple,
    File,
    /// Custom types accept any value shape.
    Any,
}

/// One entry of an option list: a bare value or a value with a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Labeled {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Plain(Value),
}

impl FieldOption {
    pub fn value(&self) -> &Value {
        match self {
            FieldOption::Labeled { value, .. } | FieldOption::Plain(value) => value,
        }
    }

    /// Comparison key of the option value.
    pub fn key(&self) -> Option<String> {
        formwork_common::loose_string(self.value())
    }
}

fn deserialize_parents<'de, D>(deserializer: D) -> Result<BTreeMap<String, BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    // A trigger list may be written as a single scalar.
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(parent, triggers)| (parent, trigger_keys(&triggers).into_iter().collect()))
        .collect())
}

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

/// The complete schema for a single named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Parent field name → trigger values. Parents are OR-combined.
    #[serde(
        default,
        deserialize_with = "deserialize_parents",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub parents: BTreeMap<String, BTreeSet<String>>,
    /// Trigger value → child field names. Derived at load time, never authored.
    #[serde(skip)]
    pub children: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub min_inclusive: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub max_inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
    /// Upper bound in bytes for file fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_handler_name: Option<String>,
    /// Attributes this crate does not interpret, kept for the rendering layer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            field_type,
            default_value: None,
            required: false,
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            min: None,
            max: None,
            min_inclusive: true,
            max_inclusive: true,
            min_length: None,
            max_length: None,
            pattern: None,
            options: None,
            min_items: None,
            max_items: None,
            dimension: None,
            default_unit: None,
            max_file_size: None,
            validation_handler_name: None,
            extra: Map::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Make this field visible when `parent` holds one of `triggers`.
    pub fn with_parent<I, S>(mut self, parent: impl Into<String>, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents
            .entry(parent.into())
            .or_default()
            .extend(triggers.into_iter().map(Into::into));
        self
    }

    pub fn with_min(mut self, min: f64, inclusive: bool) -> Self {
        self.min = Some(min);
        self.min_inclusive = inclusive;
        self
    }

    pub fn with_max(mut self, max: f64, inclusive: bool) -> Self {
        self.max = Some(max);
        self.max_inclusive = inclusive;
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(|v| FieldOption::Plain(v.into()))
                .collect(),
        );
        self
    }

    pub fn with_items(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    pub fn with_unit(mut self, dimension: Dimension, default_unit: impl Into<String>) -> Self {
        self.dimension = Some(dimension.as_str().to_string());
        self.default_unit = Some(default_unit.into());
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn with_validation_handler(mut self, handler: impl Into<String>) -> Self {
        self.validation_handler_name = Some(handler.into());
        self
    }

    /// Name shown to users, falling back to the field name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// The parsed unit dimension, if declared and recognised.
    pub fn unit_dimension(&self) -> Option<Dimension> {
        self.dimension.as_deref().and_then(|d| d.parse().ok())
    }

    pub fn has_parents(&self) -> bool {
        !self.parents.is_empty()
    }

    /// The value a fresh instance starts with.
    ///
    /// Unit fields start as `[default, defaultUnit]` with a blank default
    /// read as no magnitude; a default that is already a tuple is kept as
    /// written.
    pub fn initial_value(&self) -> Value {
        let default = self.default_value.clone().unwrap_or(Value::Null);
        if self.field_type != FieldType::Unit || default.is_array() {
            return default;
        }
        let default = match default {
            Value::String(s) if s.trim().is_empty() => Value::Null,
            other => other,
        };
        let unit = self
            .default_unit
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null);
        Value::Array(vec![default, unit])
    }
}

/// A form schema: an ordered list of fields plus form-level handler names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    properties: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_handler_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_handler_name: Option<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FormDefinition {
    /// Build a definition from fields, deriving children and the name index.
    ///
    /// No structural checks happen here; use [`crate::load_definition`] for
    /// untrusted input.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        properties: Vec<FieldDefinition>,
    ) -> Self {
        let mut definition = Self {
            name: name.into(),
            version: version.into(),
            display_name: None,
            properties,
            validation_handler_name: None,
            submit_handler_name: None,
            index: HashMap::new(),
        };
        definition.finalize();
        definition
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_validation_handler(mut self, handler: impl Into<String>) -> Self {
        self.validation_handler_name = Some(handler.into());
        self
    }

    pub fn with_submit_handler(mut self, handler: impl Into<String>) -> Self {
        self.submit_handler_name = Some(handler.into());
        self
    }

    /// Rebuild the name index and every field's derived `children`.
    ///
    /// Parent references to fields that do not exist are ignored.
    pub(crate) fn finalize(&mut self) {
        self.index = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        for field in &mut self.properties {
            field.children.clear();
            field.extra.remove("children");
        }

        let mut edges: Vec<(usize, String, String)> = Vec::new();
        for field in &self.properties {
            for (parent, triggers) in &field.parents {
                if let Some(&p) = self.index.get(parent) {
                    for trigger in triggers {
                        edges.push((p, trigger.clone(), field.name.clone()));
                    }
                }
            }
        }
        for (parent, trigger, child) in edges {
            self.properties[parent]
                .children
                .entry(trigger)
                .or_default()
                .push(child);
        }
    }

    /// Fields in definition order.
    pub fn properties(&self) -> &[FieldDefinition] {
        &self.properties
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Position of a field in definition order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A named set of values for one version of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInstance {
    pub name: String,
    /// Name of the definition these values belong to.
    pub definition: String,
    pub version: String,
    #[serde(default)]
    pub values: FieldValues,
}

impl FormInstance {
    pub fn new(
        name: impl Into<String>,
        definition: impl Into<String>,
        version: impl Into<String>,
        values: FieldValues,
    ) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            version: version.into(),
            values,
        }
    }

    /// Whether this instance was made for exactly this definition version.
    pub fn matches(&self, definition: &FormDefinition) -> bool {
        self.definition == definition.name && self.version == definition.version
    }
}

/// Field name → visible.
pub type VisibilityMap = BTreeMap<String, bool>;

/// Field name → error message.
pub type ValidationErrorMap = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_aliases_and_custom() {
        assert_eq!("bool".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!("Enum".parse::<FieldType>().unwrap(), FieldType::Select);
        assert_eq!(
            "array-number".parse::<FieldType>().unwrap(),
            FieldType::NumberArray
        );
        assert_eq!(
            "color".parse::<FieldType>().unwrap(),
            FieldType::Custom("color".into())
        );
        assert!(!FieldType::Custom("color".into()).is_built_in());
    }

    #[test]
    fn test_field_type_serializes_as_canonical_tag() {
        let json = serde_json::to_value(FieldType::MultiSelect).unwrap();
        assert_eq!(json, json!("multiselect"));
        let parsed: FieldType = serde_json::from_value(json!("float")).unwrap();
        assert_eq!(parsed, FieldType::Number);
    }

    #[test]
    fn test_field_definition_from_json() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "name": "petName",
            "displayName": "Pet name",
            "type": "string",
            "required": true,
            "parents": { "hasPet": "yes", "kind": ["dog", true] },
            "minInclusive": false,
            "widget": "fancy-input"
        }))
        .unwrap();

        assert_eq!(field.label(), "Pet name");
        assert!(field.required);
        assert!(!field.min_inclusive);
        assert!(field.max_inclusive);
        assert_eq!(field.parents["hasPet"], BTreeSet::from(["yes".to_string()]));
        assert_eq!(
            field.parents["kind"],
            BTreeSet::from(["dog".to_string(), "true".to_string()])
        );
        assert_eq!(field.extra["widget"], json!("fancy-input"));
    }

    #[test]
    fn test_options_accept_plain_and_labeled() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "name": "size",
            "type": "select",
            "options": ["s", {"value": "m", "label": "Medium"}, 3]
        }))
        .unwrap();
        let keys: Vec<_> = field
            .options
            .unwrap()
            .iter()
            .filter_map(FieldOption::key)
            .collect();
        assert_eq!(keys, vec!["s", "m", "3"]);
    }

    #[test]
    fn test_unit_initial_value_is_tuple() {
        let field = FieldDefinition::new("height", FieldType::Unit)
            .with_default(180)
            .with_unit(Dimension::Length, "cm");
        assert_eq!(field.initial_value(), json!([180, "cm"]));

        let bare = FieldDefinition::new("height", FieldType::Unit);
        assert_eq!(bare.initial_value(), json!([null, null]));

        let text = FieldDefinition::new("nick", FieldType::String);
        assert_eq!(text.initial_value(), Value::Null);
    }

    #[test]
    fn test_definition_derives_children_and_ignores_dangling() {
        let definition = FormDefinition::new(
            "pets",
            "1",
            vec![
                FieldDefinition::new("hasPet", FieldType::Select),
                FieldDefinition::new("petName", FieldType::String)
                    .with_parent("hasPet", ["yes"])
                    .with_parent("ghost", ["x"]),
                FieldDefinition::new("petAge", FieldType::Number).with_parent("hasPet", ["yes"]),
            ],
        );

        let has_pet = definition.field("hasPet").unwrap();
        assert_eq!(has_pet.children["yes"], vec!["petName", "petAge"]);
        assert_eq!(definition.position("petAge"), Some(2));
        assert!(!definition.contains("ghost"));
    }

    #[test]
    fn test_instance_matches_definition_version() {
        let definition = FormDefinition::new("pets", "2", vec![]);
        let instance = FormInstance::new("mine", "pets", "2", FieldValues::new());
        assert!(instance.matches(&definition));
        let older = FormInstance::new("mine", "pets", "1", FieldValues::new());
        assert!(!older.matches(&definition));
    }
}
