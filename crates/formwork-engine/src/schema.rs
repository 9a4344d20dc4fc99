//! Canonical schema types.
//!
//! A [`NormalizedSchema`] stores every rendered field once, in a flat arena
//! (`fields`), and sections refer to fields by [`FieldIndex`]. The side
//! table `index` maps the stable [`FieldId`] back into the arena, and
//! `coordinates` records where each field sat in the source document.

use crate::show_if::{ShowIf, is_shown};
use crate::vars::VariableBag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable field identifier `"{tab}-{section}-{field}"`.
///
/// Assigned once by the normalizer; opaque everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self(format!(
            "{}-{}-{}",
            coordinates.tab, coordinates.section, coordinates.field
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for FieldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Position of a field inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldIndex(pub usize);

/// Where a field sat in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub tab: usize,
    pub section: usize,
    pub field: usize,
}

/// The closed set of field kinds the engine knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Heading,
    Subtitle,
    Input,
    Checkbox,
    KeyValueArray,
    ArrayInput,
    Select,
    ServiceIpList,
    ResourceList,
    VeleroCreateBackup,
    Cron,
    TextArea,
    /// A type tag with no built-in renderer; shown as a placeholder.
    Unknown,
}

impl FieldKind {
    pub const ALL: [FieldKind; 13] = [
        FieldKind::Heading,
        FieldKind::Subtitle,
        FieldKind::Input,
        FieldKind::Checkbox,
        FieldKind::KeyValueArray,
        FieldKind::ArrayInput,
        FieldKind::Select,
        FieldKind::ServiceIpList,
        FieldKind::ResourceList,
        FieldKind::VeleroCreateBackup,
        FieldKind::Cron,
        FieldKind::TextArea,
        FieldKind::Unknown,
    ];

    /// Classify a canonical type tag. Legacy aliases are rewritten by the
    /// normalizer before this is consulted.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "heading" => FieldKind::Heading,
            "subtitle" => FieldKind::Subtitle,
            "input" => FieldKind::Input,
            "checkbox" => FieldKind::Checkbox,
            "key-value-array" => FieldKind::KeyValueArray,
            "array-input" => FieldKind::ArrayInput,
            "select" => FieldKind::Select,
            "service-ip-list" => FieldKind::ServiceIpList,
            "resource-list" => FieldKind::ResourceList,
            "velero-create-backup" => FieldKind::VeleroCreateBackup,
            "cron" => FieldKind::Cron,
            "text-area" => FieldKind::TextArea,
            _ => FieldKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Heading => "heading",
            FieldKind::Subtitle => "subtitle",
            FieldKind::Input => "input",
            FieldKind::Checkbox => "checkbox",
            FieldKind::KeyValueArray => "key-value-array",
            FieldKind::ArrayInput => "array-input",
            FieldKind::Select => "select",
            FieldKind::ServiceIpList => "service-ip-list",
            FieldKind::ResourceList => "resource-list",
            FieldKind::VeleroCreateBackup => "velero-create-backup",
            FieldKind::Cron => "cron",
            FieldKind::TextArea => "text-area",
            FieldKind::Unknown => "unknown",
        }
    }

    /// Kinds that collect user input and so take part in required analysis.
    pub fn is_input(&self) -> bool {
        !matches!(
            self,
            FieldKind::Heading
                | FieldKind::Subtitle
                | FieldKind::ResourceList
                | FieldKind::ServiceIpList
                | FieldKind::VeleroCreateBackup
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leaf schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,

    /// Prior revision values; the first element is authoritative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,

    /// Kind-specific attributes the engine carries but does not interpret
    /// (`label`, `options`, `secretOption`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        FieldKind::from_type_name(&self.type_name)
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key).filter(|v| !v.is_null())
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.setting(key).and_then(Value::as_str)
    }

    /// `settings.default`.
    pub fn default_value(&self) -> Option<&Value> {
        self.setting("default")
    }

    /// `value[0]`, the authoritative revision value.
    pub fn revision_value(&self) -> Option<&Value> {
        self.value.first().filter(|v| !v.is_null())
    }

    /// A boolean attribute looked up in `settings` first, then on the field.
    pub fn flag(&self, key: &str) -> bool {
        self.setting(key)
            .or_else(|| self.extra.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub show_if: Option<ShowIf>,
    pub fields: Vec<FieldIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub name: String,
    pub label: String,
    pub settings: Option<Value>,
    pub sections: Vec<Section>,
}

/// A schema after normalization: canonical types, assigned ids, and no
/// `variable` pseudo-fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSchema {
    pub name: String,
    pub has_source: bool,
    pub include_hidden_fields: bool,
    pub is_cluster_scoped: Option<bool>,
    pub tabs: Vec<Tab>,
    pub(crate) fields: Vec<Field>,
    pub(crate) coordinates: Vec<Coordinates>,
    pub(crate) index: BTreeMap<FieldId, FieldIndex>,
}

impl NormalizedSchema {
    /// All fields in document order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: FieldIndex) -> &Field {
        &self.fields[index.0]
    }

    pub fn field_by_id(&self, id: &str) -> Option<&Field> {
        self.index_of(id).map(|idx| self.field(idx))
    }

    pub fn index_of(&self, id: &str) -> Option<FieldIndex> {
        self.index.get(id).copied()
    }

    pub fn coordinates(&self, index: FieldIndex) -> Coordinates {
        self.coordinates[index.0]
    }

    /// The visibility-filtered view: sections whose `show_if` passes.
    pub fn active(&self, variables: &VariableBag) -> ActiveSchema<'_> {
        self.view(|section| is_shown(section.show_if.as_ref(), variables))
    }

    /// Every section, ignoring `show_if`.
    pub fn unfiltered(&self) -> ActiveSchema<'_> {
        self.view(|_| true)
    }

    fn view(&self, mut keep: impl FnMut(&Section) -> bool) -> ActiveSchema<'_> {
        let mut sections = Vec::new();
        let mut fields = Vec::new();
        for (t, tab) in self.tabs.iter().enumerate() {
            for (s, section) in tab.sections.iter().enumerate() {
                if keep(section) {
                    sections.push((t, s));
                    fields.extend(section.fields.iter().copied());
                }
            }
        }
        ActiveSchema {
            schema: self,
            sections,
            fields,
        }
    }

    /// Ids whose `(type, variable)` identity differs between two
    /// normalizations, including ids present on only one side.
    ///
    /// Ids are positional, so a reordered source document shows up here
    /// instead of silently rebinding component and validation state.
    pub fn id_drift(&self, other: &NormalizedSchema) -> Vec<FieldId> {
        let ids: BTreeSet<&FieldId> = self.index.keys().chain(other.index.keys()).collect();
        ids.into_iter()
            .filter(|id| {
                let ours = self.field_by_id(id.as_str()).map(identity);
                let theirs = other.field_by_id(id.as_str()).map(identity);
                ours != theirs
            })
            .cloned()
            .collect()
    }
}

fn identity(field: &Field) -> (&str, Option<&str>) {
    (field.type_name.as_str(), field.variable.as_deref())
}

impl Serialize for NormalizedSchema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = SchemaView {
            name: &self.name,
            has_source: self.has_source,
            include_hidden_fields: self.include_hidden_fields,
            is_cluster_scoped: self.is_cluster_scoped,
            tabs: self
                .tabs
                .iter()
                .map(|tab| TabView {
                    name: &tab.name,
                    label: &tab.label,
                    settings: tab.settings.as_ref(),
                    sections: tab
                        .sections
                        .iter()
                        .map(|section| SectionView {
                            name: &section.name,
                            show_if: section.show_if.as_ref(),
                            contents: section.fields.iter().map(|idx| self.field(*idx)).collect(),
                        })
                        .collect(),
                })
                .collect(),
        };
        view.serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaView<'a> {
    name: &'a str,
    has_source: bool,
    include_hidden_fields: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_cluster_scoped: Option<bool>,
    tabs: Vec<TabView<'a>>,
}

#[derive(Serialize)]
struct TabView<'a> {
    name: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<&'a Value>,
    sections: Vec<SectionView<'a>>,
}

#[derive(Serialize)]
struct SectionView<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_if: Option<&'a ShowIf>,
    contents: Vec<&'a Field>,
}

/// A borrowed view over the sections that survived visibility filtering.
#[derive(Debug, Clone)]
pub struct ActiveSchema<'a> {
    schema: &'a NormalizedSchema,
    sections: Vec<(usize, usize)>,
    fields: Vec<FieldIndex>,
}

impl<'a> ActiveSchema<'a> {
    pub fn schema(&self) -> &'a NormalizedSchema {
        self.schema
    }

    /// Active fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = &'a Field> + '_ {
        let schema = self.schema;
        self.fields.iter().map(move |idx| schema.field(*idx))
    }

    /// `(tab, section)` positions of the active sections.
    pub fn sections(&self) -> &[(usize, usize)] {
        &self.sections
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schema
            .index_of(id)
            .is_some_and(|idx| self.fields.contains(&idx))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
