//! The fixed tables describing each raw object type.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

/// Declared type, namespace prefix, and the token names that start a record.
const STANDARD_TYPES: &[(&str, &str, &[&str])] = &[
    ("BODY", "body", &["BODY"]),
    ("BODY_DETAIL_PLAN", "b_detail_plan", &["BODY_DETAIL_PLAN"]),
    ("BUILDING", "building", &["BUILDING_WORKSHOP"]),
    ("CREATURE", "creature", &["CREATURE"]),
    ("CREATURE_VARIATION", "c_variation", &["CREATURE_VARIATION"]),
    ("DESCRIPTOR_COLOR", "descriptor_color", &["COLOR"]),
    ("DESCRIPTOR_PATTERN", "descriptor_pattern", &["COLOR_PATTERN"]),
    ("DESCRIPTOR_SHAPE", "descriptor_shape", &["SHAPE"]),
    ("ENTITY", "entity", &["ENTITY"]),
    ("GRAPHICS", "graphics", &["GRAPHICS"]),
    ("INTERACTION", "interaction", &["INTERACTION"]),
    ("INORGANIC", "inorganic", &["INORGANIC"]),
    (
        "ITEM",
        "item",
        &[
            "ITEM_AMMO",
            "ITEM_ARMOR",
            "ITEM_FOOD",
            "ITEM_GLOVES",
            "ITEM_HELM",
            "ITEM_INSTRUMENT",
            "ITEM_PANTS",
            "ITEM_SHIELD",
            "ITEM_SHOES",
            "ITEM_SIEGEAMMO",
            "ITEM_TOOL",
            "ITEM_TOY",
            "ITEM_TRAPCOMP",
            "ITEM_WEAPON",
        ],
    ),
    ("LANGUAGE", "language", &["SYMBOL", "WORD", "TRANSLATION"]),
    ("MATERIAL_TEMPLATE", "material_template", &["MATERIAL_TEMPLATE"]),
    ("PLANT", "plant", &["PLANT"]),
    ("REACTION", "reaction", &["REACTION"]),
    ("TISSUE_TEMPLATE", "tissue_template", &["TISSUE_TEMPLATE"]),
];

/// Types whose records are also indexed under the type name itself.
const UMBRELLA_TYPES: &[&str] = &["ITEM"];

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::standard);

/// What the registry knows about one declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawType {
    prefix: String,
    subtypes: BTreeSet<String>,
    umbrella: bool,
}

impl RawType {
    /// The canonical short name every namespace of this type starts with.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Token names that start a new record.
    #[must_use]
    pub const fn subtypes(&self) -> &BTreeSet<String> {
        &self.subtypes
    }

    /// Whether records are also indexed under the type name.
    #[must_use]
    pub const fn is_umbrella(&self) -> bool {
        self.umbrella
    }
}

/// Lookup tables from declared type to namespace prefix and record starters.
///
/// The registry is built once and only ever read. Construction functions take
/// it by reference; [`Registry::global`] is the shared standard instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    types: BTreeMap<String, RawType>,
}

impl Registry {
    /// The standard set of raw object types.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for &(name, prefix, subtypes) in STANDARD_TYPES {
            registry = registry.with_type(
                name,
                prefix,
                subtypes.iter().copied(),
                UMBRELLA_TYPES.contains(&name),
            );
        }
        registry
    }

    /// A process-wide standard registry.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Adds (or replaces) a type.
    #[must_use]
    pub fn with_type<I, S>(mut self, name: &str, prefix: &str, subtypes: I, umbrella: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.insert(
            name.to_string(),
            RawType {
                prefix: prefix.to_string(),
                subtypes: subtypes.into_iter().map(Into::into).collect(),
                umbrella,
            },
        );
        self
    }

    /// Looks up a declared type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RawType> {
        self.types.get(name)
    }

    /// Iterates over the registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
