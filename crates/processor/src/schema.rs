//! Table schema as seen by the processor
//!
//! Only what the processor reads at startup: the table's column families and
//! their string properties. Per-family TTL travels as the [`TTL_PROPERTY`]
//! property, in milliseconds.

use std::collections::BTreeMap;
use txfilter_visibility::TtlTable;

/// Family property holding the transactional TTL in milliseconds
pub const TTL_PROPERTY: &str = "txfilter.ttl";

/// One column family and its properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDescriptor {
    /// Family name
    pub name: Vec<u8>,
    /// String properties
    pub properties: BTreeMap<String, String>,
}

impl FamilyDescriptor {
    /// A family with no properties
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        FamilyDescriptor {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a property, builder style
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the TTL property, builder style
    pub fn with_ttl_millis(self, ttl: u64) -> Self {
        self.with_property(TTL_PROPERTY, ttl.to_string())
    }

    /// Look up a property
    pub fn value(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A table and its families
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Column families
    pub families: Vec<FamilyDescriptor>,
}

impl TableDescriptor {
    /// A table without families
    pub fn new(name: impl Into<String>) -> Self {
        TableDescriptor {
            name: name.into(),
            families: Vec::new(),
        }
    }

    /// Add a family, builder style
    pub fn with_family(mut self, family: FamilyDescriptor) -> Self {
        self.families.push(family);
        self
    }

    /// Resolve the per-family TTL table
    pub fn ttl_table(&self) -> TtlTable {
        TtlTable::from_properties(
            self.families
                .iter()
                .map(|family| (family.name.as_slice(), family.value(TTL_PROPERTY))),
        )
    }
}
