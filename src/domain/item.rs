use crate::error::{LotError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which an item type is stored in its descriptor document.
pub const DESCRIPTOR_KEY: &str = "itemstack";

/// The identity of one kind of fungible item.
///
/// Two values are interchangeable (and stack together) exactly when they are
/// equal field by field. Enchantments and tags are kept in ordered maps so the
/// encoded descriptor is stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemType {
    pub material: String,
    #[serde(default)]
    pub durability: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enchantments: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ItemType {
    /// Creates a plain item type of `material` with no metadata.
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            durability: 0,
            display_name: None,
            lore: Vec::new(),
            enchantments: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Sets the damage value.
    pub fn with_durability(mut self, durability: u16) -> Self {
        self.durability = durability;
        self
    }

    /// Sets a custom display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Adds or replaces an enchantment at `level`.
    pub fn with_enchantment(mut self, name: impl Into<String>, level: u32) -> Self {
        self.enchantments.insert(name.into(), level);
        self
    }

    /// Adds or replaces a free-form tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A chunk of items of a single type, as handed to a container or dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemType,
    pub amount: u32,
}

impl ItemStack {
    /// Creates a chunk of `amount` items of `item`.
    pub fn new(item: ItemType, amount: u32) -> Self {
        Self { item, amount }
    }

    /// Same item type, different amount.
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            item: self.item.clone(),
            amount,
        }
    }
}

#[derive(Serialize)]
struct DescriptorRef<'a> {
    itemstack: &'a ItemType,
}

#[derive(Deserialize)]
struct Descriptor {
    itemstack: ItemType,
}

/// Encodes an item type as a YAML document with a single `itemstack` key.
pub fn encode(item: &ItemType) -> Result<String> {
    serde_yaml::to_string(&DescriptorRef { itemstack: item })
        .map_err(|e| LotError::CorruptDescriptor(e.to_string()))
}

/// Decodes a descriptor produced by [`encode`].
pub fn decode(descriptor: &str) -> Result<ItemType> {
    serde_yaml::from_str::<Descriptor>(descriptor)
        .map(|doc| doc.itemstack)
        .map_err(|e| LotError::CorruptDescriptor(e.to_string()))
}
