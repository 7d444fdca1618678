//! Build form state: which options each slot may take, and how slots react
//! to each other.
//!
//! Rules:
//! - a value is selectable unless the channel disabled it; the sentinels
//!   "Any" and "None" are always selectable
//! - a perk chosen in one slot is not selectable in the other three
//! - add-on lists depend on the killer (killer builds) or the item (survivor
//!   builds); with a sentinel parent only the sentinels remain
//! - switching build type resets every slot to "Any"

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use crate::api::models::{BuildRecord, BuildType};
use crate::form::catalogue::{CHARACTERS, Catalogue, ITEMS, OFFERINGS, PERKS};

pub const ANY: &str = "Any";
pub const NONE: &str = "None";

pub fn is_sentinel(value: &str) -> bool {
    value == ANY || value == NONE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Character,
    Item,
    Addon1,
    Addon2,
    Perk1,
    Perk2,
    Perk3,
    Perk4,
    Offering,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Character,
        Field::Item,
        Field::Addon1,
        Field::Addon2,
        Field::Perk1,
        Field::Perk2,
        Field::Perk3,
        Field::Perk4,
        Field::Offering,
    ];

    pub const PERKS: [Field; 4] = [Field::Perk1, Field::Perk2, Field::Perk3, Field::Perk4];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Character => "character",
            Field::Item => "item",
            Field::Addon1 => "addon1",
            Field::Addon2 => "addon2",
            Field::Perk1 => "perk1",
            Field::Perk2 => "perk2",
            Field::Perk3 => "perk3",
            Field::Perk4 => "perk4",
            Field::Offering => "offering",
        }
    }

    pub fn parse(s: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Character => "Character",
            Field::Item => "Item",
            Field::Addon1 => "Add-on 1",
            Field::Addon2 => "Add-on 2",
            Field::Perk1 => "Perk 1",
            Field::Perk2 => "Perk 2",
            Field::Perk3 => "Perk 3",
            Field::Perk4 => "Perk 4",
            Field::Offering => "Offering",
        }
    }

    pub fn is_perk(&self) -> bool {
        Field::PERKS.contains(self)
    }

    pub fn is_addon(&self) -> bool {
        matches!(self, Field::Addon1 | Field::Addon2)
    }

    fn sentinels(&self) -> &'static [&'static str] {
        match self {
            Field::Item | Field::Addon1 | Field::Addon2 => &[ANY, NONE],
            _ => &[ANY],
        }
    }
}

/// Fields shown for a build type, in display order.
pub fn fields_for(build_type: BuildType) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|f| build_type == BuildType::Survivor || *f != Field::Item)
        .collect()
}

/// One entry of a slot's option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildForm {
    build_type: BuildType,
    selections: BTreeMap<Field, String>,
    pub notes: String,
}

impl Default for BuildForm {
    fn default() -> Self {
        Self::new(BuildType::Survivor)
    }
}

impl BuildForm {
    pub fn new(build_type: BuildType) -> Self {
        Self {
            build_type,
            selections: Field::ALL.into_iter().map(|f| (f, ANY.to_string())).collect(),
            notes: String::new(),
        }
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn get(&self, field: Field) -> &str {
        self.selections.get(&field).map(String::as_str).unwrap_or(ANY)
    }

    /// Switch schema. Nothing carries over between killer and survivor builds.
    pub fn set_build_type(&mut self, build_type: BuildType) {
        let notes = std::mem::take(&mut self.notes);
        *self = Self::new(build_type);
        self.notes = notes;
    }

    /// The slot that `field`'s option list depends on, if any.
    fn parent_of(&self, field: Field) -> Option<Field> {
        match (field.is_addon(), self.build_type) {
            (true, BuildType::Killer) => Some(Field::Character),
            (true, BuildType::Survivor) => Some(Field::Item),
            (false, _) => None,
        }
    }

    fn catalogue_values(&self, field: Field, catalogue: &Catalogue) -> Vec<String> {
        let t = self.build_type.as_str();
        match field {
            Field::Character => catalogue.options(&[t, CHARACTERS]),
            Field::Item if self.build_type == BuildType::Survivor => {
                catalogue.options(&[t, ITEMS])
            }
            Field::Item => Vec::new(),
            Field::Addon1 | Field::Addon2 => {
                let parent = self.parent_of(field).map(|p| self.get(p)).unwrap_or(ANY);
                if is_sentinel(parent) {
                    return Vec::new();
                }
                let category = match self.build_type {
                    BuildType::Killer => CHARACTERS,
                    BuildType::Survivor => ITEMS,
                };
                catalogue.options(&[t, category, parent])
            }
            Field::Perk1 | Field::Perk2 | Field::Perk3 | Field::Perk4 => {
                catalogue.options(&[t, PERKS])
            }
            Field::Offering => catalogue.options(&[t, OFFERINGS]),
        }
    }

    /// Option list for `field`: sentinels first, then catalogue values in
    /// alphabetical order, each flagged enabled or not.
    pub fn choices(&self, field: Field, catalogue: &Catalogue, disabled: &[String]) -> Vec<Choice> {
        let taken: Vec<&str> = if field.is_perk() {
            Field::PERKS
                .into_iter()
                .filter(|other| *other != field)
                .map(|other| self.get(other))
                .filter(|v| !is_sentinel(v))
                .collect()
        } else {
            Vec::new()
        };

        let mut choices: Vec<Choice> = field
            .sentinels()
            .iter()
            .map(|s| Choice {
                value: s.to_string(),
                enabled: true,
            })
            .collect();
        for value in self.catalogue_values(field, catalogue) {
            if is_sentinel(&value) {
                continue;
            }
            let enabled = !disabled.contains(&value) && !taken.contains(&value.as_str());
            choices.push(Choice { value, enabled });
        }
        choices
    }

    fn is_enabled(&self, field: Field, value: &str, catalogue: &Catalogue, disabled: &[String]) -> bool {
        self.choices(field, catalogue, disabled)
            .iter()
            .any(|c| c.enabled && c.value == value)
    }

    /// Set `field` to `value` if it is currently selectable. Returns whether
    /// the selection was accepted. Dependent add-ons are reconciled.
    pub fn select(
        &mut self,
        field: Field,
        value: &str,
        catalogue: &Catalogue,
        disabled: &[String],
    ) -> bool {
        if !fields_for(self.build_type).contains(&field)
            || !self.is_enabled(field, value, catalogue, disabled)
        {
            tracing::debug!(field = field.name(), value, "rejected unavailable selection");
            return false;
        }
        self.selections.insert(field, value.to_string());
        self.reconcile_addons(catalogue, disabled);
        true
    }

    fn reconcile_addons(&mut self, catalogue: &Catalogue, disabled: &[String]) {
        if self.get(Field::Item) == NONE {
            self.selections.insert(Field::Addon1, NONE.to_string());
            self.selections.insert(Field::Addon2, NONE.to_string());
            return;
        }
        for addon in [Field::Addon1, Field::Addon2] {
            let current = self.get(addon).to_string();
            if !self.is_enabled(addon, &current, catalogue, disabled) {
                self.selections.insert(addon, ANY.to_string());
            }
        }
    }

    /// Pick a random selectable value for `field` alone. Sentinels, disabled
    /// values and perks held by other slots are never drawn. Returns the new
    /// value, or `None` when nothing can be drawn.
    pub fn randomize<R: Rng + ?Sized>(
        &mut self,
        field: Field,
        catalogue: &Catalogue,
        disabled: &[String],
        rng: &mut R,
    ) -> Option<String> {
        if !fields_for(self.build_type).contains(&field) {
            return None;
        }
        let pool: Vec<String> = self
            .choices(field, catalogue, disabled)
            .into_iter()
            .filter(|c| c.enabled && !is_sentinel(&c.value))
            .map(|c| c.value)
            .collect();
        let picked = pool.choose(rng)?.clone();
        self.select(field, &picked, catalogue, disabled);
        Some(picked)
    }

    /// Outgoing record. Killer builds carry no item; a "None" item forces
    /// both add-ons to "None".
    pub fn to_record(&self, id: &str, submitter: &str) -> BuildRecord {
        let item = match self.build_type {
            BuildType::Killer => None,
            BuildType::Survivor => Some(self.get(Field::Item).to_string()),
        };
        let (addon1, addon2) = if self.get(Field::Item) == NONE {
            (NONE.to_string(), NONE.to_string())
        } else {
            (
                self.get(Field::Addon1).to_string(),
                self.get(Field::Addon2).to_string(),
            )
        };
        BuildRecord {
            id: id.to_string(),
            build_type: self.build_type,
            character: self.get(Field::Character).to_string(),
            item,
            addon1,
            addon2,
            perk1: self.get(Field::Perk1).to_string(),
            perk2: self.get(Field::Perk2).to_string(),
            perk3: self.get(Field::Perk3).to_string(),
            perk4: self.get(Field::Perk4).to_string(),
            offering: self.get(Field::Offering).to_string(),
            notes: self.notes.trim().to_string(),
            submitter: submitter.to_string(),
            completed: None,
            expires: None,
        }
    }
}
