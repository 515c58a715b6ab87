//! In-memory implementation of ModificationLookup.

use crate::store::MemoryHistory;
use gantry_core::Result;
use gantry_core::ids::StageIdentifier;
use gantry_core::material::MaterialConfig;
use gantry_core::ports::ModificationLookup;
use gantry_core::revision::{MaterialRevision, MaterialRevisions, Modification, Revision};

impl ModificationLookup for MemoryHistory {
    fn modifications_for(&self, stage: &StageIdentifier) -> Result<Vec<Modification>> {
        Ok(self
            .stage_modifications
            .get(&stage.stage_locator())
            .cloned()
            .unwrap_or_default())
    }

    fn modifications_since(
        &self,
        material: &MaterialConfig,
        from: &Revision,
        until: Option<&Revision>,
    ) -> Result<Vec<Modification>> {
        let Some(mods) = self.modifications.get(&material.fingerprint()) else {
            return Ok(Vec::new());
        };
        Ok(mods
            .iter()
            .rev()
            .filter(|m| {
                let revision = m.to_revision();
                &revision > from && until.is_none_or(|until| &revision <= until)
            })
            .cloned()
            .collect())
    }

    fn modification_at(&self, material: &MaterialConfig, revision: &str) -> Result<Option<Modification>> {
        Ok(self.modification_by_revision(material, revision).cloned())
    }

    fn latest_modifications(&self, materials: &[MaterialConfig]) -> Result<MaterialRevisions> {
        Ok(materials
            .iter()
            .filter_map(|material| {
                self.modifications
                    .get(&material.fingerprint())
                    .and_then(|mods| mods.last())
                    .map(|latest| MaterialRevision::new(material.clone(), vec![latest.clone()]))
            })
            .collect())
    }
}
