//! Plan lookup
//!
//! Finds the single plan targeting each piece of labware.

use labflow_model::{Labware, LabwareId, PlanOperation};
use labflow_store::LabRead;
use std::collections::{BTreeMap, HashMap};

/// Plans found for a set of labware
#[derive(Debug, Clone, Default)]
pub struct PlanLookup {
    /// Labware with exactly one plan
    pub plans: HashMap<LabwareId, PlanOperation>,
    /// One problem per labware with zero or several plans
    pub problems: Vec<String>,
}

impl PlanLookup {
    /// Group plans by destination labware and keep the unambiguous ones
    pub fn find<R: LabRead + ?Sized>(store: &R, labware: &[&Labware]) -> Self {
        if labware.is_empty() {
            return Self::default();
        }
        let ids: Vec<LabwareId> = labware.iter().map(|lw| lw.id).collect();

        let mut by_destination: BTreeMap<LabwareId, Vec<PlanOperation>> = BTreeMap::new();
        for plan in store.plans_targeting(&ids) {
            for &id in &ids {
                if plan.targets(id) {
                    by_destination.entry(id).or_default().push(plan.clone());
                }
            }
        }

        let mut lookup = Self::default();
        for lw in labware {
            match by_destination.remove(&lw.id) {
                None => lookup
                    .problems
                    .push(format!("No plan found for labware {}.", lw.barcode)),
                Some(mut plans) if plans.len() == 1 => {
                    if let Some(plan) = plans.pop() {
                        lookup.plans.insert(lw.id, plan);
                    }
                }
                Some(_) => lookup
                    .problems
                    .push(format!("Multiple plans found for labware {}.", lw.barcode)),
            }
        }
        lookup
    }
}
