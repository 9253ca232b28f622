//! Confirmation validator
//!
//! Checks a request against the current store contents without writing
//! anything. Every rule is evaluated and every violation collected; missing
//! prerequisite data (an unknown barcode, a labware with no plan) only
//! suppresses the checks that depend on it.

use crate::config::EngineConfig;
use crate::error::ValidationFailure;
use crate::request::{
    AddressComment, CancelledAction, ConfirmationRequest, ConfirmedSection, LabwareConfirmation,
    ActionSelection,
};
use crate::validation::plan_lookup::PlanLookup;
use indexmap::{IndexMap, IndexSet};
use labflow_model::{
    Address, Comment, CommentId, Labware, LabwareId, PlanOperation, SampleId, SlotId,
    SlotRegion, Work,
};
use labflow_store::LabRead;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Normalised key for barcodes, region names and work numbers
pub(crate) fn lookup_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Everything validation loaded, plus the problems it found
///
/// The reconciler works from this rather than reloading, so validation and
/// execution see the same labware, plans, regions and comments.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRequest {
    /// Distinct problems in the order found
    pub problems: IndexSet<String>,
    /// Labware keyed by upper-cased barcode, in request order
    pub labware: IndexMap<String, Labware>,
    /// Unique plan per labware
    pub plans: HashMap<LabwareId, PlanOperation>,
    /// Enabled regions keyed by upper-cased name
    pub regions: HashMap<String, SlotRegion>,
    /// Comments named anywhere in the request
    pub comments: HashMap<CommentId, Comment>,
    /// Usable work record, if a work number was given
    pub work: Option<Work>,
}

impl ValidatedRequest {
    /// Check if no problems were found
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, message: impl Into<String>) {
        self.problems.insert(message.into());
    }

    /// Labware loaded for a barcode
    #[must_use]
    pub fn labware_for(&self, barcode: &str) -> Option<&Labware> {
        self.labware.get(&lookup_key(barcode))
    }

    /// Plan loaded for a labware
    #[inline]
    #[must_use]
    pub fn plan_for(&self, labware_id: LabwareId) -> Option<&PlanOperation> {
        self.plans.get(&labware_id)
    }

    /// Region loaded for a name
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&SlotRegion> {
        self.regions.get(&lookup_key(name))
    }

    /// Convert problems into a failure, or `None` if there are none
    #[must_use]
    pub fn failure(&self) -> Option<ValidationFailure> {
        if self.problems.is_empty() {
            return None;
        }
        Some(ValidationFailure::new(
            "The confirmation request could not be validated.",
            self.problems.clone(),
        ))
    }
}

/// Section numbers requested per source sample across the whole request
#[derive(Debug, Default)]
struct SectionTally {
    by_sample: BTreeMap<SampleId, TalliedSections>,
}

#[derive(Debug, Default)]
struct TalliedSections {
    numbers: Vec<i32>,
    source_slots: BTreeSet<SlotId>,
}

impl SectionTally {
    fn record(&mut self, sample_id: SampleId, source_slot: SlotId, section: i32) {
        let entry = self.by_sample.entry(sample_id).or_default();
        entry.numbers.push(section);
        entry.source_slots.insert(source_slot);
    }
}

/// Request validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: EngineConfig,
}

impl Validator {
    /// Create a validator with the given configuration
    #[inline]
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Validate a request against the store
    ///
    /// Never writes. The returned [`ValidatedRequest`] carries every problem
    /// found together with the records loaded along the way.
    #[tracing::instrument(skip_all, fields(labware = request.labware.len()))]
    pub fn validate<R: LabRead + ?Sized>(
        &self,
        store: &R,
        request: &ConfirmationRequest,
    ) -> ValidatedRequest {
        let mut out = ValidatedRequest::default();

        if request.labware.is_empty() {
            out.problem("No labware specified.");
        }
        if self.config.require_work_number && request.work_number.is_none() {
            out.problem("A work number is required.");
        }

        self.load_labware(store, &request.labware, &mut out);
        self.check_labware_states(&mut out);

        let loaded: Vec<&Labware> = out.labware.values().collect();
        let lookup = PlanLookup::find(store, &loaded);
        for problem in lookup.problems {
            out.problem(problem);
        }
        out.plans = lookup.plans;

        self.check_block_sources(store, &mut out);

        let mut tally = SectionTally::default();
        let mut comment_ids: BTreeSet<CommentId> = BTreeSet::new();
        for conf in &request.labware {
            self.check_confirmation(store, conf, &mut out, &mut tally, &mut comment_ids);
        }

        self.check_section_numbers(store, &tally, &mut out);
        self.load_comments(store, &comment_ids, &mut out);
        self.load_work(store, request.work_number.as_deref(), &mut out);

        tracing::debug!(problems = out.problems.len(), "validation finished");
        out
    }

    fn load_labware<R: LabRead + ?Sized>(
        &self,
        store: &R,
        confirmations: &[LabwareConfirmation],
        out: &mut ValidatedRequest,
    ) {
        let mut seen = HashSet::new();
        for conf in confirmations {
            let barcode = conf.barcode.trim();
            if barcode.is_empty() {
                out.problem("Missing labware barcode.");
                continue;
            }
            let key = lookup_key(barcode);
            if !seen.insert(key.clone()) {
                out.problem(format!("Repeated barcode: {barcode}."));
                continue;
            }
            match store.labware_by_barcode(barcode) {
                Some(labware) => {
                    out.labware.insert(key, labware);
                }
                None => out.problem(format!("Unknown labware barcode: {barcode}.")),
            }
        }
    }

    fn check_labware_states(&self, out: &mut ValidatedRequest) {
        let mut problems = Vec::new();
        for lw in out.labware.values() {
            let bc = &lw.barcode;
            if lw.destroyed {
                problems.push(format!("Labware {bc} is destroyed."));
            }
            if lw.released {
                problems.push(format!("Labware {bc} is released."));
            }
            if lw.discarded {
                problems.push(format!("Labware {bc} is discarded."));
            }
            if lw.used {
                problems.push(format!("Labware {bc} is already used."));
            }
            if !lw.is_empty() {
                problems.push(format!("Labware {bc} is not empty."));
            }
        }
        for problem in problems {
            out.problem(problem);
        }
    }

    /// Sectioning plans must draw from block slots; one problem per labware
    fn check_block_sources<R: LabRead + ?Sized>(&self, store: &R, out: &mut ValidatedRequest) {
        let mut problems = Vec::new();
        for lw in out.labware.values() {
            let Some(plan) = out.plans.get(&lw.id) else {
                continue;
            };
            if !plan.operation_type.source_is_block {
                continue;
            }
            let mut offenders: BTreeSet<(LabwareId, Address)> = BTreeSet::new();
            for action in plan.actions_into(lw.id) {
                let is_block = store
                    .slot(action.source.slot_id)
                    .is_some_and(|slot| slot.is_block());
                if !is_block {
                    offenders.insert((action.source.labware_id, action.source.address));
                }
            }
            if !offenders.is_empty() {
                let listed: Vec<String> = offenders
                    .iter()
                    .map(|(id, address)| {
                        let barcode = store
                            .labware(*id)
                            .map_or_else(|| format!("#{id}"), |src| src.barcode);
                        format!("{barcode} {address}")
                    })
                    .collect();
                problems.push(format!(
                    "Operation {} requires a block source; labware {} is planned from non-block slots: {}.",
                    plan.operation_type.name,
                    lw.barcode,
                    listed.join(", ")
                ));
            }
        }
        for problem in problems {
            out.problem(problem);
        }
    }

    fn check_confirmation<R: LabRead + ?Sized>(
        &self,
        store: &R,
        conf: &LabwareConfirmation,
        out: &mut ValidatedRequest,
        tally: &mut SectionTally,
        comment_ids: &mut BTreeSet<CommentId>,
    ) {
        comment_ids.extend(conf.address_comments.iter().map(|ac| ac.comment_id));
        if let ActionSelection::Sections { sections } = &conf.selection {
            if !conf.cancelled {
                comment_ids.extend(sections.iter().flat_map(|s| s.comment_ids.iter().copied()));
            }
        }

        let Some(lw) = out.labware_for(&conf.barcode).cloned() else {
            return;
        };
        let plan = out.plan_for(lw.id).cloned();

        self.check_address_comments(&conf.address_comments, &lw, plan.as_ref(), out);

        if conf.cancelled {
            return;
        }
        match &conf.selection {
            ActionSelection::Sections { sections } => {
                self.check_sections(store, sections, &lw, plan.as_ref(), out, tally);
            }
            ActionSelection::Planned { cancelled } => {
                self.check_cancellations(cancelled, &lw, plan.as_ref(), out, tally);
            }
        }
    }

    fn check_address_comments(
        &self,
        comments: &[AddressComment],
        lw: &Labware,
        plan: Option<&PlanOperation>,
        out: &mut ValidatedRequest,
    ) {
        for ac in comments {
            if !lw.labware_type.contains(ac.address) {
                out.problem(format!(
                    "Invalid address {} in labware {}, specified in comments.",
                    ac.address, lw.barcode
                ));
                continue;
            }
            let Some(plan) = plan else {
                continue;
            };
            if !plan
                .actions_into(lw.id)
                .any(|a| a.destination.address == ac.address)
            {
                out.problem(format!(
                    "No planned action recorded for address {} in labware {}, specified in comments.",
                    ac.address, lw.barcode
                ));
            }
        }
    }

    fn check_sections<R: LabRead + ?Sized>(
        &self,
        store: &R,
        sections: &[ConfirmedSection],
        lw: &Labware,
        plan: Option<&PlanOperation>,
        out: &mut ValidatedRequest,
        tally: &mut SectionTally,
    ) {
        let fetal_waste = self.config.is_fetal_waste(&lw.labware_type.name);
        let mut seen_placements: HashSet<(Address, SampleId)> = HashSet::new();
        let mut seen_regions: HashSet<(Address, String)> = HashSet::new();

        for section in sections {
            let address = section.destination_address;
            let address_ok = lw.labware_type.contains(address);
            if !address_ok {
                out.problem(format!("Invalid address {address} in labware {}.", lw.barcode));
            }

            // Fetal waste may omit the number, but a supplied one is checked like any other
            match section.new_section {
                None if !fetal_waste => out.problem("Section number not specified."),
                Some(n) if n < 0 => out.problem("Section number cannot be less than zero."),
                _ => {}
            }

            match section.sample_id {
                None => out.problem("Sample id not specified."),
                Some(sample_id) if address_ok => {
                    if !seen_placements.insert((address, sample_id)) {
                        out.problem(format!(
                            "Repeated section: sample {sample_id} in slot {address} of labware {}.",
                            lw.barcode
                        ));
                    } else if let Some(plan) = plan {
                        match plan.find_action(lw.id, address, sample_id) {
                            None => out.problem(format!(
                                "No planned action recorded for sample {sample_id} in slot {address} of labware {}.",
                                lw.barcode
                            )),
                            Some(action) => {
                                if let Some(n) = section.new_section.filter(|n| *n >= 0) {
                                    tally.record(sample_id, action.source.slot_id, n);
                                }
                            }
                        }
                    }
                }
                Some(_) => {}
            }

            if let Some(name) = section.region.as_deref().map(str::trim) {
                self.check_region(store, name, address, address_ok, lw, out, &mut seen_regions);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_region<R: LabRead + ?Sized>(
        &self,
        store: &R,
        name: &str,
        address: Address,
        address_ok: bool,
        lw: &Labware,
        out: &mut ValidatedRequest,
        seen: &mut HashSet<(Address, String)>,
    ) {
        if name.is_empty() {
            return;
        }
        let key = lookup_key(name);
        if !out.regions.contains_key(&key) {
            match store.region_by_name(name) {
                None => out.problem(format!("Unknown region: {name}.")),
                Some(region) if !region.enabled => {
                    out.problem(format!("Region {} is disabled.", region.name));
                }
                Some(region) => {
                    out.regions.insert(key.clone(), region);
                }
            }
        }
        if address_ok && !seen.insert((address, key)) {
            out.problem(format!(
                "Region {name} specified twice for {address} in labware {}.",
                lw.barcode
            ));
        }
    }

    fn check_cancellations(
        &self,
        cancelled: &[CancelledAction],
        lw: &Labware,
        plan: Option<&PlanOperation>,
        out: &mut ValidatedRequest,
        tally: &mut SectionTally,
    ) {
        for cancel in cancelled {
            let address = cancel.destination_address;
            if !lw.labware_type.contains(address) {
                out.problem(format!("Invalid address {address} in labware {}.", lw.barcode));
                continue;
            }
            let Some(plan) = plan else {
                continue;
            };
            if !plan.actions_into(lw.id).any(|a| cancel.matches(a)) {
                out.problem(format!(
                    "No planned action matches cancelled sample {} in slot {address} of labware {}.",
                    cancel.sample_id, lw.barcode
                ));
            }
        }

        // Surviving actions cut their planned sections
        let Some(plan) = plan else {
            return;
        };
        for action in plan
            .actions_into(lw.id)
            .filter(|a| !cancelled.iter().any(|c| c.matches(a)))
        {
            if let Some(n) = action.new_section {
                tally.record(action.sample.id, action.source.slot_id, n);
            }
        }
    }

    /// Section numbers per sample must be distinct and above the block watermark
    fn check_section_numbers<R: LabRead + ?Sized>(
        &self,
        store: &R,
        tally: &SectionTally,
        out: &mut ValidatedRequest,
    ) {
        for (sample_id, tallied) in &tally.by_sample {
            let mut seen = BTreeSet::new();
            let mut repeated = BTreeSet::new();
            for &n in &tallied.numbers {
                if !seen.insert(n) {
                    repeated.insert(n);
                }
            }
            for n in repeated {
                out.problem(format!("Repeated section number {n} from sample id {sample_id}."));
            }

            let watermark = tallied
                .source_slots
                .iter()
                .filter_map(|id| store.slot(*id))
                .filter_map(|slot| slot.block_highest_section)
                .max();
            if let Some(watermark) = watermark {
                let too_low: Vec<i32> = seen.into_iter().filter(|n| *n <= watermark).collect();
                if !too_low.is_empty() {
                    out.problem(format!(
                        "Section numbers from sample id {sample_id} must be greater than {watermark}: {too_low:?}."
                    ));
                }
            }
        }
    }

    fn load_comments<R: LabRead + ?Sized>(
        &self,
        store: &R,
        ids: &BTreeSet<CommentId>,
        out: &mut ValidatedRequest,
    ) {
        if ids.is_empty() {
            return;
        }
        let wanted: Vec<CommentId> = ids.iter().copied().collect();
        let found: HashMap<CommentId, Comment> = store
            .comments(&wanted)
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let missing: Vec<i64> = wanted
            .iter()
            .filter(|id| !found.contains_key(id))
            .map(|id| id.get())
            .collect();
        if !missing.is_empty() {
            out.problem(format!("Unknown comment IDs: {missing:?}."));
        }
        let disabled: Vec<i64> = wanted
            .iter()
            .filter(|id| found.get(id).is_some_and(|c| !c.enabled))
            .map(|id| id.get())
            .collect();
        if !disabled.is_empty() {
            out.problem(format!("Comments not enabled: {disabled:?}."));
        }
        out.comments = found;
    }

    fn load_work<R: LabRead + ?Sized>(
        &self,
        store: &R,
        work_number: Option<&str>,
        out: &mut ValidatedRequest,
    ) {
        let Some(work_number) = work_number.map(str::trim) else {
            return;
        };
        if work_number.is_empty() {
            out.problem("Work number is blank.");
            return;
        }
        match store.work_by_number(work_number) {
            None => out.problem(format!("Unknown work number: {work_number}.")),
            Some(work) if !work.status.is_usable() => out.problem(format!(
                "Work {} cannot be used because it is {}.",
                work.work_number, work.status
            )),
            Some(work) => out.work = Some(work),
        }
    }
}
