//! Validation behaviour through the service
//!
//! Every rejected request must leave the store untouched.

use labflow_confirm::prelude::*;
use labflow_model::{CommentId, SampleId, WorkStatus};
use labflow_store::MemoryStore;
use labflow_test_utils::{
    addr, section_op, transfer_op, user, LabBuilder, PlanStep,
};
use pretty_assertions::assert_eq;

/// Confirm, expect rejection, and check nothing was written
fn rejected(service: &ConfirmService<MemoryStore>, request: &ConfirmationRequest) -> Vec<String> {
    let before = service.store().snapshot();
    let err = service.confirm(&user(), request).unwrap_err();
    assert!(err.is_user_correctable(), "unexpected error: {err}");
    assert_eq!(service.store().snapshot(), before);
    assert_eq!(service.store().version(), 0);
    err.problems().unwrap().to_vec()
}

fn has(problems: &[String], needle: &str) -> bool {
    problems.iter().any(|p| p.contains(needle))
}

/// Block with watermark, an empty slide, and a sectioning plan into A1 and A2
fn sectioning_lab(watermark: Option<i32>) -> (LabBuilder, SampleId) {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", watermark);
    let slide = lab.slide("SLIDE-1");
    lab.plan(
        section_op(),
        &[
            PlanStep::new(&block, "A1", &slide, "A1"),
            PlanStep::new(&block, "A1", &slide, "A2"),
        ],
    );
    let sample_id = block.slots[0].samples[0].id;
    (lab, sample_id)
}

#[test]
fn empty_request_is_rejected() {
    let lab = LabBuilder::new();
    let problems = rejected(&lab.service(), &ConfirmationRequest::new(vec![]));
    assert_eq!(problems, ["No labware specified."]);
}

#[test]
fn barcode_problems_are_reported() {
    let (lab, _) = sectioning_lab(None);
    let request = ConfirmationRequest::new(vec![
        LabwareConfirmation::planned("", vec![]),
        LabwareConfirmation::planned("SLIDE-1", vec![]),
        LabwareConfirmation::planned("slide-1", vec![]),
        LabwareConfirmation::planned("NOPE-9", vec![]),
    ]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Missing labware barcode."));
    assert!(has(&problems, "Repeated barcode: slide-1."));
    assert!(has(&problems, "Unknown labware barcode: NOPE-9."));
}

#[test]
fn each_bad_labware_state_is_its_own_problem() {
    let (mut lab, _) = sectioning_lab(None);
    let mut tube = lab.section_tube("TUBE-1", 3);
    tube.destroyed = true;
    tube.discarded = true;
    lab.update(&tube);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned("TUBE-1", vec![])]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Labware TUBE-1 is destroyed."));
    assert!(has(&problems, "Labware TUBE-1 is discarded."));
    assert!(has(&problems, "Labware TUBE-1 is not empty."));
    assert!(has(&problems, "No plan found for labware TUBE-1."));
}

#[test]
fn multiple_plans_are_rejected() {
    let (mut lab, _) = sectioning_lab(None);
    let tube = lab.section_tube("TUBE-1", 3);
    let slide = lab.snapshot().labware_by_barcode("SLIDE-1").cloned().unwrap();
    lab.plan(transfer_op(), &[PlanStep::new(&tube, "A1", &slide, "A3")]);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned("SLIDE-1", vec![])]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(problems, ["Multiple plans found for labware SLIDE-1."]);
}

#[test]
fn sectioning_requires_block_source() {
    let mut lab = LabBuilder::new();
    let tube = lab.section_tube("TUBE-1", 3);
    let slide = lab.slide("SLIDE-1");
    lab.plan(section_op(), &[PlanStep::new(&tube, "A1", &slide, "A1").section(4)]);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned("SLIDE-1", vec![])]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        ["Operation Section requires a block source; labware SLIDE-1 is planned from non-block slots: TUBE-1 A1."]
    );
}

#[test]
fn repeated_section_number_from_one_sample() {
    let (lab, sample) = sectioning_lab(None);
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            ConfirmedSection::new(addr("A1"), sample, 5),
            ConfirmedSection::new(addr("A2"), sample, 5),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(problems, [format!("Repeated section number 5 from sample id {sample}.")]);
}

#[test]
fn repeated_section_number_across_labware() {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", None);
    let first = lab.slide("SLIDE-1");
    let second = lab.slide("SLIDE-2");
    lab.plan(section_op(), &[PlanStep::new(&block, "A1", &first, "A1")]);
    lab.plan(section_op(), &[PlanStep::new(&block, "A1", &second, "A1")]);
    let sample = block.slots[0].samples[0].id;

    let request = ConfirmationRequest::new(vec![
        LabwareConfirmation::sections("SLIDE-1", vec![ConfirmedSection::new(addr("A1"), sample, 8)]),
        LabwareConfirmation::sections("SLIDE-2", vec![ConfirmedSection::new(addr("A1"), sample, 8)]),
    ]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Repeated section number 8"));
}

#[test]
fn section_at_or_below_watermark() {
    let (lab, sample) = sectioning_lab(Some(10));
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            ConfirmedSection::new(addr("A1"), sample, 10),
            ConfirmedSection::new(addr("A2"), sample, 11),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        [format!("Section numbers from sample id {sample} must be greater than 10: [10].")]
    );
}

#[test]
fn section_field_problems() {
    let (lab, sample) = sectioning_lab(None);
    let mut no_sample = ConfirmedSection::new(addr("A1"), sample, 1);
    no_sample.sample_id = None;
    let mut no_section = ConfirmedSection::new(addr("A2"), sample, 1);
    no_section.new_section = None;

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            no_sample,
            no_section,
            ConfirmedSection::new(addr("A3"), sample, -1),
            ConfirmedSection::new(addr("H9"), sample, 2),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Sample id not specified."));
    assert!(has(&problems, "Section number not specified."));
    assert!(has(&problems, "Section number cannot be less than zero."));
    assert!(has(&problems, "Invalid address H9 in labware SLIDE-1."));
    assert!(has(
        &problems,
        &format!("No planned action recorded for sample {sample} in slot A3 of labware SLIDE-1.")
    ));
}

#[test]
fn repeated_placement_within_labware() {
    let (lab, sample) = sectioning_lab(None);
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            ConfirmedSection::new(addr("A1"), sample, 1),
            ConfirmedSection::new(addr("A1"), sample, 2),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        [format!("Repeated section: sample {sample} in slot A1 of labware SLIDE-1.")]
    );
}

#[test]
fn region_problems() {
    let (mut lab, sample) = sectioning_lab(None);
    lab.region(1, "Top", true);
    lab.region(2, "Middle", false);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            ConfirmedSection::new(addr("A1"), sample, 1).with_region("top"),
            ConfirmedSection::new(addr("A2"), sample, 2).with_region("Middle"),
            ConfirmedSection::new(addr("A2"), sample, 3).with_region("Side"),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Region Middle is disabled."));
    assert!(has(&problems, "Unknown region: Side."));
    assert!(!problems.iter().any(|p| p.contains("top")));
}

#[test]
fn region_used_twice_at_one_address() {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", None);
    let other = lab.block("BLOCK-2", None);
    let slide = lab.slide("SLIDE-1");
    lab.plan(
        section_op(),
        &[
            PlanStep::new(&block, "A1", &slide, "A1"),
            PlanStep::new(&other, "A1", &slide, "A1"),
        ],
    );
    lab.region(1, "Top", true);
    let s1 = block.slots[0].samples[0].id;
    let s2 = other.slots[0].samples[0].id;

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![
            ConfirmedSection::new(addr("A1"), s1, 1).with_region("Top"),
            ConfirmedSection::new(addr("A1"), s2, 1).with_region("Top"),
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(problems, ["Region Top specified twice for A1 in labware SLIDE-1."]);
}

#[test]
fn comment_problems() {
    let (mut lab, sample) = sectioning_lab(None);
    lab.comment(1, "Folded", true);
    lab.comment(2, "Retired", false);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![ConfirmedSection::new(addr("A1"), sample, 1).with_comments(vec![CommentId(2), CommentId(9)])],
    )
    .with_address_comment(addr("A1"), CommentId(1))
    .with_address_comment(addr("A4"), CommentId(1))]);
    let problems = rejected(&lab.service(), &request);
    assert!(has(&problems, "Unknown comment IDs: [9]."));
    assert!(has(&problems, "Comments not enabled: [2]."));
    assert!(has(
        &problems,
        "No planned action recorded for address A4 in labware SLIDE-1, specified in comments."
    ));
}

#[test]
fn work_problems() {
    let (mut lab, _) = sectioning_lab(None);
    lab.work("SGP1", WorkStatus::Paused);
    let service = lab.service();

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::cancelled("SLIDE-1")])
        .with_work_number("SGP1");
    assert_eq!(
        rejected(&service, &request),
        ["Work SGP1 cannot be used because it is paused."]
    );

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::cancelled("SLIDE-1")])
        .with_work_number("SGP404");
    assert_eq!(rejected(&service, &request), ["Unknown work number: SGP404."]);
}

#[test]
fn work_number_can_be_mandatory() {
    let (lab, _) = sectioning_lab(None);
    let lab = lab.with_config(EngineConfig::new().with_required_work_number(true));
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::cancelled("SLIDE-1")]);
    assert_eq!(rejected(&lab.service(), &request), ["A work number is required."]);
}

#[test]
fn cancelled_labware_skips_section_checks() {
    let (lab, sample) = sectioning_lab(None);
    let mut conf = LabwareConfirmation::sections(
        "SLIDE-1",
        vec![ConfirmedSection::new(addr("H9"), sample, -3)],
    );
    conf.cancelled = true;
    let validated = lab.service().validate(&ConfirmationRequest::new(vec![conf]));
    assert!(validated.is_valid(), "{:?}", validated.problems);
}

#[test]
fn cancellations_must_match_plan() {
    let (lab, sample) = sectioning_lab(None);
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned(
        "SLIDE-1",
        vec![
            CancelledAction {
                destination_address: addr("A3"),
                sample_id: sample,
                new_section: None,
            },
            CancelledAction {
                destination_address: addr("Z1"),
                sample_id: sample,
                new_section: None,
            },
        ],
    )]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        [
            format!("No planned action matches cancelled sample {sample} in slot A3 of labware SLIDE-1."),
            "Invalid address Z1 in labware SLIDE-1.".to_string(),
        ]
    );
}

#[test]
fn fetal_waste_needs_no_section_number() {
    let mut lab = LabBuilder::new();
    let tube = lab.section_tube("TUBE-1", 4);
    let waste = lab.fetal_waste("FW-1");
    lab.plan(transfer_op(), &[PlanStep::new(&tube, "A1", &waste, "A1")]);
    let sample = tube.slots[0].samples[0].id;

    let mut section = ConfirmedSection::new(addr("A1"), sample, 0);
    section.new_section = None;
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections("FW-1", vec![section])]);
    let validated = lab.service().validate(&request);
    assert!(validated.is_valid(), "{:?}", validated.problems);
}

#[test]
fn fetal_waste_section_number_is_checked_when_given() {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", Some(10));
    let first = lab.fetal_waste("FW-1");
    let second = lab.fetal_waste("FW-2");
    lab.plan(section_op(), &[PlanStep::new(&block, "A1", &first, "A1")]);
    lab.plan(section_op(), &[PlanStep::new(&block, "A1", &second, "A1")]);
    let sample = block.slots[0].samples[0].id;

    let request = ConfirmationRequest::new(vec![
        LabwareConfirmation::sections("FW-1", vec![ConfirmedSection::new(addr("A1"), sample, -4)]),
        LabwareConfirmation::sections("FW-2", vec![ConfirmedSection::new(addr("A1"), sample, 7)]),
    ]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        [
            "Section number cannot be less than zero.".to_string(),
            format!("Section numbers from sample id {sample} must be greater than 10: [7]."),
        ]
    );
}

#[test]
fn planned_sections_must_exceed_watermark() {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", Some(10));
    let slide = lab.slide("SLIDE-1");
    lab.plan(
        section_op(),
        &[
            PlanStep::new(&block, "A1", &slide, "A1").section(3),
            PlanStep::new(&block, "A1", &slide, "A2").section(11),
        ],
    );
    let sample = block.slots[0].samples[0].id;

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned("SLIDE-1", vec![])]);
    let problems = rejected(&lab.service(), &request);
    assert_eq!(
        problems,
        [format!("Section numbers from sample id {sample} must be greater than 10: [3].")]
    );
}

#[test]
fn planned_sections_must_be_distinct_unless_cancelled() {
    let mut lab = LabBuilder::new();
    let block = lab.block("BLOCK-1", None);
    let slide = lab.slide("SLIDE-1");
    lab.plan(
        section_op(),
        &[
            PlanStep::new(&block, "A1", &slide, "A1").section(5),
            PlanStep::new(&block, "A1", &slide, "A2").section(5),
        ],
    );
    let sample = block.slots[0].samples[0].id;
    let service = lab.service();

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned("SLIDE-1", vec![])]);
    let problems = rejected(&service, &request);
    assert_eq!(problems, [format!("Repeated section number 5 from sample id {sample}.")]);

    let request = ConfirmationRequest::new(vec![LabwareConfirmation::planned(
        "SLIDE-1",
        vec![CancelledAction {
            destination_address: addr("A2"),
            sample_id: sample,
            new_section: None,
        }],
    )]);
    let validated = service.validate(&request);
    assert!(validated.is_valid(), "{:?}", validated.problems);
}

#[test]
fn all_problems_reported_together() {
    let (mut lab, sample) = sectioning_lab(Some(4));
    lab.work("SGP2", WorkStatus::Completed);
    let request = ConfirmationRequest::new(vec![
        LabwareConfirmation::sections("SLIDE-1", vec![ConfirmedSection::new(addr("A1"), sample, 2)]),
        LabwareConfirmation::planned("GHOST-1", vec![]),
    ])
    .with_work_number("SGP2");

    let problems = rejected(&lab.service(), &request);
    assert_eq!(problems.len(), 3, "{problems:?}");
    assert!(has(&problems, "Unknown labware barcode: GHOST-1."));
    assert!(has(&problems, "must be greater than 4"));
    assert!(has(&problems, "cannot be used because it is completed"));
}

#[test]
fn validate_is_a_dry_run() {
    let (lab, sample) = sectioning_lab(None);
    let service = lab.service();
    let request = ConfirmationRequest::new(vec![LabwareConfirmation::sections(
        "SLIDE-1",
        vec![ConfirmedSection::new(addr("A1"), sample, 1)],
    )]);

    let before = service.store().snapshot();
    let validated = service.validate(&request);
    assert!(validated.is_valid());
    assert!(validated.labware_for("slide-1").is_some());
    assert_eq!(service.store().snapshot(), before);
    assert_eq!(service.store().version(), 0);
}
