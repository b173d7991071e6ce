use mentor::error::MentorError;
use mentor::intake::collector::{interpret_confirmation, parse_intake, reply_for, IntakeCollector};
use mentor::intake::types::{IntakeRecord, IntakeState, IntakeStep};

const SCENARIO_A: &str = "Project idea: Todo app\nTech stack: React\nSkill level: beginner\nTimeline: 2 weeks";

fn todo_record() -> IntakeRecord {
    IntakeRecord {
        project_idea: "Todo app".into(),
        tech_stack: "React".into(),
        skill_level: "beginner".into(),
        timeline: "2 weeks".into(),
    }
}

#[tokio::test]
async fn test_parse_any_order_with_noise() {
    let lines = [
        "Project idea: Todo app",
        "Tech stack: React",
        "Skill level: beginner",
        "Timeline: 2 weeks",
    ];
    // Every rotation, reversed, and with unrelated lines around.
    for shift in 0..lines.len() {
        let mut rotated: Vec<&str> = lines.iter().cycle().skip(shift).take(lines.len()).copied().collect();
        assert_eq!(parse_intake(&rotated.join("\n")).unwrap(), todo_record());

        rotated.reverse();
        let noisy = format!("Hi there!\n\n{}\nThanks: a lot\nsee you", rotated.join("\n"));
        assert_eq!(parse_intake(&noisy).unwrap(), todo_record());
    }
}

#[tokio::test]
async fn test_parse_aliases_and_key_shapes() {
    let text = "- PROJECT: Todo app\n* tech_stack : React\nSkill: beginner\ntime-frame: 2 weeks";
    assert_eq!(parse_intake(text).unwrap(), todo_record());

    let text = "idea: Todo app\ntechnology: React\nexperience: beginner\ndeadline: 2 weeks";
    assert_eq!(parse_intake(text).unwrap(), todo_record());
}

#[tokio::test]
async fn test_parse_value_keeps_inner_colons() {
    let text = "Project idea: Clock: with alarms\nTech stack: Rust\nSkill level: advanced\nTimeline: 1 month";
    assert_eq!(parse_intake(text).unwrap().project_idea, "Clock: with alarms");
}

#[tokio::test]
async fn test_parse_reports_missing_fields() {
    let err = parse_intake("Project idea: Todo app\nTech stack: React\nTimeline:   ").unwrap_err();
    match err {
        MentorError::IntakeParse { missing } => assert_eq!(missing, vec!["Skill level", "Timeline"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_later_duplicate_key_wins() {
    let text = format!("{}\nTimeline: 3 weeks", SCENARIO_A);
    assert_eq!(parse_intake(&text).unwrap().timeline, "3 weeks");
}

#[tokio::test]
async fn test_confirmation_is_exact() {
    assert!(interpret_confirmation("yes").unwrap());
    assert!(interpret_confirmation("  YES \n").unwrap());
    assert!(!interpret_confirmation("No").unwrap());
    for reply in ["yes please", "y", "yeah", "nope", "", "no!"] {
        assert!(
            matches!(interpret_confirmation(reply), Err(MentorError::ConfirmationMismatch { .. })),
            "{:?} must not count as yes/no",
            reply
        );
    }
}

#[tokio::test]
async fn test_scenario_a_echoes_values_and_asks() {
    let collector = IntakeCollector::new();
    let (step, next) = collector.assess(&IntakeState::Collecting, SCENARIO_A);

    assert_eq!(step, IntakeStep::Parsed(todo_record()));
    assert_eq!(next, IntakeState::AwaitingConfirmation(todo_record()));

    let reply = reply_for(&step).unwrap();
    for value in ["Todo app", "React", "beginner", "2 weeks"] {
        assert!(reply.contains(value), "echo is missing {:?}", value);
    }
    assert!(reply.contains("\"yes\"") && reply.contains("\"no\""));
}

#[tokio::test]
async fn test_incomplete_intake_stays_collecting() {
    let collector = IntakeCollector::new();
    let (step, next) = collector.assess(&IntakeState::Collecting, "I want to build a todo app");
    assert_eq!(step, IntakeStep::NeedsFormat);
    assert_eq!(next, IntakeState::Collecting);

    let reply = reply_for(&step).unwrap();
    for label in ["Project idea:", "Tech stack:", "Skill level:", "Timeline:"] {
        assert!(reply.contains(label));
    }
}

#[tokio::test]
async fn test_yes_confirms_no_discards_other_reasks() {
    let collector = IntakeCollector::new();
    let awaiting = IntakeState::AwaitingConfirmation(todo_record());

    let (step, next) = collector.assess(&awaiting, "Yes");
    assert_eq!(step, IntakeStep::Confirmed(todo_record()));
    assert_eq!(next, IntakeState::Confirmed(todo_record()));

    let (step, next) = collector.assess(&awaiting, "no");
    assert_eq!(step, IntakeStep::Rejected);
    assert_eq!(next, IntakeState::Collecting);

    // A fresh, complete intake while awaiting is not reparsed.
    let other = "Project idea: Chat\nTech stack: Go\nSkill level: expert\nTimeline: 1 day";
    let (step, next) = collector.assess(&awaiting, other);
    assert_eq!(step, IntakeStep::Reask(todo_record()));
    assert_eq!(next, awaiting);
}

#[tokio::test]
async fn test_confirmed_passes_through() {
    let collector = IntakeCollector::new();
    let confirmed = IntakeState::Confirmed(todo_record());
    let (step, next) = collector.assess(&confirmed, "yes");
    assert_eq!(step, IntakeStep::PassThrough);
    assert_eq!(next, confirmed);
    assert!(reply_for(&step).is_none());
}

#[tokio::test]
async fn test_yes_before_parse_never_confirms() {
    let collector = IntakeCollector::new();
    let (step, next) = collector.assess(&IntakeState::Collecting, "yes");
    assert_eq!(step, IntakeStep::NeedsFormat);
    assert_eq!(next, IntakeState::Collecting);
}
