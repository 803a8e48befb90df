//! Hand-labeled extraction fixtures, run through the public extractor.
//!
//! Every fixture resolves relative dates against Monday 2024-06-03.

use chrono::NaiveDate;

use task_router::extract::{ContentMetadata, ExtractedContent, Extractor};
use task_router::tasks::Priority;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn date(m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, m, d)
}

fn extract(raw: &str) -> ExtractedContent {
    Extractor::default().extract_on(raw, None, monday())
}

/// (input, expected number of tasks)
const LABELED: &[(&str, usize)] = &[
    ("", 0),
    ("The meeting went well.", 0),
    ("Thanks all.\nSee you soon.", 0),
    ("Fix the login bug. It's blocking customers.", 1),
    ("Carol will review the contract. Bob will be out next week.", 1),
    ("Bob, can you please send the slides? We need to migrate the database.", 2),
    (
        "Update the authentication system by Friday - this is critical. \
         Research payment providers and create a comparison report.",
        2,
    ),
    ("Send the agenda.\n\nsend the agenda.", 1),
    ("Call the vendor about plan B. Fix the login bug.", 2),
    ("Additionally, update the README. Lastly, book the venue.", 2),
    ("Customers can update their profile in settings.", 0),
];

#[test]
fn labeled_task_counts() {
    for (input, expected) in LABELED {
        let content = extract(input);
        assert_eq!(content.total_tasks(), *expected, "input: {input:?}");
        if *expected == 0 {
            assert!(content.is_empty());
            assert_eq!(content.summary, "No actionable items found in the text.");
        }
    }
}

#[test]
fn urgent_email_with_research_follow_up() {
    let meta = ContentMetadata::email()
        .with_sender("cto@example.com")
        .received_on(monday());
    let content = Extractor::default().extract_on(
        "Update the authentication system by Friday - this is critical. \
         Research payment providers and create a comparison report.",
        Some(&meta),
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    );

    assert!(content.projects.is_empty());
    let [auth, research] = content.standalone_tasks.as_slice() else {
        panic!("expected two standalone tasks, got {content:?}");
    };
    assert_eq!(auth.title, "Update the authentication system");
    assert_eq!(auth.priority, Priority::Critical);
    assert_eq!(auth.due_date, date(6, 7));
    assert_eq!(
        research.title,
        "Research payment providers and create a comparison report"
    );
    assert_eq!(research.priority, Priority::Medium);
    assert_eq!(research.due_date, None);
    assert_eq!(
        content.summary,
        "Extracted 2 tasks from the email from cto@example.com."
    );
}

#[test]
fn shared_deliverable_becomes_project() {
    let content = extract(
        "Prepare slides for the Q3 product launch. Research payment providers. \
         Book the venue for the Q3 product launch.",
    );

    assert_eq!(content.projects.len(), 1);
    let launch = &content.projects[0];
    assert_eq!(launch.name, "Q3 Product Launch");
    assert_eq!(launch.tasks.len(), 2);
    assert_eq!(content.standalone_tasks.len(), 1);
    assert_eq!(
        content.summary,
        "Extracted 3 tasks across 1 project from the text."
    );
}

#[test]
fn meeting_notes_with_headings() {
    let content = extract(
        "Project: Website redesign\n\
         - Draft the wireframes by Friday\n\
         - Review the copy\n\
         \n\
         Action items:\n\
         - Renew the SSL certificate",
    );

    assert_eq!(content.projects.len(), 1);
    assert_eq!(content.projects[0].name, "Website redesign");
    let titles: Vec<_> = content.projects[0]
        .tasks
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Draft the wireframes", "Review the copy"]);
    assert_eq!(content.projects[0].tasks[0].due_date, date(6, 7));

    // A generic heading never becomes a project.
    assert_eq!(content.standalone_tasks.len(), 1);
    assert_eq!(content.standalone_tasks[0].title, "Renew the SSL certificate");
}

#[test]
fn transcript_assigns_speakers_and_addressees() {
    let meta = ContentMetadata::transcript();
    let content = Extractor::default().extract_on(
        "Alice: I'll draft the proposal by next week.\nBob: Carol, can you book the room?",
        Some(&meta),
        monday(),
    );

    let tasks = &content.standalone_tasks;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].assignee.as_deref(), Some("Alice"));
    assert_eq!(tasks[0].due_date, date(6, 10));
    assert_eq!(tasks[1].assignee.as_deref(), Some("Carol"));
}

#[test]
fn addressee_owns_the_request() {
    let content = extract("Bob, can you please send the slides?");
    let task = &content.standalone_tasks[0];
    assert_eq!(task.title, "Send the slides");
    assert_eq!(task.assignee.as_deref(), Some("Bob"));
}

#[test]
fn list_intro_is_not_a_project() {
    let content = extract("A few things for this week:\n- Send the notes\n- Book the room");
    assert!(content.projects.is_empty());
    assert_eq!(content.standalone_tasks.len(), 2);
}
