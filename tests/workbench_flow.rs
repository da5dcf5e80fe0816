use chrono::NaiveTime;
use rollbookd::catalog::{ClassId, SessionId, StudentId, SubjectId, TeachingSession, Weekday};
use rollbookd::roster::Student;
use rollbookd::scope::{
    AssessmentKind, AttendanceStatus, GradeScore, PeriodKey, RecordValue, ScopeKey,
};
use rollbookd::service::MemoryRecordService;
use rollbookd::workbench::{SubmitOutcome, Workbench};

fn seeded_service() -> MemoryRecordService {
    rollbookd::logging::init_test();
    let service = MemoryRecordService::new();
    service.seed_session(TeachingSession {
        id: SessionId(1),
        day: Weekday::Tuesday,
        start_time: "07:30:00".parse::<NaiveTime>().expect("time"),
        end_time: "09:00:00".parse::<NaiveTime>().expect("time"),
        class_id: ClassId(10),
        class_name: "9A".to_string(),
        subject_id: SubjectId(5),
        subject_name: "Mathematics".to_string(),
    });
    for (id, name, code) in [
        (1, "Anisa", "S0001"),
        (2, "Budi", "S0002"),
        (3, "Citra", "S0003"),
    ] {
        service.seed_student(
            ClassId(10),
            Student {
                id: StudentId(id),
                name: name.to_string(),
                external_code: code.to_string(),
            },
        );
    }
    service
}

async fn narrowed_workbench(service: &MemoryRecordService, period: PeriodKey) -> Workbench {
    let mut workbench = Workbench::new();
    workbench.load_catalog(service).await.expect("load catalog");
    workbench.select_class(ClassId(10)).expect("select class");
    workbench.select_subject(SubjectId(5)).expect("select subject");
    workbench.select_period(period).expect("select period");
    workbench
}

fn attendance(status: AttendanceStatus) -> RecordValue {
    RecordValue::Attendance(status)
}

fn grade(score: f64) -> RecordValue {
    RecordValue::Grade(GradeScore::new(score).expect("score"))
}

#[tokio::test]
async fn attendance_day_round_trip_lands_in_the_store() {
    let service = seeded_service();
    let period = PeriodKey::Date("2026-03-02".parse().expect("date"));
    let scope = ScopeKey::new(ClassId(10), SubjectId(5), period);

    let mut workbench = narrowed_workbench(&service, period).await;
    workbench.load_roster(&service).await.expect("load roster");

    // Everyone defaults to Present; one correction before saving.
    workbench
        .set_entry(StudentId(2), attendance(AttendanceStatus::Absent))
        .expect("mark absent");
    assert!(workbench.loaded().expect("loaded").tracker().is_dirty());

    let outcome = workbench.submit(&service).await.expect("submit");
    match outcome {
        SubmitOutcome::Submitted { report, refreshed } => {
            assert_eq!(report.succeeded, 3);
            assert!(report.failed.is_empty());
            assert!(refreshed);
        }
        other => panic!("expected a submit report, got {other:?}"),
    }

    assert_eq!(
        service.stored(StudentId(1), scope),
        Some(attendance(AttendanceStatus::Present))
    );
    assert_eq!(
        service.stored(StudentId(2), scope),
        Some(attendance(AttendanceStatus::Absent))
    );

    // The refreshed roster mirrors the store and carries no local edits.
    let loaded = workbench.loaded().expect("loaded");
    assert_eq!(
        loaded.tracker().value_of(StudentId(2)),
        Some(attendance(AttendanceStatus::Absent))
    );
    assert!(!loaded.tracker().is_dirty());
}

#[tokio::test]
async fn grade_submit_sends_set_students_and_skips_cleared_ones() {
    let service = seeded_service();
    let period = PeriodKey::Assessment(AssessmentKind::Midterm);
    let scope = ScopeKey::new(ClassId(10), SubjectId(5), period);
    service.seed_record(StudentId(2), scope, grade(75.0));

    let mut workbench = narrowed_workbench(&service, period).await;
    workbench.load_roster(&service).await.expect("load roster");

    workbench
        .set_entry(StudentId(1), grade(90.0))
        .expect("set grade");
    workbench.clear_entry(StudentId(2)).expect("clear grade");

    let outcome = workbench.submit(&service).await.expect("submit");
    match outcome {
        SubmitOutcome::Submitted { report, refreshed } => {
            assert_eq!(report.succeeded, 1);
            assert!(report.failed.is_empty());
            assert!(refreshed);
        }
        other => panic!("expected a submit report, got {other:?}"),
    }

    // Clearing drops the student from the submission; it never deletes
    // the stored record.
    assert_eq!(service.stored(StudentId(1), scope), Some(grade(90.0)));
    assert_eq!(service.stored(StudentId(2), scope), Some(grade(75.0)));
    assert_eq!(service.stored(StudentId(3), scope), None);

    let tracker = workbench.loaded().expect("loaded").tracker();
    assert_eq!(tracker.value_of(StudentId(1)), Some(grade(90.0)));
    assert_eq!(tracker.value_of(StudentId(2)), Some(grade(75.0)));
    assert_eq!(tracker.value_of(StudentId(3)), None);
    assert!(!tracker.is_dirty());
}

#[tokio::test]
async fn submitting_a_clean_grade_sheet_is_a_no_op() {
    let service = seeded_service();
    let period = PeriodKey::Assessment(AssessmentKind::Quiz1);

    let mut workbench = narrowed_workbench(&service, period).await;
    workbench.load_roster(&service).await.expect("load roster");

    let outcome = workbench.submit(&service).await.expect("submit");
    assert!(matches!(outcome, SubmitOutcome::NothingToSubmit));
    assert_eq!(service.counts().upserts, 0);
}

#[tokio::test]
async fn unsubmitted_edits_do_not_follow_the_scope() {
    let service = seeded_service();
    let monday = PeriodKey::Date("2026-03-02".parse().expect("date"));
    let tuesday = PeriodKey::Date("2026-03-03".parse().expect("date"));

    let mut workbench = narrowed_workbench(&service, monday).await;
    workbench.load_roster(&service).await.expect("load roster");
    workbench
        .set_entry(StudentId(1), attendance(AttendanceStatus::Late))
        .expect("mark late");

    // Moving to another day drops the pending edit with the roster.
    workbench.select_period(tuesday).expect("select period");
    workbench.load_roster(&service).await.expect("load roster");
    assert_eq!(
        workbench
            .loaded()
            .expect("loaded")
            .tracker()
            .value_of(StudentId(1)),
        Some(attendance(AttendanceStatus::Present))
    );

    // Coming back shows stored truth, not the abandoned edit.
    workbench.select_period(monday).expect("select period");
    workbench.load_roster(&service).await.expect("load roster");
    let tracker = workbench.loaded().expect("loaded").tracker();
    assert_eq!(
        tracker.value_of(StudentId(1)),
        Some(attendance(AttendanceStatus::Present))
    );
    assert!(!tracker.is_dirty());
    assert_eq!(service.counts().upserts, 0);
}
