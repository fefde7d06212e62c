use course_core::model::{
    CourseId, CourseProgress, LessonId, LessonRef, ModuleId, PauseStatusPolicy, ProgressPercent,
    ProgressRecord, ReportKind,
};
use course_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage};

use super::test_harness::{
    FakeCourseApi, ViewKind, sample_course, setup_view_harness, test_user,
};

#[tokio::test(flavor = "current_thread")]
async fn home_view_lists_courses_with_progress() {
    let api = FakeCourseApi::new(vec![sample_course()]).with_progress(CourseProgress {
        course_id: CourseId::new(1),
        total_lessons: 2,
        completed_lessons: 1,
        percent: ProgressPercent::clamped(55),
    });
    let mut harness =
        setup_view_harness(ViewKind::Home, api, Some(test_user()), Storage::in_memory());
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Knife skills"), "missing title in {html}");
    assert!(html.contains("2 lessons"), "missing lesson count in {html}");
    assert!(html.contains("55% · 1/2 lessons"), "missing progress in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_hides_progress_without_user() {
    let api = FakeCourseApi::new(vec![sample_course()]);
    let mut harness = setup_view_harness(ViewKind::Home, api, None, Storage::in_memory());
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Knife skills"), "missing title in {html}");
    assert!(!html.contains("progress-fill"), "unexpected progress in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_reports_offline_with_empty_cache() {
    let mut harness = setup_view_harness(
        ViewKind::Home,
        FakeCourseApi::offline(),
        Some(test_user()),
        Storage::in_memory(),
    );
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Courses are unavailable"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_shows_lessons_and_cached_progress() {
    let storage = Storage::in_memory();
    let record = ProgressRecord::from_sample(
        test_user(),
        LessonRef {
            course_id: CourseId::new(1),
            module_id: ModuleId::new(10),
            lesson_id: LessonId::new(1),
        },
        ReportKind::Periodic,
        PauseStatusPolicy::Legacy,
        60.0,
        185.0,
    )
    .unwrap();
    storage
        .progress
        .upsert_progress(&record, fixed_now())
        .await
        .expect("seed progress");

    let api = FakeCourseApi::new(vec![sample_course()]);
    let mut harness = setup_view_harness(ViewKind::Course(1), api, Some(test_user()), storage);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Basics"), "missing module in {html}");
    assert!(html.contains("Holding the knife"), "missing lesson in {html}");
    assert!(html.contains("3:05"), "missing duration in {html}");
    assert!(html.contains("In progress"), "missing status in {html}");
    assert!(html.contains("32%"), "missing lesson percent in {html}");
    assert!(html.contains("Reading"), "missing reading tag in {html}");
    // Local aggregate: (32 + 0) / 2.
    assert!(html.contains("16% · 0/2 lessons"), "missing course bar in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_unknown_course_is_not_found() {
    let api = FakeCourseApi::new(vec![sample_course()]);
    let mut harness =
        setup_view_harness(ViewKind::Course(99), api, Some(test_user()), Storage::in_memory());
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("This course could not be found."), "missing error in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_viewer_offers_retry_and_close_after_network_failure() {
    let mut harness = setup_view_harness(
        ViewKind::FailedLesson,
        FakeCourseApi::new(vec![sample_course()]),
        None,
        Storage::in_memory(),
    );
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Holding the knife"), "missing lesson title in {html}");
    assert!(html.contains("player-error"), "missing error overlay in {html}");
    assert!(html.contains("Check your connection"), "missing network message in {html}");
    assert!(html.contains("Try again"), "missing retry in {html}");
    assert!(html.contains(">Close<"), "missing close in {html}");
    assert!(!html.contains("class=\"spinner\""), "spinner still shown in {html}");
}
