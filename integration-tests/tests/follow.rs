use httpwatch_core::follow::LineFollower;
use integration_tests::harness::{TestLog, recv_within};
use pretty_assertions::assert_eq;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn attaching_to_a_missing_file_fails() {
    let result = LineFollower::attach("/i_should_not_exist").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn emits_only_lines_appended_after_attach() {
    // Arrange
    let log = TestLog::create();
    log.append("line 1");
    let mut follower = LineFollower::attach(log.path()).await.unwrap();

    // Act
    log.append("line 2");
    log.append("line 3");

    // Assert: line 1 predates the attach and is skipped.
    assert_eq!(
        recv_within(&mut follower, RECV_TIMEOUT).await.as_deref(),
        Some("line 2")
    );
    assert_eq!(
        recv_within(&mut follower, RECV_TIMEOUT).await.as_deref(),
        Some("line 3")
    );
}

#[tokio::test]
async fn keeps_following_across_rotation() {
    // Arrange
    let log = TestLog::create();
    log.append("line 1");
    let mut follower = LineFollower::attach(log.path()).await.unwrap();

    log.append("line 2");
    assert_eq!(
        recv_within(&mut follower, RECV_TIMEOUT).await.as_deref(),
        Some("line 2")
    );

    // Act: rewrite from scratch, as a truncating rotation would.
    log.rewrite("line 3");

    // Assert
    assert_eq!(
        recv_within(&mut follower, RECV_TIMEOUT).await.as_deref(),
        Some("line 3")
    );
}
