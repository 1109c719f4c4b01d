mod log_file;

pub use log_file::TestLog;

use httpwatch_core::follow::LineFollower;
use std::time::Duration;

/// A syntactically valid access-log line for the given URI.
pub fn sample_line(uri: &str, status: u16, size: u64) -> String {
    format!("127.0.0.1 - james [09/May/2018:16:00:39 +0000] \"GET {uri} HTTP/1.0\" {status} {size}")
}

/// Waits for the next followed line, failing the test if none shows up in
/// time (the follower polls, so give it a couple of seconds).
pub async fn recv_within(follower: &mut LineFollower, timeout: Duration) -> Option<String> {
    tokio::time::timeout(timeout, follower.next_line())
        .await
        .expect("timed out waiting for a followed line")
}
