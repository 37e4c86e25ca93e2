//! Integration tests for the SSE events endpoint.

mod common;

use common::TestHarness;
use tapedeck::events::Severity;

#[tokio::test]
async fn sse_stream_connects() {
    let (_h, addr) = TestHarness::with_server(common::THREE_ITEM_PLAYLIST).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Verify content type is event-stream.
    let ct = resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(
        ct.contains("text/event-stream"),
        "expected SSE content-type, got: {ct}"
    );
}

#[tokio::test]
async fn no_replay_for_late_joiners() {
    let (harness, _addr) = TestHarness::with_server(common::THREE_ITEM_PLAYLIST).await;

    harness.ctx.bus.publish(Severity::Info, "before anyone joined");

    // A fresh observer must not see events published before it registered.
    let mut rx = harness.ctx.bus.subscribe();
    harness.ctx.bus.publish(Severity::Info, "after joining");

    assert_eq!(rx.try_recv().unwrap().message, "after joining");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn sse_client_disconnect_leaves_bus_usable() {
    let (harness, addr) = TestHarness::with_server(common::THREE_ITEM_PLAYLIST).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    drop(resp);

    // Publishing after the observer went away must not fail or panic, and
    // other observers keep receiving.
    let mut rx = harness.ctx.bus.subscribe();
    harness.ctx.bus.publish(Severity::Success, "still flowing");
    assert_eq!(rx.try_recv().unwrap().message, "still flowing");
}
