use crate::model::Submission;
use crate::replica::ReplicaBus;
use crate::test_utils::create_test_submission;

#[tokio::test]
async fn events_carry_origin_and_full_payload() {
    let bus = ReplicaBus::new(8);
    let publisher = bus.join();
    let listener = bus.join();
    let mut rx = listener.subscribe();

    let records = vec![
        create_test_submission("sub-1", "stu-1"),
        create_test_submission("sub-2", "stu-2"),
    ];
    publisher.publish(&records);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.origin, publisher.origin());

    let decoded: Vec<Submission> = serde_json::from_str(&event.payload).unwrap();
    assert_eq!(decoded, records);
}

#[tokio::test]
async fn every_joined_channel_gets_a_distinct_origin() {
    let bus = ReplicaBus::new(8);
    let a = bus.join();
    let b = bus.join();
    let c = bus.join();

    assert_ne!(a.origin(), b.origin());
    assert_ne!(a.origin(), c.origin());
    assert_ne!(b.origin(), c.origin());
}

#[tokio::test]
async fn publishers_also_hear_their_own_events() {
    let bus = ReplicaBus::new(8);
    let channel = bus.join();
    let mut rx = channel.subscribe();

    channel.publish(&[create_test_submission("sub-1", "stu-1")]);

    // Filtering self-originated events out is the subscriber's job
    let event = rx.recv().await.unwrap();
    assert_eq!(event.origin, channel.origin());
}

#[tokio::test]
async fn publishing_with_no_listeners_is_silent() {
    let bus = ReplicaBus::new(8);
    let channel = bus.join();

    channel.publish(&[create_test_submission("sub-1", "stu-1")]);

    // A subscription opened afterwards starts empty
    let mut rx = channel.subscribe();
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn raw_payloads_pass_through_untouched() {
    let bus = ReplicaBus::new(8);
    let publisher = bus.join();
    let listener = bus.join();
    let mut rx = listener.subscribe();

    publisher.publish_raw("definitely not json");

    let event = rx.recv().await.unwrap();
    assert_eq!(&*event.payload, "definitely not json");
}
