//! End-to-end publish/take tests over the loopback middleware

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pubsub_bridge::{
        BridgeConfig, BridgeError, Fault, LoopbackMiddleware, MessageKind, Node, TakeOutcome,
    };

    fn node(name: &str) -> (Arc<LoopbackMiddleware>, Node) {
        let mw = Arc::new(LoopbackMiddleware::new());
        let node = Node::initialize(name, mw.clone()).unwrap();
        (mw, node)
    }

    #[test]
    fn test_array_scenario_on_t1() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_array_publisher("t1").unwrap();
        let mut subscriber = node.create_array_subscriber("t1").unwrap();

        publisher.publish_array(&[1.0, 2.0, 3.0]).unwrap();

        let mut buffer = [0.0; 10];
        let outcome = subscriber.take_array(&mut buffer).unwrap();
        assert_eq!(outcome.copied(), 3);
        assert!(!outcome.is_truncated());
        assert_eq!(&buffer[..3], &[1.0, 2.0, 3.0]);
        assert!(buffer[3..].iter().all(|v| *v == 0.0));

        // Queue is drained
        assert!(subscriber.take_array(&mut buffer).unwrap().is_empty());
    }

    #[test]
    fn test_array_values_are_bit_exact() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_array_publisher("exact").unwrap();
        let mut subscriber = node.create_array_subscriber("exact").unwrap();

        let data = [
            f64::from_bits(0x7ff8_0000_0000_0001), // NaN with payload
            -0.0,
            f64::MIN_POSITIVE / 4.0, // subnormal
            f64::INFINITY,
            f64::MAX,
            std::f64::consts::PI,
        ];
        publisher.publish_array(&data).unwrap();

        let mut buffer = [1.0; 6];
        assert_eq!(subscriber.take_array(&mut buffer).unwrap().copied(), 6);
        for (sent, got) in data.iter().zip(buffer.iter()) {
            assert_eq!(sent.to_bits(), got.to_bits());
        }
    }

    #[test]
    fn test_array_overflow_copies_capacity() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_array_publisher("big").unwrap();
        let mut subscriber = node.create_array_subscriber("big").unwrap();

        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        publisher.publish_array(&data).unwrap();

        let mut buffer = [0.0; 8];
        let outcome = subscriber.take_array(&mut buffer).unwrap();
        let taken = outcome.taken().unwrap();
        assert_eq!(taken.copied, 8);
        assert_eq!(taken.available, 100);
        assert!(taken.is_truncated());
        assert_eq!(&buffer[..], &data[..8]);
    }

    #[test]
    fn test_text_round_trip() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();

        publisher.publish_text("héllo wörld").unwrap();

        let mut buffer = [0xaau8; 64];
        let outcome = subscriber.take_text(&mut buffer).unwrap();
        let len = "héllo wörld".len();
        assert_eq!(outcome.copied(), len);
        assert_eq!(&buffer[..len], "héllo wörld".as_bytes());
        assert_eq!(buffer[len], 0);
    }

    #[test]
    fn test_text_overflow_copies_size_minus_one() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();

        publisher.publish_text("abcdefghij").unwrap();
        let mut buffer = [0xffu8; 4];
        let outcome = subscriber.take_text(&mut buffer).unwrap();
        assert_eq!(outcome.copied(), 3);
        assert!(outcome.is_truncated());
        assert_eq!(&buffer, b"abc\0");

        // A one-byte buffer holds only the terminator
        publisher.publish_text("xyz").unwrap();
        let mut tiny = [0xffu8; 1];
        assert_eq!(subscriber.take_text(&mut tiny).unwrap().copied(), 0);
        assert_eq!(tiny, [0]);
    }

    #[test]
    fn test_empty_messages() {
        let (_mw, node) = node("host");
        let mut text_pub = node.create_text_publisher("empty_text").unwrap();
        let mut text_sub = node.create_text_subscriber("empty_text").unwrap();
        let mut array_pub = node.create_array_publisher("empty_array").unwrap();
        let mut array_sub = node.create_array_subscriber("empty_array").unwrap();

        text_pub.publish_text("").unwrap();
        array_pub.publish_array(&[]).unwrap();

        let mut buffer = [0xffu8; 4];
        match text_sub.take_text(&mut buffer).unwrap() {
            TakeOutcome::Taken(taken) => assert_eq!(taken.copied, 0),
            TakeOutcome::Empty => panic!("expected an empty text message"),
        }
        assert_eq!(buffer[0], 0);

        match array_sub.take_array(&mut [0.0; 2]).unwrap() {
            TakeOutcome::Taken(taken) => assert_eq!(taken.available, 0),
            TakeOutcome::Empty => panic!("expected an empty array message"),
        }
    }

    #[test]
    fn test_publisher_capacity_never_shrinks() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_array_publisher("sizes").unwrap();

        let mut last = 0;
        for size in [2usize, 5, 3, 5] {
            publisher.publish_array(&vec![0.25; size]).unwrap();
            assert!(publisher.capacity() >= last);
            last = publisher.capacity();
        }
        assert_eq!(publisher.capacity(), 5);
    }

    #[test]
    fn test_subscriber_capacity_never_shrinks() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_array_publisher("sizes").unwrap();
        let mut subscriber = node.create_array_subscriber("sizes").unwrap();
        assert_eq!(subscriber.capacity(), 0);

        let mut buffer = [0.0; 8];
        let mut last = 0;
        for size in [2usize, 5, 3, 5] {
            publisher.publish_array(&vec![0.5; size]).unwrap();
            let outcome = subscriber.take_array(&mut buffer).unwrap();
            assert_eq!(outcome.copied(), size);
            assert!(subscriber.capacity() >= last);
            last = subscriber.capacity();
        }
        assert_eq!(subscriber.capacity(), 5);
        assert_eq!(subscriber.payload().capacity(), 5);
        assert_eq!(subscriber.payload().len(), 5);
        assert_eq!(subscriber.payload().grows(), 2);
    }

    #[test]
    fn test_text_subscriber_capacity_never_shrinks() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_text_publisher("words").unwrap();
        let mut subscriber = node.create_text_subscriber("words").unwrap();

        for text in ["ab", "abcdef", "a"] {
            publisher.publish_text(text).unwrap();
            subscriber.take_text_string().unwrap();
        }
        assert_eq!(subscriber.capacity(), 6);
        assert_eq!(subscriber.payload().len(), 1);
    }

    #[test]
    fn test_publish_array_on_text_publisher() {
        let (mw, node) = node("host");
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let subscriber = node.create_text_subscriber("chatter").unwrap();

        let err = publisher.publish_array(&[1.0, 2.0, 3.0]).unwrap_err();
        match err {
            BridgeError::VariantMismatch { expected, actual } => {
                assert_eq!(expected, MessageKind::NumericArray);
                assert_eq!(actual, MessageKind::Text);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(publisher.capacity(), 0);
        assert_eq!(mw.pending(subscriber.endpoint()), Some(0));
    }

    #[test]
    fn test_take_array_on_text_subscriber_keeps_message() {
        let (mw, node) = node("host");
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();
        publisher.publish_text("keep me").unwrap();

        let mut buffer = [7.0; 4];
        assert!(matches!(
            subscriber.take_array(&mut buffer),
            Err(BridgeError::VariantMismatch { .. })
        ));
        assert_eq!(buffer, [7.0; 4]);
        assert_eq!(mw.pending(subscriber.endpoint()), Some(1));
    }

    #[test]
    fn test_text_and_array_topics_are_separate_types() {
        let (_mw, node) = node("host");
        let mut text_pub = node.create_text_publisher("mixed").unwrap();
        let mut array_sub = node.create_array_subscriber("mixed").unwrap();

        text_pub.publish_text("not numbers").unwrap();
        assert!(array_sub.take_array(&mut [0.0; 4]).unwrap().is_empty());
    }

    #[test]
    fn test_history_depth_keeps_latest() {
        let mw = Arc::new(LoopbackMiddleware::new());
        let config = BridgeConfig::default().with_history_depth(2);
        let node = Node::initialize_with_config("host", mw.clone(), config).unwrap();
        let mut publisher = node.create_array_publisher("depth").unwrap();
        let mut subscriber = node.create_array_subscriber("depth").unwrap();

        for value in [1.0, 2.0, 3.0] {
            publisher.publish_array(&[value]).unwrap();
        }
        assert_eq!(mw.dropped(subscriber.endpoint()), Some(1));
        assert_eq!(subscriber.take_array_vec().unwrap(), Some(vec![2.0]));
        assert_eq!(subscriber.take_array_vec().unwrap(), Some(vec![3.0]));
        assert_eq!(subscriber.take_array_vec().unwrap(), None);
    }

    #[test]
    fn test_message_info_sequence() {
        let (_mw, node) = node("host");
        let mut publisher = node.create_text_publisher("seq").unwrap();
        let mut subscriber = node.create_text_subscriber("seq").unwrap();

        publisher.publish_text("one").unwrap();
        publisher.publish_text("two").unwrap();

        let mut buffer = [0u8; 8];
        for expected in 1..=2u64 {
            let outcome = subscriber.take_text(&mut buffer).unwrap();
            let taken = outcome.taken().unwrap();
            assert_eq!(taken.info.sequence, expected);
            assert_eq!(taken.info.publisher, publisher.endpoint());
        }
    }

    #[test]
    fn test_middleware_failures_surface_as_errors() {
        let (mw, node) = node("host");
        let mut publisher = node.create_array_publisher("faulty").unwrap();
        let mut subscriber = node.create_array_subscriber("faulty").unwrap();

        mw.faults().inject(Fault::Publish);
        assert!(matches!(
            publisher.publish_array(&[1.0]),
            Err(BridgeError::Publish { .. })
        ));
        mw.faults().clear(Fault::Publish);

        publisher.publish_array(&[1.0]).unwrap();
        mw.faults().inject(Fault::Take);
        assert!(matches!(
            subscriber.take_array(&mut [0.0]),
            Err(BridgeError::Take { .. })
        ));
        mw.faults().clear(Fault::Take);

        // The message survived the failed take
        assert_eq!(subscriber.take_array_vec().unwrap(), Some(vec![1.0]));
    }
}
