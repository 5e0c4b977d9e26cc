//! Tests for node construction, teardown and handle invalidation

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pubsub_bridge::{
        BridgeConfig, BridgeError, Fault, LoopbackMiddleware, Node, ResourceCounts,
    };

    fn middleware() -> Arc<LoopbackMiddleware> {
        Arc::new(LoopbackMiddleware::new())
    }

    #[test]
    fn test_every_init_failure_unwinds() {
        let cases = [
            (Fault::OptionsInit, "options"),
            (Fault::ContextInit, "context"),
            (Fault::NodeInit, "node"),
        ];

        for (fault, stage) in cases {
            let mw = middleware();
            mw.faults().inject(fault);

            let err = Node::initialize("talker", mw.clone()).unwrap_err();
            match (stage, &err) {
                ("options", BridgeError::OptionsInit { .. })
                | ("context", BridgeError::ContextInit { .. })
                | ("node", BridgeError::NodeInit { .. }) => {}
                _ => panic!("stage {} produced {:?}", stage, err),
            }
            assert_eq!(mw.resources(), ResourceCounts::default(), "stage {}", stage);

            // The same middleware works once the fault is cleared
            mw.faults().clear(fault);
            let node = Node::initialize("talker", mw.clone()).unwrap();
            node.shutdown().unwrap();
            assert!(mw.resources().is_empty());
        }
    }

    #[test]
    fn test_invalid_node_name_is_node_init_error() {
        let mw = middleware();
        let err = Node::initialize("1bad name", mw.clone()).unwrap_err();
        assert!(matches!(err, BridgeError::NodeInit { .. }));
        assert!(mw.resources().is_empty());
    }

    #[test]
    fn test_shutdown_releases_endpoints() {
        let mw = middleware();
        let node = Node::initialize("talker", mw.clone()).unwrap();
        let publisher = node.create_array_publisher("t1").unwrap();
        let subscriber = node.create_text_subscriber("chatter").unwrap();

        let counts = mw.resources();
        assert_eq!(counts.publishers, 1);
        assert_eq!(counts.subscriptions, 1);
        assert_eq!(node.endpoint_count(), 2);

        node.shutdown().unwrap();
        assert!(mw.resources().is_empty());

        // Dropping handles after shutdown releases nothing twice
        drop(publisher);
        drop(subscriber);
        assert!(mw.resources().is_empty());
    }

    #[test]
    fn test_handles_fail_after_shutdown() {
        let mw = middleware();
        let node = Node::initialize("talker", mw.clone()).unwrap();
        let mut publisher = node.create_array_publisher("t1").unwrap();
        let mut subscriber = node.create_array_subscriber("t1").unwrap();

        node.shutdown().unwrap();

        assert!(!publisher.is_live());
        assert!(matches!(
            publisher.publish_array(&[1.0]),
            Err(BridgeError::NodeShutdown { .. })
        ));
        assert!(matches!(
            subscriber.take_array(&mut [0.0; 4]),
            Err(BridgeError::NodeShutdown { .. })
        ));
    }

    #[test]
    fn test_dropping_handle_releases_endpoint() {
        let mw = middleware();
        let node = Node::initialize("talker", mw.clone()).unwrap();
        {
            let _subscriber = node.create_array_subscriber("t1").unwrap();
            assert_eq!(mw.resources().subscriptions, 1);
        }
        assert_eq!(mw.resources().subscriptions, 0);
        assert_eq!(node.endpoint_count(), 0);
    }

    #[test]
    fn test_multiple_nodes_share_middleware() {
        let mw = middleware();
        let talker = Node::initialize("talker", mw.clone()).unwrap();
        let listener = Node::initialize("listener", mw.clone()).unwrap();

        let mut publisher = talker.create_array_publisher("/shared").unwrap();
        let mut subscriber = listener.create_array_subscriber("shared").unwrap();

        publisher.publish_array(&[42.0]).unwrap();
        assert_eq!(subscriber.take_array_vec().unwrap(), Some(vec![42.0]));

        talker.shutdown().unwrap();
        assert!(listener.is_live());
        assert_eq!(mw.resources().nodes, 1);
        drop(subscriber);
        listener.shutdown().unwrap();
        assert!(mw.resources().is_empty());
    }

    #[test]
    fn test_namespace_applies_to_relative_topics() {
        let mw = middleware();
        let config = BridgeConfig::default().with_namespace("/robot");
        let node = Node::initialize_with_config("arm", mw.clone(), config).unwrap();
        let _publisher = node.create_text_publisher("status").unwrap();
        let _private = node.create_text_publisher("~/debug").unwrap();

        let topics = mw.topic_names();
        assert!(topics.contains(&"/robot/status".to_string()));
        assert!(topics.contains(&"/robot/arm/debug".to_string()));
    }

    #[test]
    fn test_endpoint_init_failures() {
        let mw = middleware();
        let node = Node::initialize("talker", mw.clone()).unwrap();

        assert!(matches!(
            node.create_array_publisher("bad//topic"),
            Err(BridgeError::PublisherInit { .. })
        ));
        assert!(matches!(
            node.create_text_subscriber("9lives"),
            Err(BridgeError::SubscriberInit { .. })
        ));

        mw.faults().inject(Fault::PublisherInit);
        assert!(matches!(
            node.create_text_publisher("ok"),
            Err(BridgeError::PublisherInit { .. })
        ));
        mw.faults().clear_all();

        let counts = mw.resources();
        assert_eq!(counts.publishers, 0);
        assert_eq!(counts.subscriptions, 0);
    }
}
