#!/usr/bin/env rust

//! Basic usage example of the publish/subscribe bridge

use pubsub_bridge::{LoopbackMiddleware, Node, Result, TakeOutcome};
use std::{sync::Arc, time::Duration};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    println!("Publish/Subscribe Bridge Example");
    println!("================================");

    let middleware = Arc::new(LoopbackMiddleware::new());
    let node = Node::initialize("fortran_host", middleware.clone())?;
    println!("Node '{}' initialized", node.name());

    // Numeric arrays
    let mut publisher = node.create_array_publisher("t1")?;
    let mut subscriber = node.create_array_subscriber("t1")?;

    publisher.publish_array(&[1.0, 2.0, 3.0])?;
    node.spin_once(Duration::from_millis(10))?;

    let mut buffer = [0.0; 10];
    if let TakeOutcome::Taken(taken) = subscriber.take_array(&mut buffer)? {
        println!("Received {} elements: {:?}", taken.copied, &buffer[..taken.copied]);
    }

    // Text, received into a buffer that is too small
    let mut chatter = node.create_text_publisher("chatter")?;
    let mut listener = node.create_text_subscriber("chatter")?;

    chatter.publish_text("hello from the host")?;
    let mut text = [0u8; 6];
    match listener.take_text(&mut text)? {
        TakeOutcome::Taken(taken) => println!(
            "Received '{}' ({} of {} bytes)",
            String::from_utf8_lossy(&text[..taken.copied]),
            taken.copied,
            taken.available
        ),
        TakeOutcome::Empty => println!("Nothing received"),
    }

    println!("Live resources before shutdown: {:?}", middleware.resources());
    drop((publisher, subscriber, chatter, listener));
    node.shutdown()?;
    println!("Live resources after shutdown: {:?}", middleware.resources());

    Ok(())
}
