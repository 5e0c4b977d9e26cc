use clap::{App, Arg, ArgMatches, SubCommand};
use pubsub_bridge::{
    BridgeConfig, BridgeError, LoopbackMiddleware, Node, Result, SpinMode, TakeOutcome,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("bridge-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Publish/subscribe bridge CLI Tool")
        .arg(
            Arg::with_name("node")
                .short("n")
                .long("node")
                .value_name("NAME")
                .help("Node name")
                .default_value("bridge_cli")
                .takes_value(true),
        )
        .subcommand(
            SubCommand::with_name("roundtrip")
                .about("Publish numeric arrays and take them back")
                .arg(
                    Arg::with_name("topic")
                        .short("t")
                        .long("topic")
                        .value_name("TOPIC")
                        .help("Topic name")
                        .default_value("t1")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("size")
                        .short("s")
                        .long("size")
                        .value_name("SIZE")
                        .help("Elements per message")
                        .default_value("3")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("count")
                        .short("c")
                        .long("count")
                        .value_name("COUNT")
                        .help("Number of messages")
                        .default_value("1000")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("buffer")
                        .short("b")
                        .long("buffer")
                        .value_name("ELEMENTS")
                        .help("Receive buffer size (defaults to SIZE)")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("echo")
                .about("Publish a text message and print what is received")
                .arg(
                    Arg::with_name("topic")
                        .short("t")
                        .long("topic")
                        .value_name("TOPIC")
                        .help("Topic name")
                        .default_value("chatter")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("buffer")
                        .short("b")
                        .long("buffer")
                        .value_name("BYTES")
                        .help("Receive buffer size including the terminator")
                        .default_value("256")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("message")
                        .help("Text to publish")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            SubCommand::with_name("spin")
                .about("Time a single spin iteration")
                .arg(
                    Arg::with_name("timeout")
                        .short("t")
                        .long("timeout")
                        .value_name("MS")
                        .help("Timeout in milliseconds")
                        .default_value("100")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("mode")
                        .short("m")
                        .long("mode")
                        .value_name("MODE")
                        .help("Spin mode")
                        .possible_values(&["sleep", "wait"])
                        .default_value("sleep")
                        .takes_value(true),
                ),
        )
        .get_matches();

    let node_name = matches.value_of("node").unwrap_or("bridge_cli");

    match matches.subcommand() {
        ("roundtrip", Some(roundtrip_matches)) => handle_roundtrip(node_name, roundtrip_matches),
        ("echo", Some(echo_matches)) => handle_echo(node_name, echo_matches),
        ("spin", Some(spin_matches)) => handle_spin(node_name, spin_matches),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let raw = matches.value_of(name).unwrap_or_default();
    raw.parse()
        .map_err(|_| BridgeError::invalid_parameter(name, format!("cannot parse '{}'", raw)))
}

fn open_node(name: &str, config: BridgeConfig) -> Result<Node> {
    Node::initialize_with_config(name, Arc::new(LoopbackMiddleware::new()), config)
}

fn handle_roundtrip(node_name: &str, matches: &ArgMatches) -> Result<()> {
    let topic = matches.value_of("topic").unwrap_or("t1");
    let size: usize = parse_arg(matches, "size")?;
    let count: usize = parse_arg(matches, "count")?;
    let buffer_len: usize = match matches.value_of("buffer") {
        Some(_) => parse_arg(matches, "buffer")?,
        None => size,
    };

    let node = open_node(node_name, BridgeConfig::default())?;
    let mut publisher = node.create_array_publisher(topic)?;
    let mut subscriber = node.create_array_subscriber(topic)?;

    println!("Running array round trip...");
    println!("Topic: {}", topic);
    println!("Elements: {}", size);
    println!("Messages: {}", count);

    let data: Vec<f64> = (0..size).map(|i| i as f64).collect();
    let mut buffer = vec![0.0; buffer_len];
    let mut received = 0usize;
    let mut truncated = 0usize;

    let start = Instant::now();
    for _ in 0..count {
        publisher.publish_array(&data)?;
        if let TakeOutcome::Taken(taken) = subscriber.take_array(&mut buffer)? {
            received += 1;
            if taken.is_truncated() {
                truncated += 1;
            }
        }
    }
    let elapsed = start.elapsed();

    let round_trips_per_sec = count as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    println!("\nResults:");
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Round trips/sec: {:.0}", round_trips_per_sec);
    println!("  Received: {}/{}", received, count);
    println!("  Truncated: {}", truncated);
    if let Some(buffer) = publisher.payload().as_array() {
        println!("  Publisher buffer: {}", buffer.stats().summary());
    }

    drop(publisher);
    drop(subscriber);
    node.shutdown()
}

fn handle_echo(node_name: &str, matches: &ArgMatches) -> Result<()> {
    let topic = matches.value_of("topic").unwrap_or("chatter");
    let message = matches.value_of("message").unwrap_or_default();
    let buffer_len: usize = parse_arg(matches, "buffer")?;

    let node = open_node(node_name, BridgeConfig::default())?;
    let mut publisher = node.create_text_publisher(topic)?;
    let mut subscriber = node.create_text_subscriber(topic)?;

    publisher.publish_text(message)?;
    let mut buffer = vec![0u8; buffer_len];
    match subscriber.take_text(&mut buffer)? {
        TakeOutcome::Taken(taken) => {
            let text = String::from_utf8_lossy(&buffer[..taken.copied]);
            println!("[{}] {}", topic, text);
            if taken.is_truncated() {
                println!("(truncated: {} of {} bytes)", taken.copied, taken.available);
            }
        }
        TakeOutcome::Empty => println!("No message received on '{}'", topic),
    }

    drop(publisher);
    drop(subscriber);
    node.shutdown()
}

fn handle_spin(node_name: &str, matches: &ArgMatches) -> Result<()> {
    let timeout_ms: u64 = parse_arg(matches, "timeout")?;
    let mode: SpinMode = parse_arg(matches, "mode")?;

    let node = open_node(node_name, BridgeConfig::default().with_spin_mode(mode))?;
    let _subscriber = node.create_text_subscriber("spin_probe")?;

    println!("Spinning once in {} mode with {}ms timeout...", mode, timeout_ms);
    let report = node.spin_once(Duration::from_millis(timeout_ms))?;
    println!("  Elapsed: {:.2}ms", report.elapsed.as_secs_f64() * 1000.0);
    println!("  Ready subscriptions: {}", report.ready.len());

    Ok(())
}
