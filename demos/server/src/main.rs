//! Runs an IoMusT server on a UDP port.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p iomust-server-demo -- --port 9000 --period-us 2667
//! cargo run -p iomust-server-demo -- --mode aggregate --sink 10.0.0.9:9000
//! cargo run -p iomust-server-demo -- --mode broadcast --peers 10.0.0.1:9,10.0.0.2:9
//! ```

use std::{
    net::SocketAddr,
    thread,
    time::{Duration, Instant},
};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;

use iomust_server::{
    relay::{BroadcastConfig, ForwardConfig},
    transport::udp::Socket,
    IomustServerError, OutputPolicyKind, Server, ServerConfig, ServerMode, SyncConfig,
};
use iomust_shared::DEFAULT_PORT;

const POLL_INTERVAL: Duration = Duration::from_micros(100);

fn main() -> Result<(), IomustServerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command().get_matches();
    let config = server_config(&matches)?;

    let mut server = Server::new(config)?;
    let listen_addr = SocketAddr::from(([0, 0, 0, 0], server.config().port));
    server.listen(Socket::bind(listen_addr)?);

    info!("IoMusT Server Demo started on {}", listen_addr);

    loop {
        server.update(Instant::now());
        thread::sleep(POLL_INTERVAL);
    }
}

fn command() -> Command {
    Command::new("iomust-server")
        .about("align and mix numbered UDP streams from unsynchronized senders")
        .arg(
            Arg::new("port")
                .long("port")
                .value_parser(value_parser!(u16))
                .help("UDP port to listen on"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .default_value("mix")
                .value_parser(["mix", "aggregate", "forward", "broadcast"]),
        )
        .arg(
            Arg::new("sink")
                .long("sink")
                .value_parser(value_parser!(SocketAddr))
                .help("Downlink receiving the merged slots in aggregate mode"),
        )
        .arg(
            Arg::new("period-us")
                .long("period-us")
                .value_parser(value_parser!(u64))
                .help("Time between two messages of a sender"),
        )
        .arg(
            Arg::new("timeout-us")
                .long("timeout-us")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("send-delay-us")
                .long("send-delay-us")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("ring-capacity")
                .long("ring-capacity")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("reply-port")
                .long("reply-port")
                .value_parser(value_parser!(u16))
                .help("Send released content to this port instead of the source port"),
        )
        .arg(
            Arg::new("align-on-join")
                .long("align-on-join")
                .action(ArgAction::SetTrue)
                .help("Start accepting at the newest slot when a second sender joins"),
        )
        .arg(
            Arg::new("peers")
                .long("peers")
                .value_delimiter(',')
                .value_parser(value_parser!(SocketAddr))
                .help("Session participants in broadcast mode"),
        )
        .arg(
            Arg::new("packet-size")
                .long("packet-size")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("mean-delay-us")
                .long("mean-delay-us")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("std-dev-us")
                .long("std-dev-us")
                .value_parser(value_parser!(u64)),
        )
}

fn micros(matches: &ArgMatches, id: &str) -> Option<Duration> {
    matches.get_one::<u64>(id).copied().map(Duration::from_micros)
}

fn server_config(matches: &ArgMatches) -> Result<ServerConfig, IomustServerError> {
    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        period: micros(matches, "period-us").unwrap_or(defaults.period),
        timeout: micros(matches, "timeout-us").unwrap_or(defaults.timeout),
        ring_capacity: matches
            .get_one::<usize>("ring-capacity")
            .copied()
            .unwrap_or(defaults.ring_capacity),
        send_delay: micros(matches, "send-delay-us").unwrap_or(defaults.send_delay),
        reply_port: matches.get_one::<u16>("reply-port").copied(),
        align_window_on_join: matches.get_flag("align-on-join"),
    };

    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("aggregate") => {
            let Some(sink) = matches.get_one::<SocketAddr>("sink") else {
                return Err(IomustServerError::InvalidConfig {
                    reason: "aggregate mode needs --sink",
                });
            };
            ServerMode::Mix(OutputPolicyKind::AggregateForward { sink: *sink })
        }
        Some("forward") => ServerMode::Forward(ForwardConfig::default()),
        Some("broadcast") => ServerMode::Broadcast(BroadcastConfig {
            peers: matches
                .get_many::<SocketAddr>("peers")
                .map(|peers| peers.copied().collect())
                .unwrap_or_default(),
            packet_size: matches.get_one::<usize>("packet-size").copied(),
            mean_delay: micros(matches, "mean-delay-us").unwrap_or_default(),
            delay_std_dev: micros(matches, "std-dev-us").unwrap_or_default(),
        }),
        _ => ServerMode::Mix(OutputPolicyKind::Broadcast),
    };

    Ok(ServerConfig {
        port: matches
            .get_one::<u16>("port")
            .copied()
            .unwrap_or(DEFAULT_PORT),
        sync,
        mode,
    })
}
