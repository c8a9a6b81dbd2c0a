use clap::{App, Arg};
use mmtsock::registry::DEFAULT_HEXAPOD_PORT;
use mmtsock::responder::Responder;
use mmtsock::Simulator;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("mmtsock-emulator")
        .version("0.1.0")
        .about("Line-protocol device emulator serving a canned crate dump")
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .value_name("ADDR")
                .help("Address to listen on")
                .takes_value(true)
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .takes_value(true)
                .validator(|v| match v.parse::<u16>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Port must be a number between 0 and 65535".into()),
                }),
        )
        .arg(
            Arg::with_name("fixture")
                .long("fixture")
                .value_name("FIXTURE")
                .help("Fixture to serve")
                .takes_value(true)
                .possible_values(&["hexapod", "mount"])
                .default_value("hexapod"),
        )
        .get_matches();

    let bind = matches.value_of("bind").unwrap_or("127.0.0.1");
    let port = match matches.value_of("port") {
        Some(p) => p.parse::<u16>()?,
        None => DEFAULT_HEXAPOD_PORT,
    };
    let fixture = match matches.value_of("fixture") {
        Some("mount") => Simulator::mount(),
        _ => Simulator::hexapod(),
    };

    println!("🔭 MMT Device Emulator");
    println!("======================");
    println!("   Fixture lines: {}", fixture.len());

    let responder = Arc::new(Responder::new(fixture));
    let listener = TcpListener::bind((bind, port)).await?;
    info!("🌐 Listening on {}:{}", bind, port);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("🔗 New client connected: {}", addr);
                    let responder = Arc::clone(&responder);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, responder).await {
                            warn!("Client {} error: {}", addr, e);
                        }
                        info!("🔌 Client {} disconnected", addr);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    println!("🔭 Device emulator stopped");
    Ok(())
}

async fn handle_client(
    stream: TcpStream,
    responder: Arc<Responder>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    let mut line = String::new();
    loop {
        line.clear();
        if buf_reader.read_line(&mut line).await? == 0 {
            break; // Client disconnected
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        info!("📨 Received request: {}", request);

        let reply = responder.reply(request);
        let mut out = String::new();
        for reply_line in &reply {
            out.push_str(reply_line);
            out.push('\n');
        }
        writer.write_all(out.as_bytes()).await?;
        info!("📤 Sent {} line(s)", reply.len());
    }

    Ok(())
}
