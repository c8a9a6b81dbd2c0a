use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use mmtsock::client::{DEFAULT_IDENT, DEFAULT_SELECTOR};
use mmtsock::shortcuts;
use mmtsock::{DeviceClass, DeviceClient, Endpoint, Settings, SimulationMode};
use std::collections::BTreeMap;
use std::io;
use std::process::Command;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const DEVICE_NAMES: [&str; 7] = ["hexapod", "mount", "sim", "cell", "bcell", "ecell", "bmount"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("mmtsock")
        .version("0.1.0")
        .author("MMT Software Group")
        .about("🔭 Query and command MMT hexapod, mount and cell crates")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("device")
                .short("d")
                .long("device")
                .value_name("CLASS")
                .help("Registered device class to talk to")
                .takes_value(true)
                .possible_values(&DEVICE_NAMES)
                .default_value("hexapod")
                .global(true),
        )
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Override the device host")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Override the device port")
                .takes_value(true)
                .global(true)
                .validator(|v| match v.parse::<u16>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Port must be a number between 0 and 65535".into()),
                }),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .value_name("MS")
                .help("Connect timeout in milliseconds (0 = system default)")
                .takes_value(true)
                .global(true)
                .validator(validate_millis),
        )
        .arg(
            Arg::with_name("read-timeout")
                .long("read-timeout")
                .value_name("MS")
                .help("Give up on a reply line after this many milliseconds")
                .takes_value(true)
                .global(true)
                .validator(validate_millis),
        )
        .arg(
            Arg::with_name("simulate")
                .short("s")
                .long("simulate")
                .value_name("FIXTURE")
                .help("Answer from a canned fixture instead of the network")
                .takes_value(true)
                .possible_values(&["off", "hexapod", "mount"])
                .global(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON settings file")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("ident")
                .about("🪪 Identify this client to the device")
                .arg(Arg::with_name("id").help("Client identifier").default_value(DEFAULT_IDENT)),
        )
        .subcommand(
            SubCommand::with_name("tags")
                .about("🏷️  List tag names")
                .arg(selector_arg()),
        )
        .subcommand(
            SubCommand::with_name("values")
                .about("📊 Dump tag/value pairs")
                .arg(selector_arg()),
        )
        .subcommand(
            SubCommand::with_name("get")
                .about("🔎 Read a single tag")
                .arg(Arg::with_name("tag").help("Tag name").required(true)),
        )
        .subcommand(
            SubCommand::with_name("command")
                .about("📨 Send a command and print the status reply")
                .arg(Arg::with_name("cmd").help("Command line").required(true))
                .arg(
                    Arg::with_name("args")
                        .help("Arguments, each sent on its own line")
                        .multiple(true),
                ),
        )
        .subcommand(SubCommand::with_name("version").about("ℹ️  Show the device software version"))
        .subcommand(
            SubCommand::with_name("show")
                .about("📜 Print the raw reply to a request")
                .arg(selector_arg()),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("🧾 Print the raw reply with line lengths")
                .arg(selector_arg()),
        )
        .subcommand(
            SubCommand::with_name("register")
                .about("🧮 Binary register access")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("read")
                        .about("Send a register frame and read the reply bytes")
                        .arg(u16_arg("code", "Register code"))
                        .arg(u16_arg("address", "Register address"))
                        .arg(count_arg()),
                )
                .subcommand(
                    SubCommand::with_name("write")
                        .about("Send a register frame without reading")
                        .arg(u16_arg("code", "Register code"))
                        .arg(u16_arg("address", "Register address")),
                )
                .subcommand(
                    SubCommand::with_name("peek")
                        .about("Read raw bytes without sending a frame")
                        .arg(count_arg()),
                ),
        )
        .subcommand(
            SubCommand::with_name("reboot")
                .about("♻️  Reset a crate through its register port")
                .arg(
                    Arg::with_name("target")
                        .help("Crate host name")
                        .default_value("mount"),
                )
                .arg(
                    Arg::with_name("confirm")
                        .long("confirm")
                        .help("Confirm the reboot operation")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("server")
                .about("🚀 Start the line-protocol device emulator")
                .arg(
                    Arg::with_name("fixture")
                        .long("fixture")
                        .help("Fixture to serve")
                        .takes_value(true)
                        .possible_values(&["hexapod", "mount"])
                        .default_value("hexapod"),
                )
                .arg(
                    Arg::with_name("background")
                        .short("b")
                        .long("background")
                        .help("Run emulator in background"),
                ),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let settings = build_settings(&matches)?;
    let format = matches.value_of("format").unwrap_or("table");

    match matches.subcommand() {
        ("reboot", Some(sub)) => return handle_reboot(sub, &settings),
        ("server", Some(sub)) => return handle_server(sub, &matches),
        _ => {}
    }

    let endpoint = resolve_endpoint(&matches, &settings)?;
    if verbose {
        println!("{}", "🔭 mmtsock".bright_blue().bold());
        println!("{} {}", "Connecting to".dimmed(), endpoint);
    }

    let mut client = DeviceClient::connect(endpoint, &settings);
    if let Some(reason) = client.status() {
        eprintln!(
            "{} {} {}",
            "❌".red(),
            client.endpoint().to_string().bright_white(),
            reason.bright_red()
        );
        return Err(reason.to_string().into());
    }

    let result = run(&mut client, &matches, format);
    client.close();
    result
}

fn run(
    client: &mut DeviceClient,
    matches: &ArgMatches<'_>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("ident", Some(sub)) => {
            let reply = client.identify(sub.value_of("id").unwrap_or(DEFAULT_IDENT))?;
            print_reply(reply.as_deref(), format);
        }
        ("tags", Some(sub)) => {
            let tags = client.tags(selector(sub))?;
            print_tags(&tags, format)?;
        }
        ("values", Some(sub)) => {
            let values: BTreeMap<String, String> = client.values(selector(sub))?.into_iter().collect();
            print_values(&values, format)?;
        }
        ("get", Some(sub)) => {
            let tag = sub.value_of("tag").unwrap_or_default();
            match client.get(tag)? {
                Some(value) => match format {
                    "json" => println!("{}", serde_json::json!({ tag: value })),
                    "compact" => println!("{}", value),
                    _ => println!("{} {}", tag.bright_white(), value.bright_cyan()),
                },
                None => println!("{} {}", tag.bright_white(), "(absent)".yellow()),
            }
        }
        ("command", Some(sub)) => {
            let cmd = sub.value_of("cmd").unwrap_or_default();
            let args: Vec<&str> = sub.values_of("args").map(|v| v.collect()).unwrap_or_default();
            let reply = client.command_with_args(cmd, args)?;
            print_reply(reply.as_deref(), format);
        }
        ("version", _) => {
            let lines = client.version()?;
            print_lines(&lines, format)?;
        }
        ("show", Some(sub)) => {
            let stdout = io::stdout();
            client.show(selector(sub), &mut stdout.lock())?;
        }
        ("dump", Some(sub)) => {
            let stdout = io::stdout();
            client.dump(selector(sub), &mut stdout.lock())?;
        }
        ("register", Some(sub)) => handle_register(client, sub, format)?,
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
        }
    }
    Ok(())
}

fn handle_register(
    client: &mut DeviceClient,
    matches: &ArgMatches<'_>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("read", Some(sub)) => {
            let code = parse_arg::<u16>(sub, "code")?;
            let address = parse_arg::<u16>(sub, "address")?;
            let count = parse_arg::<usize>(sub, "count")?;
            let bytes = client.get_register(code, address, count)?;
            print_bytes(bytes.as_deref(), format);
        }
        ("write", Some(sub)) => {
            let code = parse_arg::<u16>(sub, "code")?;
            let address = parse_arg::<u16>(sub, "address")?;
            client.send_register(code, address)?;
            if format != "json" {
                println!("{} sent register frame ({}, {})", "✅".green(), code, address);
            }
        }
        ("peek", Some(sub)) => {
            let count = parse_arg::<usize>(sub, "count")?;
            let bytes = client.peek_register(count)?;
            print_bytes(bytes.as_deref(), format);
        }
        _ => {
            println!("{}", "Register subcommand required. Use 'mmtsock register --help' for options.".yellow());
        }
    }
    Ok(())
}

fn handle_reboot(matches: &ArgMatches<'_>, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !matches.is_present("confirm") {
        println!("{}", "Reboot requires --confirm flag for safety".yellow());
        return Ok(());
    }
    let target = matches.value_of("target").unwrap_or("mount");
    shortcuts::reboot(settings, target)?;
    println!("{} {} {}", "♻️".yellow(), "Reboot sent to".bright_white(), target.bright_cyan());
    Ok(())
}

fn handle_server(matches: &ArgMatches<'_>, global: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let background = matches.is_present("background");
    let fixture = matches.value_of("fixture").unwrap_or("hexapod");
    let port = global.value_of("port").unwrap_or("5340");

    println!("{}", "🚀 Starting device emulator...".bright_green().bold());

    let mut cmd = Command::new("cargo");
    cmd.args(&["run", "--bin", "mmtsock-emulator", "--", "--port", port, "--fixture", fixture]);

    if background {
        cmd.spawn()?;
        println!("{} Emulator started in background on port {}", "✅".green(), port);
    } else {
        println!("{} Emulator starting on port {} (Press Ctrl+C to stop)", "🌐".bright_blue(), port);
        cmd.status()?;
    }

    Ok(())
}

// Helper functions

fn selector_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("selector")
        .help("Request line sent to the device")
        .default_value(DEFAULT_SELECTOR)
}

fn u16_arg<'a, 'b>(name: &'a str, help: &'b str) -> Arg<'a, 'b> {
    Arg::with_name(name)
        .help(help)
        .required(true)
        .validator(|v| match v.parse::<u16>() {
            Ok(_) => Ok(()),
            Err(_) => Err("Must be an unsigned 16-bit number".into()),
        })
}

fn count_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("count")
        .help("Number of bytes to read")
        .required(true)
        .validator(|v| match v.parse::<usize>() {
            Ok(_) => Ok(()),
            Err(_) => Err("Byte count must be a number".into()),
        })
}

fn validate_millis(v: String) -> Result<(), String> {
    match v.parse::<u64>() {
        Ok(_) => Ok(()),
        Err(_) => Err("Timeout must be a number of milliseconds".into()),
    }
}

fn selector<'a>(matches: &'a ArgMatches<'_>) -> &'a str {
    matches.value_of("selector").unwrap_or(DEFAULT_SELECTOR)
}

fn parse_arg<T>(matches: &ArgMatches<'_>, name: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    let raw = matches
        .value_of(name)
        .ok_or_else(|| format!("missing argument '{}'", name))?;
    Ok(raw.parse::<T>()?)
}

fn build_settings(matches: &ArgMatches<'_>) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match matches.value_of("config") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(ms) = matches.value_of("timeout") {
        settings = settings.with_connect_timeout(Duration::from_millis(ms.parse()?));
    }
    if let Some(ms) = matches.value_of("read-timeout") {
        settings = settings.with_read_timeout(Some(Duration::from_millis(ms.parse()?)));
    }
    if let Some(mode) = matches.value_of("simulate") {
        settings = settings.with_simulation(SimulationMode::from_str(mode)?);
    }
    Ok(settings)
}

fn resolve_endpoint(matches: &ArgMatches<'_>, settings: &Settings) -> Result<Endpoint, Box<dyn std::error::Error>> {
    let class = DeviceClass::from_str(matches.value_of("device").unwrap_or("hexapod"))?;
    let port = matches.value_of("port").map(str::parse::<u16>).transpose()?;
    let mut endpoint = settings.registry.resolve(class, port);
    if let Some(host) = matches.value_of("host") {
        endpoint.host = host.to_string();
    }
    // The registry ignores a port override for the hexapod; an explicit flag wins.
    if let Some(port) = port {
        endpoint.port = port;
    }
    Ok(endpoint)
}

fn print_reply(reply: Option<&str>, format: &str) {
    match (reply, format) {
        (reply, "json") => println!("{}", serde_json::json!({ "reply": reply })),
        (Some(reply), "compact") => println!("{}", reply),
        (Some("OK"), _) => println!("{} {}", "✅".green(), "OK".bright_green()),
        (Some(reply), _) if reply.starts_with('?') => {
            println!("{} {}", "❌".red(), reply.bright_red())
        }
        (Some(reply), _) => println!("{} {}", "📨".bright_blue(), reply.bright_white()),
        (None, _) => println!("{} {}", "🔌".yellow(), "Connection closed without a reply".yellow()),
    }
}

fn print_tags(tags: &[String], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(tags)?),
        "compact" => println!("{}", tags.join(" ")),
        _ => {
            println!("{} {}", "🏷️".bright_blue(), format!("{} tags", tags.len()).bright_blue().bold());
            for tag in tags {
                println!("  {}", tag.bright_white());
            }
        }
    }
    Ok(())
}

fn print_values(values: &BTreeMap<String, String>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(values)?),
        "compact" => {
            for (tag, value) in values {
                println!("{}={}", tag, value);
            }
        }
        _ => {
            let width = values.keys().map(String::len).max().unwrap_or(0);
            println!("{} {}", "📊".bright_blue(), "Device Values".bright_blue().bold());
            println!("{}", "═".repeat(width + 24).bright_blue());
            for (tag, value) in values {
                let padded = format!("{:<width$}", tag, width = width);
                println!("{}  {}", padded.bright_white(), value.bright_cyan());
            }
        }
    }
    Ok(())
}

fn print_lines(lines: &[String], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(lines)?),
        _ => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn print_bytes(bytes: Option<&[u8]>, format: &str) {
    let Some(bytes) = bytes else {
        println!("{} {}", "🔌".yellow(), "No register data".yellow());
        return;
    };
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    match format {
        "json" => println!("{}", serde_json::json!({ "bytes": bytes, "hex": hex.join("") })),
        "compact" => println!("{}", hex.join("")),
        _ => {
            for (row, chunk) in hex.chunks(16).enumerate() {
                println!("{:04x}  {}", row * 16, chunk.join(" ").bright_cyan());
            }
        }
    }
}
