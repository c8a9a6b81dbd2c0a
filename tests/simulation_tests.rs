use mmtsock::shortcuts;
use mmtsock::*;

fn hexapod_settings() -> Settings {
    Settings::simulated(SimulationMode::Hexapod)
}

#[test]
fn test_simulated_hexapod_values() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());
    assert_eq!(client.state(), &ConnectionState::Simulated);
    assert!(client.status().is_none());

    let values = client.values("all").unwrap();
    assert!(values["version"].starts_with("SIMULATED,"));
    assert_eq!(values["version"], "SIMULATED, Compiled: Wed Mar 12 11:58:41 MST 2003");
    assert_eq!(values["pod_status"], "0000");
    assert_eq!(values["lvdt_1"], "-26380");
    assert_eq!(values["reply_q"], "But nobody is home");
    assert_eq!(values["cell_reply"], "Eat more fish!");
}

#[test]
fn test_simulated_get() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());

    assert_eq!(client.get("reply_s").unwrap().as_deref(), Some("The Lights are on"));
    assert_eq!(client.get("sensor_5").unwrap().as_deref(), Some("0"));
    assert_eq!(client.get("no_such_tag").unwrap(), None);
}

#[test]
fn test_tags_follow_line_order() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());

    let lines = client.lines("all").unwrap();
    let tags = client.tags("all").unwrap();
    let expected: Vec<String> = lines
        .iter()
        .map(|l| l.split_whitespace().next().unwrap().to_string())
        .collect();

    assert_eq!(tags, expected);
    assert_eq!(tags.first().map(String::as_str), Some("version"));
    assert_eq!(tags.last().map(String::as_str), Some("sensor_5"));
}

#[test]
fn test_get_agrees_with_values() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());
    let values = client.values("all").unwrap();

    for tag in ["pod_names", "matrix", "encoder_d", "cmdxyz_tx", "force_6"] {
        assert_eq!(client.get(tag).unwrap().as_ref(), values.get(tag));
    }
}

#[test]
fn test_simulation_is_deterministic() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());

    let first = client.lines("all").unwrap();
    let second = client.lines("all").unwrap();
    let third = client.lines("anything at all").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, third);
    assert_eq!(client.values("all").unwrap(), client.values("all").unwrap());
}

#[test]
fn test_simulated_commands_answer_ok() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());

    assert_eq!(client.identify("MMT").unwrap().as_deref(), Some("OK"));
    assert_eq!(client.command("stop").unwrap().as_deref(), Some("OK"));
    assert_eq!(
        client.command_with_args("offset", [1, 2]).unwrap().as_deref(),
        Some("OK")
    );
}

#[test]
fn test_simulated_registers_are_absent() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());

    assert!(client.send_register(123, 0).is_ok());
    assert_eq!(client.get_register(1, 2, 4).unwrap(), None);
    assert_eq!(client.peek_register(4).unwrap(), None);
}

#[test]
fn test_simulated_mount_version() {
    let settings = Settings::simulated(SimulationMode::Mount);
    let mut client = DeviceClient::mount(&settings, None);

    assert_eq!(client.version().unwrap(), vec!["version bogus bongos".to_string()]);
    assert_eq!(client.get("version").unwrap().as_deref(), Some("bogus bongos"));
}

#[test]
fn test_show_and_dump() {
    let settings = Settings::simulated(SimulationMode::Mount);
    let mut client = DeviceClient::mount(&settings, None);

    let mut shown = Vec::new();
    assert_eq!(client.show("version", &mut shown).unwrap(), 1);
    assert_eq!(String::from_utf8(shown).unwrap(), "version bogus bongos\n");

    let mut dumped = Vec::new();
    assert_eq!(client.dump("version", &mut dumped).unwrap(), 1);
    assert_eq!(String::from_utf8(dumped).unwrap(), "21version bogus bongos\n");
}

#[test]
fn test_every_device_class_simulates() {
    let settings = hexapod_settings();
    for class in DeviceClass::ALL {
        let mut client = DeviceClient::open(class, None, &settings);
        assert!(client.is_simulated(), "{} should be simulated", class);
        assert_eq!(client.get("pod_status").unwrap().as_deref(), Some("0000"));
    }
}

#[test]
fn test_closed_simulation_goes_quiet() {
    let mut client = DeviceClient::hexapod(&hexapod_settings());
    client.close();
    client.close();

    assert_eq!(client.state(), &ConnectionState::Disconnected);
    assert!(client.values("all").unwrap().is_empty());
    assert_eq!(client.get("reply_s").unwrap(), None);
}

#[test]
fn test_shortcuts_in_simulation() {
    let settings = hexapod_settings();

    let values = shortcuts::hexapod_values(&settings).unwrap().unwrap();
    assert_eq!(values["lvdt_1"], "-26380");

    let tags = shortcuts::hexapod_tags(&settings).unwrap().unwrap();
    assert_eq!(tags.len(), Simulator::hexapod().len());

    assert_eq!(
        shortcuts::hexapod_get(&settings, "reply_s").unwrap().as_deref(),
        Some("The Lights are on")
    );
    assert_eq!(shortcuts::hexapod_command(&settings, "stop").unwrap(), None);
    assert_eq!(shortcuts::mount_command(&settings, "stop").unwrap(), None);
    assert_eq!(shortcuts::mount_get(&settings, "no_such_tag").unwrap(), None);

    // No socket is opened in simulation, so the reset frame goes nowhere.
    assert!(shortcuts::reboot(&settings, "mount").is_ok());
}
