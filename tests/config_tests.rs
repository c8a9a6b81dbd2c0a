use mmtsock::registry::{
    BCELL_PORT, BMOUNT_PORT, CELL_HOST, CELL_PORT, CELL_REBOOT_PORT, DEFAULT_HEXAPOD_PORT,
    DEFAULT_MOUNT_PORT, ECELL_PORT, REBOOT_PORT, SIM_HOST, SIM_PORT,
};
use mmtsock::*;
use std::time::Duration;

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.connect_timeout(), Some(Duration::from_millis(1500)));
    assert_eq!(settings.read_timeout(), None);
    assert_eq!(settings.simulate, SimulationMode::Off);
    assert!(!settings.simulate.is_active());
    assert_eq!(settings.registry.hexapod, Endpoint::new("hexapod", DEFAULT_HEXAPOD_PORT));
    assert_eq!(settings.registry.mount, Endpoint::new("mount", DEFAULT_MOUNT_PORT));
}

#[test]
fn test_zero_timeouts_disable_deadlines() {
    let settings = Settings::default()
        .with_connect_timeout(Duration::ZERO)
        .with_read_timeout(Some(Duration::ZERO));

    assert_eq!(settings.connect_timeout(), None);
    assert_eq!(settings.read_timeout(), None);

    let settings = settings.with_read_timeout(Some(Duration::from_millis(250)));
    assert_eq!(settings.read_timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn test_settings_json_round_trip() {
    let mut settings = Settings::default()
        .with_connect_timeout(Duration::from_millis(500))
        .with_simulation(SimulationMode::Mount);
    settings.registry.set_mount(Some("mount-test"), Some(6000));

    let json = settings.to_json().unwrap();
    assert!(json.contains("\"simulate\": \"mount\""));

    let parsed = Settings::from_json(&json).unwrap();
    assert_eq!(parsed, settings);
}

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let settings = Settings::from_json(
        r#"{ "read_timeout_ms": 2000, "registry": { "hexapod": { "host": "hexapod-lab", "port": 5341 } } }"#,
    )
    .unwrap();

    assert_eq!(settings.connect_timeout(), Some(Duration::from_millis(1500)));
    assert_eq!(settings.read_timeout(), Some(Duration::from_secs(2)));
    assert_eq!(settings.simulate, SimulationMode::Off);
    assert_eq!(settings.registry.hexapod, Endpoint::new("hexapod-lab", 5341));
    assert_eq!(settings.registry.mount, Endpoint::new("mount", DEFAULT_MOUNT_PORT));
}

#[test]
fn test_bad_json_is_config_error() {
    let result = Settings::from_json("{ \"simulate\": \"telescope\" }");
    assert!(matches!(result, Err(MmtError::Config(_))));

    let result = Settings::load("/nonexistent/mmtsock.json");
    assert!(matches!(result, Err(MmtError::Config(_))));
}

#[test]
fn test_registry_setters_keep_unsupplied_fields() {
    let mut registry = Registry::new();

    registry.set_mount(None, Some(5241));
    assert_eq!(registry.mount, Endpoint::new("mount", 5241));

    registry.set_mount(Some("mount2"), None);
    assert_eq!(registry.mount, Endpoint::new("mount2", 5241));

    registry.set_hexapod(Some("hex2"), None);
    assert_eq!(registry.hexapod, Endpoint::new("hex2", DEFAULT_HEXAPOD_PORT));
}

#[test]
fn test_registry_resolves_every_class() {
    let registry = Registry::default();

    assert_eq!(
        registry.resolve(DeviceClass::Hexapod, None),
        Endpoint::new("hexapod", 5340)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Mount, None),
        Endpoint::new("mount", 5240)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Sim, None),
        Endpoint::new(SIM_HOST, SIM_PORT)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Cell, None),
        Endpoint::new(CELL_HOST, CELL_PORT)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Bcell, None),
        Endpoint::new(CELL_HOST, BCELL_PORT)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Ecell, None),
        Endpoint::new(CELL_HOST, ECELL_PORT)
    );
    assert_eq!(
        registry.resolve(DeviceClass::Bmount, None),
        Endpoint::new("mount", BMOUNT_PORT)
    );
}

#[test]
fn test_registry_port_override() {
    let mut registry = Registry::default();
    registry.set_mount(Some("mount-b"), None);

    assert_eq!(registry.resolve(DeviceClass::Mount, Some(5250)).port, 5250);
    assert_eq!(registry.resolve(DeviceClass::Cell, Some(5811)).port, 5811);
    assert_eq!(
        registry.resolve(DeviceClass::Bmount, Some(5221)),
        Endpoint::new("mount-b", 5221)
    );
    // Hexapod always uses its registered port.
    assert_eq!(
        registry.resolve(DeviceClass::Hexapod, Some(9999)).port,
        DEFAULT_HEXAPOD_PORT
    );
}

#[test]
fn test_reboot_endpoints() {
    assert_eq!(
        Registry::reboot_endpoint("mount"),
        Endpoint::new("mount", REBOOT_PORT)
    );
    assert_eq!(
        Registry::reboot_endpoint("hexapod"),
        Endpoint::new("hexapod", REBOOT_PORT)
    );
    assert_eq!(
        Registry::reboot_endpoint(CELL_HOST),
        Endpoint::new(CELL_HOST, CELL_REBOOT_PORT)
    );
}

#[test]
fn test_device_class_names() {
    for class in DeviceClass::ALL {
        assert_eq!(class.to_string().parse::<DeviceClass>().unwrap(), class);
    }
    assert_eq!("bmount".parse::<DeviceClass>().unwrap(), DeviceClass::Bmount);
    assert!(matches!(
        "telescope".parse::<DeviceClass>(),
        Err(MmtError::Config(_))
    ));
}

#[test]
fn test_simulation_mode_names() {
    assert_eq!("off".parse::<SimulationMode>().unwrap(), SimulationMode::Off);
    assert_eq!("none".parse::<SimulationMode>().unwrap(), SimulationMode::Off);
    assert_eq!(
        "hexapod".parse::<SimulationMode>().unwrap(),
        SimulationMode::Hexapod
    );
    assert_eq!("mount".parse::<SimulationMode>().unwrap(), SimulationMode::Mount);
    assert!("cell".parse::<SimulationMode>().is_err());

    assert!(SimulationMode::Hexapod.fixture().is_some());
    assert!(SimulationMode::Off.fixture().is_none());
}

#[test]
fn test_error_status_text() {
    assert_eq!(MmtError::ConnectionRefused.status(), "Refusing connection");
    assert_eq!(
        MmtError::Connection("no route to host".to_string()).status(),
        "Error: no route to host"
    );
}
