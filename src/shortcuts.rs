//! One-shot helpers: open a client, run one operation, close.
//!
//! Each returns `Ok(None)` when the device could not be reached, so batch
//! scripts can check once and skip. The command and get helpers also fold a
//! plain `OK` reply into `None`. That keeps "no error" and "no data" apart
//! only as long as no device ever reports a literal `OK` payload.

use tracing::debug;

use crate::client::{DeviceClient, TagMap, DEFAULT_SELECTOR};
use crate::config::Settings;
use crate::error::MmtResult;
use crate::registry::{DeviceClass, Registry};

/// Register code that resets a crate.
pub const REBOOT_CODE: u16 = 123;

pub(crate) const OK_REPLY: &str = "OK";

fn with_client<T, F>(class: DeviceClass, settings: &Settings, op: F) -> MmtResult<Option<T>>
where
    F: FnOnce(&mut DeviceClient) -> MmtResult<T>,
{
    let mut client = DeviceClient::open(class, None, settings);
    if client.is_failed() {
        return Ok(None);
    }
    let result = op(&mut client);
    client.close();
    result.map(Some)
}

fn collapse_ok(reply: Option<Option<String>>) -> Option<String> {
    reply.flatten().filter(|r| r != OK_REPLY)
}

pub fn hexapod_values(settings: &Settings) -> MmtResult<Option<TagMap>> {
    with_client(DeviceClass::Hexapod, settings, |c| c.values(DEFAULT_SELECTOR))
}

pub fn hexapod_tags(settings: &Settings) -> MmtResult<Option<Vec<String>>> {
    with_client(DeviceClass::Hexapod, settings, |c| c.tags(DEFAULT_SELECTOR))
}

pub fn hexapod_command(settings: &Settings, cmd: &str) -> MmtResult<Option<String>> {
    with_client(DeviceClass::Hexapod, settings, |c| c.command(cmd)).map(collapse_ok)
}

pub fn mount_command(settings: &Settings, cmd: &str) -> MmtResult<Option<String>> {
    with_client(DeviceClass::Mount, settings, |c| c.command(cmd)).map(collapse_ok)
}

pub fn hexapod_get(settings: &Settings, tag: &str) -> MmtResult<Option<String>> {
    with_client(DeviceClass::Hexapod, settings, |c| c.get(tag)).map(collapse_ok)
}

pub fn mount_get(settings: &Settings, tag: &str) -> MmtResult<Option<String>> {
    with_client(DeviceClass::Mount, settings, |c| c.get(tag)).map(collapse_ok)
}

/// Send the reset frame to `host` and hang up without waiting: the crate
/// goes down and cannot answer.
pub fn reboot(settings: &Settings, host: &str) -> MmtResult<()> {
    let endpoint = Registry::reboot_endpoint(host);
    let mut client = DeviceClient::connect(endpoint, settings);
    debug!("rebooting {}", client.endpoint());
    let result = client.send_register(REBOOT_CODE, 0);
    client.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_ok() {
        assert_eq!(collapse_ok(Some(Some("OK".to_string()))), None);
        assert_eq!(collapse_ok(Some(None)), None);
        assert_eq!(collapse_ok(None), None);
        assert_eq!(
            collapse_ok(Some(Some("? bogus".to_string()))),
            Some("? bogus".to_string())
        );
    }
}
