//! Canned replies standing in for real hardware.

/// Status dump captured from the f/5 hexapod crate at Sunnyside on
/// 2003-03-13. Only the version string differs from the real capture.
pub const HEXAPOD_FIXTURE: &str = include_str!("fixtures/hexapod.txt");

pub const MOUNT_FIXTURE: &str = include_str!("fixtures/mount.txt");

/// Single-line status returned by every simulated command.
pub const SIMULATED_STATUS: &str = "OK";

/// Replays one fixture block for every line-protocol exchange.
///
/// There is no cursor: each call to [`Simulator::replay`] starts again at
/// the first line, so repeated queries see identical data.
#[derive(Debug, Clone)]
pub struct Simulator {
    lines: Vec<String>,
}

impl Simulator {
    pub fn new(block: &str) -> Self {
        let lines = block
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn hexapod() -> Self {
        Self::new(HEXAPOD_FIXTURE)
    }

    pub fn mount() -> Self {
        Self::new(MOUNT_FIXTURE)
    }

    pub fn replay(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
