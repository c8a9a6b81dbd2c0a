//! Device side of the line protocol, answering from a fixture.
//!
//! Used by the `mmtsock-emulator` binary to stand in for a crate on a real
//! socket, sentinel framing included.

use crate::protocol::{first_token, SENTINEL};
use crate::shortcuts::OK_REPLY;
use crate::simulator::Simulator;

#[derive(Debug, Clone)]
pub struct Responder {
    fixture: Simulator,
}

impl Responder {
    pub fn new(fixture: Simulator) -> Self {
        Self { fixture }
    }

    /// Reply lines for one request line, without newlines.
    ///
    /// Multi-line replies end with the sentinel; `@ident` answers a single
    /// `OK`. Unknown requests echo back as `? <request>` followed by the
    /// sentinel, the way the hexapod rejects a bogus command.
    pub fn reply(&self, request: &str) -> Vec<String> {
        let request = request.trim();
        if request.is_empty() {
            return Vec::new();
        }

        let mut words = request.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let mut lines: Vec<String> = match verb {
            "@ident" => return vec![OK_REPLY.to_string()],
            "all" => self.fixture.replay().cloned().collect(),
            "version" => self.matching("version"),
            "get" => match words.next() {
                Some(tag) => self.matching(tag),
                None => vec![format!("? {}", request)],
            },
            _ => vec![format!("? {}", request)],
        };
        lines.push(SENTINEL.to_string());
        lines
    }

    fn matching(&self, tag: &str) -> Vec<String> {
        self.fixture
            .replay()
            .filter(|line| first_token(line) == Some(tag))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexapod() -> Responder {
        Responder::new(Simulator::hexapod())
    }

    #[test]
    fn test_all_is_sentinel_terminated() {
        let reply = hexapod().reply("all");
        assert_eq!(reply.len(), Simulator::hexapod().len() + 1);
        assert_eq!(reply.last().map(String::as_str), Some(SENTINEL));
    }

    #[test]
    fn test_get_single_tag() {
        assert_eq!(hexapod().reply("get pod_status\n"), vec!["pod_status 0000", ".EOF"]);
        assert_eq!(hexapod().reply("get no_such_tag"), vec![".EOF"]);
    }

    #[test]
    fn test_ident_and_bogus() {
        assert_eq!(hexapod().reply("@ident MMT"), vec!["OK"]);
        assert_eq!(hexapod().reply("bogus"), vec!["? bogus", ".EOF"]);
        assert!(hexapod().reply("   ").is_empty());
    }
}
