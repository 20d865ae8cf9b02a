//! One synchronous command/response session against a configured device.
//!
//! The session owns its transport exclusively. The protocol is half-duplex
//! with no pipelining, so callers must serialize their own invocations.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::{DeviceError, Result};
use crate::config::{resolve, DeviceGrammar, EffectiveConfig, GrammarRegistry};
use crate::serial::{SerialInterface, SerialLink};

/// Successful reply payload: the raw response text, plus the mapped meaning
/// when the grammar classifies replies through `known_responses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub response: String,
    pub meaning: Option<String>,
}

pub struct DeviceSession {
    grammar: DeviceGrammar,
    link: Box<dyn SerialLink>,
}

impl DeviceSession {
    /// Resolve the grammar for `device_id`, open `port` with the resolved
    /// settings and build a session. The explicit `port` argument takes
    /// precedence over any configured `port` setting.
    pub fn connect(
        registry: &GrammarRegistry,
        device_id: &str,
        port: &str,
        overrides: &BTreeMap<String, Value>,
    ) -> Result<Self> {
        let mut config = resolve(registry, device_id, overrides)?;
        config.settings.port = Some(port.to_string());
        let interface = SerialInterface::open(&config.settings)?;
        log::info!("Session open for {} on {}", device_id, port);
        Ok(Self::attach(config, Box::new(interface)))
    }

    /// Build a session over an already-open link. Used by tests and by
    /// callers that manage the transport themselves.
    pub fn attach(config: EffectiveConfig, link: Box<dyn SerialLink>) -> Self {
        Self {
            grammar: config.grammar,
            link,
        }
    }

    /// Command aliases this device understands.
    pub fn commands(&self) -> Vec<&str> {
        self.grammar.command_list.keys().map(String::as_str).collect()
    }

    /// Action aliases valid for `command`.
    pub fn actions(&self, command: &str) -> Result<Vec<&str>> {
        let entry = self.grammar.command_list.get(command).ok_or_else(|| {
            DeviceError::InvalidCommand(format!("{command} is not a valid command for this device"))
        })?;
        Ok(entry.actions.keys().map(String::as_str).collect())
    }

    /// Render the wire string for (`command`, `action`) without sending it.
    pub fn render_request(&self, command: &str, action: &str) -> Result<String> {
        render_request(&self.grammar, command, action)
    }

    /// Run one request/response exchange: optional handshake, send, wait,
    /// drain-read, classify.
    pub fn execute(&mut self, command: &str, action: &str) -> Result<CommandOutcome> {
        // Validates (command, action) before anything touches the transport.
        let request = render_request(&self.grammar, command, action)?;

        self.do_handshake()?;

        log::info!("send: {:?}", request);
        self.link.write_bytes(request.as_bytes())?;

        sleep_secs(self.grammar.wait_time);

        let response = self.drain_response()?;
        log::info!("recv: {:?}", response);
        classify_response(&self.grammar, response)
    }

    fn do_handshake(&mut self) -> Result<()> {
        let Some(handshake) = self.grammar.handshake.clone() else {
            return Ok(());
        };
        self.link.write_bytes(handshake.send.as_bytes())?;
        sleep_secs(handshake.wait);

        let mut buf = vec![0u8; handshake.expect.len()];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.link.read_bytes(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        let reply = String::from_utf8_lossy(&buf[..filled]);
        if reply != handshake.expect {
            // Advisory only; the exchange continues.
            log::warn!("unexpected response to handshake: {:?}", reply);
        }
        Ok(())
    }

    /// Read single bytes while the channel reports buffered data. One upfront
    /// wait, no retry loop: a device slower than `wait_time` yields a
    /// truncated or empty reply.
    fn drain_response(&mut self) -> Result<String> {
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];
        while self.link.bytes_available()? > 0 {
            let n = self.link.read_bytes(&mut byte)?;
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&byte[..n]);
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

fn render_request(grammar: &DeviceGrammar, command: &str, action: &str) -> Result<String> {
    let entry = grammar.command_list.get(command).ok_or_else(|| {
        DeviceError::InvalidCommand(format!("{command} is not a valid command for this device"))
    })?;
    let wire_action = entry.actions.get(action).ok_or_else(|| {
        DeviceError::InvalidCommand(format!("{action} is not a valid action for command {command}"))
    })?;
    Ok(format!(
        "{}{}{}{}{}",
        grammar.left_surround, entry.command, grammar.separator, wire_action, grammar.right_surround
    ))
}

fn classify_response(grammar: &DeviceGrammar, response: String) -> Result<CommandOutcome> {
    // Fire-and-forget commands reply with nothing at all.
    if response.is_empty() {
        return Ok(CommandOutcome {
            response,
            meaning: None,
        });
    }

    if !grammar.known_responses.is_empty() {
        let stripped = strip_surrounds(grammar, &response);
        return match grammar.known_responses.get(stripped) {
            Some(meaning) => Ok(CommandOutcome {
                meaning: Some(meaning.clone()),
                response,
            }),
            None => Err(DeviceError::CommandFailed {
                message: "Received an unknown response".to_string(),
                response,
            }),
        };
    }

    if let Some(failed) = &grammar.command_failed_message {
        if response.contains(failed) {
            return Err(DeviceError::CommandFailed {
                message: "Command failed, likely due to an invalid state change".to_string(),
                response,
            });
        }
    }
    if let Some(exception) = &grammar.exception_message {
        if response.contains(exception) {
            return Err(DeviceError::CommandException { response });
        }
    }

    Ok(CommandOutcome {
        response,
        meaning: None,
    })
}

/// Character-set strip of the surround tokens, both ends. Replies rarely
/// carry the full token verbatim (a device may answer `*POW=ON#` against a
/// `\r*` surround), so each configured character is trimmed individually.
fn strip_surrounds<'a>(grammar: &DeviceGrammar, response: &'a str) -> &'a str {
    response
        .trim_start_matches(|c| grammar.left_surround.contains(c))
        .trim_end_matches(|c| grammar.right_surround.contains(c))
}

fn sleep_secs(seconds: f64) {
    if seconds > 0.0 {
        thread::sleep(Duration::from_secs_f64(seconds));
    }
}
