//! Message bus topic mapping.
//!
//! The bus client itself lives outside this crate. This module only turns
//! inbound `(topic, payload)` pairs into command requests and zone status
//! snapshots into per-field updates:
//!
//! ```text
//! <prefix>/set/<zone>/<action>      inbound, payload used by `source` only
//! <prefix>/status/<zone>/<field>    outbound, payload is the field value
//! ```

use crate::error::{Error, Result};
use crate::event::Event;
use crate::protocol::{Command, CommandRequest, Source};
use crate::types::{ZoneStatus, on_off};

/// Default topic prefix.
pub const DEFAULT_PREFIX: &str = "/htdserial";

/// A single outbound field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Topic to publish on.
    pub topic: String,
    /// Field value as text.
    pub value: String,
}

/// Topic layout for one amplifier.
#[derive(Debug, Clone)]
pub struct Topics {
    prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Topics {
    /// Creates a layout rooted at `prefix` (no trailing slash).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Subscription filter covering every inbound command topic.
    #[must_use]
    pub fn command_filter(&self) -> String {
        format!("{}/set/#", self.prefix)
    }

    /// Parses an inbound command message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTopic`] for a topic outside the command layout,
    /// [`Error::InvalidZone`] for a non-numeric zone,
    /// [`Error::UnknownAction`] for an unrecognized action and
    /// [`Error::InvalidSource`] for a source payload that is not 1-6.
    pub fn parse_command(&self, topic: &str, payload: &[u8]) -> Result<CommandRequest> {
        let invalid = || Error::InvalidTopic {
            topic: topic.to_string(),
        };

        let rest = topic
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix("/set/"))
            .ok_or_else(invalid)?;

        let mut levels = rest.split('/');
        let (Some(zone), Some(action), None) = (levels.next(), levels.next(), levels.next())
        else {
            return Err(invalid());
        };

        let zone = zone.parse::<u8>().map_err(|_| Error::InvalidZone {
            value: zone.to_string(),
        })?;

        let command = match action {
            "poweroff" => Command::PowerOff,
            "poweron" => Command::PowerOn,
            "volumeup" => Command::VolumeUp,
            "volumedown" => Command::VolumeDown,
            "balanceleft" => Command::BalanceLeft,
            "balanceright" => Command::BalanceRight,
            "trebleup" => Command::TrebleUp,
            "trebledown" => Command::TrebleDown,
            "bassup" => Command::BassUp,
            "bassdown" => Command::BassDown,
            "source" => Command::SetSource(String::from_utf8_lossy(payload).parse::<Source>()?),
            "query" => Command::Query,
            _ => {
                return Err(Error::UnknownAction {
                    action: action.to_string(),
                });
            }
        };

        Ok(CommandRequest::new(zone, command))
    }

    /// Splits a zone status snapshot into one update per field.
    #[must_use]
    pub fn status_updates(&self, status: &ZoneStatus) -> Vec<StatusUpdate> {
        let fields = [
            ("power", on_off(status.power).to_string()),
            ("volume", status.volume.to_string()),
            ("source", status.input.to_string()),
            ("bass", status.bass.to_string()),
            ("treble", status.treble.to_string()),
            ("balance", status.balance.to_string()),
            ("mute", on_off(status.mute).to_string()),
            ("party-mode", on_off(status.party_mode).to_string()),
            ("party-input", status.party_input.to_string()),
        ];

        fields
            .into_iter()
            .map(|(field, value)| StatusUpdate {
                topic: format!("{}/status/{}/{}", self.prefix, status.zone, field),
                value,
            })
            .collect()
    }

    /// Updates to publish for an event. Only zone status produces any.
    #[must_use]
    pub fn updates_for(&self, event: &Event) -> Vec<StatusUpdate> {
        match event {
            Event::ZoneStatus(status) => self.status_updates(status),
            _ => Vec::new(),
        }
    }
}
