//! Room templates, room naming and per-batch deduplication.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::emapi::{CollabRoom, Organization};

const DEFAULT_TEMPLATE: &str = "%s (%s)";

/// A room created for every organization on an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(rename = "isSecure", alias = "isSecured", default)]
    pub is_secure: bool,
}

/// Parsed rooms configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomsConfig {
    pub rooms: Vec<RoomTemplate>,
    /// printf-style name template; first `%s` is the room name, second the org label.
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl RoomsConfig {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Full room name for an organization, optionally paired with a child organization.
    ///
    /// `"Working Map"` for org `FD` gives `"Working Map (FD)"`; with child `PD`
    /// it gives `"Working Map (FD, PD)"`.
    pub fn full_room_name(
        &self,
        room_name: &str,
        org: &Organization,
        child: Option<&Organization>,
    ) -> String {
        let label = match child {
            Some(child) => format!("{}, {}", org.label(), child.label()),
            None => org.label().to_string(),
        };
        render_template(&self.template, &[room_name, &label])
    }
}

/// Substitute `%s` placeholders in order. `%%` renders a literal `%`.
/// Placeholders without a matching argument are kept as-is.
pub fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("%s"),
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    out
}

/// Rooms accumulated for one batch submission.
///
/// A room is built at most once per (room template, organization) pair. Joint
/// rooms are keyed by their parent, so a parent gets one joint room per
/// template however many of its children are escalated.
#[derive(Debug, Default)]
pub struct RoomBatch {
    seen: HashSet<(String, String)>,
    rooms: Vec<CollabRoom>,
}

impl RoomBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key identifying a room within a batch: the room template name and the org label.
    pub fn dedup_key(room_name: &str, org: &Organization) -> (String, String) {
        (room_name.to_string(), org.label().to_string())
    }

    pub fn contains(&self, key: &(String, String)) -> bool {
        self.seen.contains(key)
    }

    /// Add a room. Returns false, leaving the batch untouched, if the key was already used.
    pub fn push(&mut self, key: (String, String), room: CollabRoom) -> bool {
        if !self.seen.insert(key) {
            return false;
        }
        self.rooms.push(room);
        true
    }

    pub fn rooms(&self) -> &[CollabRoom] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
