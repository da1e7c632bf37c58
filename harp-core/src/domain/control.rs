//! Control and model card domain types
//!
//! A control describes one adjustable input of the remote model. The remote
//! service publishes its controls, together with a model card, through the
//! controls operation.

use serde::{Deserialize, Serialize};

/// A user-adjustable input parameter of a remote model
///
/// Serialized with a `ctrl_type` tag, e.g.
/// `{"ctrl_type": "slider", "label": "Pitch", "minimum": -12, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ctrl_type", rename_all = "snake_case")]
pub enum Control {
    /// Audio file input
    AudioIn { label: String },

    /// MIDI file input
    MidiIn { label: String },

    /// Bounded numeric slider
    Slider {
        label: String,
        minimum: f64,
        maximum: f64,
        step: f64,
        value: f64,
    },

    /// Free-form text
    Text {
        label: String,
        #[serde(default)]
        value: String,
    },

    /// Boolean switch
    Toggle {
        label: String,
        #[serde(default)]
        value: bool,
    },

    /// Choice among fixed options
    Dropdown {
        label: String,
        choices: Vec<String>,
        value: String,
    },

    /// Numeric entry; HARP apps publish it as `number_box` without bounds
    #[serde(rename = "number_box", alias = "number")]
    Number {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
        #[serde(default)]
        value: f64,
    },
}

impl Control {
    /// Display name of the control, also its positional key
    pub fn label(&self) -> &str {
        match self {
            Control::AudioIn { label }
            | Control::MidiIn { label }
            | Control::Slider { label, .. }
            | Control::Text { label, .. }
            | Control::Toggle { label, .. }
            | Control::Dropdown { label, .. }
            | Control::Number { label, .. } => label,
        }
    }

    /// Serialization tag of the variant
    pub fn ctrl_type(&self) -> &'static str {
        match self {
            Control::AudioIn { .. } => "audio_in",
            Control::MidiIn { .. } => "midi_in",
            Control::Slider { .. } => "slider",
            Control::Text { .. } => "text",
            Control::Toggle { .. } => "toggle",
            Control::Dropdown { .. } => "dropdown",
            Control::Number { .. } => "number_box",
        }
    }

    /// Whether this control carries the primary media input
    pub fn is_media_input(&self) -> bool {
        matches!(self, Control::AudioIn { .. } | Control::MidiIn { .. })
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.ctrl_type(), self.label())
    }
}

/// Static metadata describing a remote model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,

    /// Primary input is MIDI rather than audio
    #[serde(default)]
    pub midi_in: bool,

    /// Primary output is MIDI rather than audio
    #[serde(default)]
    pub midi_out: bool,
}

/// Payload returned by the controls operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsResponse {
    pub ctrls: Vec<Control>,
    pub card: ModelCard,
}

impl ControlsResponse {
    /// Number of media (audio or MIDI) inputs declared
    pub fn media_input_count(&self) -> usize {
        self.ctrls.iter().filter(|c| c.is_media_input()).count()
    }
}
