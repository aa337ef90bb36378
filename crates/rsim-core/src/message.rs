//! Immutable event values and the typed [`MessageKind`] interface.
//!
//! A [`Message`] carries a structural [`MessageType`], a [`Priority`]
//! and a [`Payload`]. Concrete message kinds are plain Rust types that
//! implement [`MessageKind`]; they convert into and out of the closed
//! payload enum, so dispatch never needs a runtime downcast.
//!
//! Constructing a message delivers nothing. Only handing it to the
//! broker's `publish` does.

use smallvec::SmallVec;

use crate::id::MessageType;
use crate::priority::Priority;

// ── Payload ─────────────────────────────────────────────────────

/// Kind-specific data carried by a [`Message`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    /// No data; the type identifier is the whole event.
    #[default]
    Empty,
    /// A key code (keyboard input).
    Key {
        /// Platform key code.
        code: i32,
    },
    /// Button states of an input device.
    Buttons {
        /// Device index.
        device: u32,
        /// Pressed state per button.
        pressed: SmallVec<[bool; 16]>,
    },
    /// A short vector of scalar values (setpoints, telemetry).
    Scalars(SmallVec<[f32; 4]>),
    /// Free-form text.
    Text(String),
}

// ── MessageKind ─────────────────────────────────────────────────

/// A concrete message kind with a constant type identifier.
///
/// # Examples
///
/// ```
/// use rsim_core::{Message, MessageKind, MessageType, Payload, Priority};
///
/// struct Setpoint(f32);
///
/// impl MessageKind for Setpoint {
///     const TYPE: MessageType = MessageType::new(20, 1);
///     const PRIORITY: Priority = Priority::Higher;
///
///     fn into_payload(self) -> Payload {
///         Payload::Scalars([self.0].into_iter().collect())
///     }
///
///     fn from_payload(payload: &Payload) -> Option<Self> {
///         match payload {
///             Payload::Scalars(v) => v.first().copied().map(Setpoint),
///             _ => None,
///         }
///     }
/// }
///
/// let msg = Message::new(Setpoint(0.5));
/// assert_eq!(msg.message_type(), Setpoint::TYPE);
/// assert_eq!(msg.priority(), Priority::Higher);
/// assert_eq!(msg.decode::<Setpoint>().map(|s| s.0), Some(0.5));
/// ```
pub trait MessageKind: Sized {
    /// Structural identifier shared by every message of this kind.
    const TYPE: MessageType;

    /// Priority used when the sender does not choose one.
    const PRIORITY: Priority = Priority::Normal;

    /// Convert into the wire-neutral payload.
    fn into_payload(self) -> Payload;

    /// Rebuild from a payload. Returns `None` if the payload shape does
    /// not match this kind.
    fn from_payload(payload: &Payload) -> Option<Self>;
}

// ── Message ─────────────────────────────────────────────────────

/// An immutable typed event.
///
/// Fields are private: once built, a message is never mutated. The
/// broker shares one allocation between all subscribers of a batch and
/// drops it after the batch has been fully delivered.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    message_type: MessageType,
    priority: Priority,
    payload: Payload,
}

impl Message {
    /// Build a message of kind `K` at the kind's default priority.
    pub fn new<K: MessageKind>(kind: K) -> Self {
        Self::with_priority(kind, K::PRIORITY)
    }

    /// Build a message of kind `K` at an explicit priority.
    pub fn with_priority<K: MessageKind>(kind: K, priority: Priority) -> Self {
        Self {
            message_type: K::TYPE,
            priority,
            payload: kind.into_payload(),
        }
    }

    /// Build a message from its raw parts.
    pub fn from_parts(message_type: MessageType, priority: Priority, payload: Payload) -> Self {
        Self {
            message_type,
            priority,
            payload,
        }
    }

    /// A payload-less message of the given type at normal priority.
    pub fn signal(message_type: MessageType) -> Self {
        Self::from_parts(message_type, Priority::Normal, Payload::Empty)
    }

    /// Structural type identifier.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Delivery priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Kind-specific data.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether this message has `K`'s type identifier.
    pub fn is<K: MessageKind>(&self) -> bool {
        self.message_type == K::TYPE
    }

    /// Decode as kind `K`.
    ///
    /// Returns `None` if the type identifier differs or the payload does
    /// not have the shape `K` expects.
    pub fn decode<K: MessageKind>(&self) -> Option<K> {
        if !self.is::<K>() {
            return None;
        }
        K::from_payload(&self.payload)
    }
}

// ── Built-in kinds ──────────────────────────────────────────────

/// A key was pressed in the rendering window or on a remote console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPressed {
    /// Platform key code.
    pub key: i32,
}

impl MessageKind for KeyPressed {
    const TYPE: MessageType = MessageType::new(1, 1);

    fn into_payload(self) -> Payload {
        Payload::Key { code: self.key }
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Key { code } => Some(Self { key: *code }),
            _ => None,
        }
    }
}

/// Button states sampled from a joystick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoystickButtons {
    /// Joystick index.
    pub joystick: u32,
    /// Pressed state per button.
    pub buttons: SmallVec<[bool; 16]>,
}

impl JoystickButtons {
    /// Whether button `index` is pressed. Out-of-range buttons read as
    /// released.
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

impl MessageKind for JoystickButtons {
    const TYPE: MessageType = MessageType::new(0, 10);

    fn into_payload(self) -> Payload {
        Payload::Buttons {
            device: self.joystick,
            pressed: self.buttons,
        }
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Buttons { device, pressed } => Some(Self {
                joystick: *device,
                buttons: pressed.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn key_pressed_defaults_to_normal_priority() {
        let msg = Message::new(KeyPressed { key: 'w' as i32 });
        assert_eq!(msg.message_type(), KeyPressed::TYPE);
        assert_eq!(msg.priority(), Priority::Normal);
        assert_eq!(msg.decode::<KeyPressed>(), Some(KeyPressed { key: 'w' as i32 }));
    }

    #[test]
    fn explicit_priority_overrides_kind_default() {
        let msg = Message::with_priority(KeyPressed { key: 1 }, Priority::Highest);
        assert_eq!(msg.priority(), Priority::Highest);
    }

    #[test]
    fn decode_rejects_other_kinds() {
        let msg = Message::new(KeyPressed { key: 7 });
        assert!(msg.decode::<JoystickButtons>().is_none());
        assert!(!msg.is::<JoystickButtons>());
    }

    #[test]
    fn decode_rejects_mismatched_payload() {
        let msg = Message::from_parts(KeyPressed::TYPE, Priority::Normal, Payload::Text("x".into()));
        assert!(msg.is::<KeyPressed>());
        assert!(msg.decode::<KeyPressed>().is_none());
    }

    #[test]
    fn joystick_buttons_out_of_range_read_released() {
        let js = JoystickButtons {
            joystick: 0,
            buttons: smallvec![true, false],
        };
        assert!(js.button(0));
        assert!(!js.button(1));
        assert!(!js.button(9));
        let msg = Message::new(js.clone());
        assert_eq!(msg.decode::<JoystickButtons>(), Some(js));
    }

    #[test]
    fn signal_is_empty_and_normal() {
        let ty = MessageType::new(42, 0);
        let msg = Message::signal(ty);
        assert_eq!(msg.payload(), &Payload::Empty);
        assert_eq!(msg.priority(), Priority::Normal);
    }
}
