//! Persisted device settings.
//!
//! Settings are addressed by `(namespace, key)` and hold either a byte or
//! a string. [`MemoryStore`] keeps them in RAM and serializes the whole
//! set into one blob, which the firmware writes to flash
//! (see `storage.rs`).
//!
//! Blob layout:
//! ```text
//! [count]
//! repeated: [ns_len][ns..][key_len][key..][tag]
//!           tag 0 → [value u8]
//!           tag 1 → [len][bytes..]
//! ```

use heapless::{String, Vec};

use crate::action::ActionString;
use crate::config::{
    DEFAULT_ACTIONS, DEFAULT_LED_BRIGHTNESS, DEFAULT_METER_STYLE, HALL_BUTTON_COUNT,
    SETTINGS_MAX_ENTRIES, SETTINGS_NAMESPACE, SETTINGS_NAME_LEN,
};
use crate::error::{Error, Result};
use crate::meter::MeterStyle;

const TAG_U8: u8 = 0;
const TAG_STR: u8 = 1;

/// Keys of the six button actions.
pub const ACTION_KEYS: [&str; HALL_BUTTON_COUNT] = ["btn0", "btn1", "btn2", "btn3", "btn4", "btn5"];
pub const KEY_METER_STYLE: &str = "meterStyle";
pub const KEY_LED_BRIGHTNESS: &str = "ledBrightness";

/// Key/value settings storage.
pub trait SettingsStore {
    fn get_u8(&self, namespace: &str, key: &str) -> Result<Option<u8>>;
    fn set_u8(&mut self, namespace: &str, key: &str, value: u8) -> Result<()>;
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<ActionString>>;
    fn set_string(&mut self, namespace: &str, key: &str, value: &str) -> Result<()>;
}

type Name = String<SETTINGS_NAME_LEN>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Value {
    U8(u8),
    Str(ActionString),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    namespace: Name,
    key: Name,
    value: Value,
}

/// In-RAM settings store with a dirty flag for write-back.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry, SETTINGS_MAX_ENTRIES>,
    dirty: bool,
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when something changed since the last [`Self::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn find(&self, namespace: &str, key: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.namespace == namespace && e.key == key)
    }

    fn put(&mut self, namespace: &str, key: &str, value: Value) -> Result<()> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.namespace == namespace && e.key == key)
        {
            if entry.value != value {
                entry.value = value;
                self.dirty = true;
            }
            return Ok(());
        }
        let entry = Entry {
            namespace: name(namespace)?,
            key: name(key)?,
            value,
        };
        self.entries.push(entry).map_err(|_| Error::BufferOverflow)?;
        self.dirty = true;
        Ok(())
    }

    /// Write every entry into `buf`; returns the number of bytes used.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer { buf, pos: 0 };
        w.byte(self.entries.len() as u8)?;
        for entry in &self.entries {
            w.chunk(entry.namespace.as_bytes())?;
            w.chunk(entry.key.as_bytes())?;
            match &entry.value {
                Value::U8(v) => {
                    w.byte(TAG_U8)?;
                    w.byte(*v)?;
                }
                Value::Str(s) => {
                    w.byte(TAG_STR)?;
                    w.chunk(s.as_bytes())?;
                }
            }
        }
        Ok(w.pos)
    }

    /// Rebuild a store from a blob produced by [`Self::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut r = Reader { data, pos: 0 };
        let count = r.byte()?;
        let mut store = Self::new();
        for _ in 0..count {
            let namespace = name(r.str()?)?;
            let key = name(r.str()?)?;
            let value = match r.byte()? {
                TAG_U8 => Value::U8(r.byte()?),
                TAG_STR => Value::Str(ActionString::try_from(r.str()?).map_err(|_| Error::Storage)?),
                _ => return Err(Error::Storage),
            };
            store
                .entries
                .push(Entry {
                    namespace,
                    key,
                    value,
                })
                .map_err(|_| Error::Storage)?;
        }
        Ok(store)
    }
}

fn name(s: &str) -> Result<Name> {
    Name::try_from(s).map_err(|_| Error::BufferOverflow)
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn byte(&mut self, b: u8) -> Result<()> {
        let slot = self.buf.get_mut(self.pos).ok_or(Error::BufferOverflow)?;
        *slot = b;
        self.pos += 1;
        Ok(())
    }

    fn chunk(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u8::try_from(bytes.len()).map_err(|_| Error::BufferOverflow)?;
        self.byte(len)?;
        let end = self.pos + bytes.len();
        self.buf
            .get_mut(self.pos..end)
            .ok_or(Error::BufferOverflow)?
            .copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(Error::Storage)?;
        self.pos += 1;
        Ok(b)
    }

    fn str(&mut self) -> Result<&'a str> {
        let len = usize::from(self.byte()?);
        let end = self.pos + len;
        let bytes = self.data.get(self.pos..end).ok_or(Error::Storage)?;
        self.pos = end;
        core::str::from_utf8(bytes).map_err(|_| Error::Storage)
    }
}

impl SettingsStore for MemoryStore {
    fn get_u8(&self, namespace: &str, key: &str) -> Result<Option<u8>> {
        match self.find(namespace, key).map(|e| &e.value) {
            Some(Value::U8(v)) => Ok(Some(*v)),
            Some(Value::Str(_)) => Err(Error::Storage),
            None => Ok(None),
        }
    }

    fn set_u8(&mut self, namespace: &str, key: &str, value: u8) -> Result<()> {
        self.put(namespace, key, Value::U8(value))
    }

    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<ActionString>> {
        match self.find(namespace, key).map(|e| &e.value) {
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(Value::U8(_)) => Err(Error::Storage),
            None => Ok(None),
        }
    }

    fn set_string(&mut self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let value = ActionString::try_from(value).map_err(|_| Error::BufferOverflow)?;
        self.put(namespace, key, Value::Str(value))
    }
}

/// Settings the core runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSettings {
    pub actions: [ActionString; HALL_BUTTON_COUNT],
    pub meter_style: MeterStyle,
    /// Global LED brightness cap, `1..=255`.
    pub led_brightness: u8,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            actions: DEFAULT_ACTIONS.map(default_action),
            meter_style: MeterStyle::from_u8(DEFAULT_METER_STYLE),
            led_brightness: DEFAULT_LED_BRIGHTNESS,
        }
    }
}

fn default_action(s: &str) -> ActionString {
    let mut out = ActionString::new();
    // Defaults are short literals; a failed push would only truncate.
    let _ = out.push_str(s);
    out
}

impl DeviceSettings {
    /// Read every setting, writing the default for any key that is
    /// missing. Read failures fall back to the default for that key.
    pub fn load<S: SettingsStore>(store: &mut S) -> Self {
        let mut settings = Self::default();

        for (i, key) in ACTION_KEYS.iter().enumerate() {
            if let Some(action) = load_string(store, key, DEFAULT_ACTIONS[i]) {
                settings.actions[i] = action;
            }
        }

        if let Some(style) = load_u8(store, KEY_METER_STYLE, DEFAULT_METER_STYLE) {
            settings.meter_style = MeterStyle::from_u8(style);
        }

        if let Some(brightness) = load_u8(store, KEY_LED_BRIGHTNESS, DEFAULT_LED_BRIGHTNESS) {
            settings.led_brightness = brightness.max(1);
        }

        info!(
            "settings: style {}, brightness {}",
            settings.meter_style.as_u8(),
            settings.led_brightness
        );
        settings
    }

    /// Write everything back to `store`.
    pub fn save<S: SettingsStore>(&self, store: &mut S) -> Result<()> {
        for (key, action) in ACTION_KEYS.iter().zip(self.actions.iter()) {
            store.set_string(SETTINGS_NAMESPACE, key, action)?;
        }
        store.set_u8(SETTINGS_NAMESPACE, KEY_METER_STYLE, self.meter_style.as_u8())?;
        store.set_u8(SETTINGS_NAMESPACE, KEY_LED_BRIGHTNESS, self.led_brightness.max(1))
    }
}

fn load_string<S: SettingsStore>(store: &mut S, key: &str, default: &str) -> Option<ActionString> {
    match store.get_string(SETTINGS_NAMESPACE, key) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            if store.set_string(SETTINGS_NAMESPACE, key, default).is_err() {
                warn!("settings: could not write default action");
            }
            None
        }
        Err(_e) => {
            warn!("settings: action read failed, using default");
            None
        }
    }
}

fn load_u8<S: SettingsStore>(store: &mut S, key: &str, default: u8) -> Option<u8> {
    match store.get_u8(SETTINGS_NAMESPACE, key) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            if store.set_u8(SETTINGS_NAMESPACE, key, default).is_err() {
                warn!("settings: could not write default byte");
            }
            None
        }
        Err(_e) => {
            warn!("settings: byte read failed, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn get_u8(&self, _: &str, _: &str) -> Result<Option<u8>> {
            Err(Error::Storage)
        }
        fn set_u8(&mut self, _: &str, _: &str, _: u8) -> Result<()> {
            Err(Error::Storage)
        }
        fn get_string(&self, _: &str, _: &str) -> Result<Option<ActionString>> {
            Err(Error::Storage)
        }
        fn set_string(&mut self, _: &str, _: &str, _: &str) -> Result<()> {
            Err(Error::Storage)
        }
    }

    #[test]
    fn first_load_writes_defaults() {
        let mut store = MemoryStore::new();
        let settings = DeviceSettings::load(&mut store);

        assert_eq!(settings, DeviceSettings::default());
        assert_eq!(store.len(), 8);
        assert!(store.is_dirty());
        assert_eq!(
            store.get_string(SETTINGS_NAMESPACE, "btn1").unwrap().as_deref(),
            Some("GUI+NUM_MINUS")
        );
        assert_eq!(store.get_u8(SETTINGS_NAMESPACE, KEY_LED_BRIGHTNESS), Ok(Some(20)));
    }

    #[test]
    fn stored_values_win_over_defaults() {
        let mut store = MemoryStore::new();
        store.set_string(SETTINGS_NAMESPACE, "btn5", "TYPE:hello").unwrap();
        store.set_u8(SETTINGS_NAMESPACE, KEY_METER_STYLE, 1).unwrap();

        let settings = DeviceSettings::load(&mut store);
        assert_eq!(settings.actions[5].as_str(), "TYPE:hello");
        assert_eq!(settings.actions[0].as_str(), "CTRL+C");
        assert_eq!(settings.meter_style, MeterStyle::Gradient);
    }

    #[test]
    fn zero_brightness_is_clamped() {
        let mut store = MemoryStore::new();
        store.set_u8(SETTINGS_NAMESPACE, KEY_LED_BRIGHTNESS, 0).unwrap();
        assert_eq!(DeviceSettings::load(&mut store).led_brightness, 1);
    }

    #[test]
    fn broken_store_falls_back_to_defaults() {
        assert_eq!(DeviceSettings::load(&mut BrokenStore), DeviceSettings::default());
    }

    #[test]
    fn second_load_changes_nothing() {
        let mut store = MemoryStore::new();
        DeviceSettings::load(&mut store);
        store.mark_clean();
        DeviceSettings::load(&mut store);
        assert!(!store.is_dirty());
    }

    #[test]
    fn namespaces_are_separate() {
        let mut store = MemoryStore::new();
        store.set_u8("a", "k", 1).unwrap();
        store.set_u8("b", "k", 2).unwrap();
        assert_eq!(store.get_u8("a", "k"), Ok(Some(1)));
        assert_eq!(store.get_u8("b", "k"), Ok(Some(2)));
        assert_eq!(store.get_u8("c", "k"), Ok(None));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut store = MemoryStore::new();
        store.set_u8("ns", "k", 1).unwrap();
        assert_eq!(store.get_string("ns", "k"), Err(Error::Storage));
    }

    #[test]
    fn blob_restores_saved_settings() {
        let mut store = MemoryStore::new();
        let mut settings = DeviceSettings::default();
        settings.led_brightness = 99;
        settings.actions[3] = default_action("TYPE:x+y");
        settings.save(&mut store).unwrap();

        let mut blob = [0u8; 512];
        let n = store.serialize(&mut blob).unwrap();
        let mut restored = MemoryStore::deserialize(&blob[..n]).unwrap();
        assert_eq!(DeviceSettings::load(&mut restored), settings);
    }

    #[test]
    fn blob_rejects_truncation_and_small_buffers() {
        let mut store = MemoryStore::new();
        DeviceSettings::load(&mut store);
        let mut blob = [0u8; 512];
        let n = store.serialize(&mut blob).unwrap();
        assert_eq!(MemoryStore::deserialize(&blob[..n - 1]).err(), Some(Error::Storage));
        assert_eq!(store.serialize(&mut [0u8; 8]), Err(Error::BufferOverflow));
    }

    #[test]
    fn overlong_names_are_rejected() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.set_u8(SETTINGS_NAMESPACE, "a-very-long-key-name", 1),
            Err(Error::BufferOverflow)
        );
    }
}
