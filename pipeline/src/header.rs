use serde::{Deserialize, Serialize};

/// Read access to observation metadata, the single capability this
/// library needs from any header representation.
pub trait HeaderSource {
    /// Returns the value of the named header card, if present.
    fn get_card(&self, key: &str) -> Option<String>;
}

/// Observation header: an ordered list of keyword/value cards with
/// case-insensitive keyword lookup, as FITS headers behave.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct ObsHeader {
    cards: Vec<(String, String)>,
}

impl ObsHeader {
    /// Sets a card, replacing an existing keyword in place. Keywords are
    /// stored uppercased.
    pub fn insert(&mut self, key: &str, value: &str) {
        let key = key.trim().to_uppercase();
        match self.cards.iter().position(|(k, _)| *k == key) {
            Some(index) => self.cards[index].1 = value.to_string(),
            None => self.cards.push((key, value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim();
        self.cards
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, String)> {
        self.cards.iter()
    }
    pub fn len(&self) -> usize {
        self.cards.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl HeaderSource for ObsHeader {
    fn get_card(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

/// Exact-key lookup for plain maps, so any string mapping can stand in
/// for a header.
impl HeaderSource for hashbrown::HashMap<String, String> {
    fn get_card(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<It, K, V> From<It> for ObsHeader
where
    It: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from(iter: It) -> Self {
        let mut header = ObsHeader::default();
        for (key, value) in iter {
            header.insert(key.as_ref(), value.as_ref());
        }
        header
    }
}
