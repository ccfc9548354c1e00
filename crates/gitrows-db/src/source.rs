//! Store traits and the value sources handed out by lookups

use gitrows_core::{Filter, Row};

use crate::envelope::Envelope;
use crate::error::StoreError;

/// Pull-based stream of raw index values
///
/// `Ok(None)` marks the end of the stream and keeps being returned once
/// reached. `close` releases the underlying resources and may be called any
/// number of times.
pub trait ValueSource {
    fn next_value(&mut self) -> Result<Option<Vec<u8>>, StoreError>;

    fn close(&mut self) -> Result<(), StoreError>;
}

/// Persistence side of the commit-files index
pub trait IndexStore: Send + Sync {
    /// Envelope every stored value is wrapped in
    fn envelope(&self) -> Envelope;

    /// Stores the value for the association described by `row`.
    ///
    /// Returns `false` without writing when the (repository, commit, path)
    /// association is already present.
    fn put(&self, row: &Row, value: &[u8]) -> Result<bool, StoreError>;

    /// Streams every stored value, or only those whose association matches `filter`
    fn get(&self, filter: Option<&Filter>) -> Result<Box<dyn ValueSource + Send>, StoreError>;

    fn flush(&self) -> Result<(), StoreError>;
}

/// Full scan over the `locations` tree in association key order
pub(crate) struct ScanSource {
    iter: Option<sled::Iter>,
}

impl ScanSource {
    pub(crate) fn new(iter: sled::Iter) -> Self {
        Self { iter: Some(iter) }
    }
}

impl ValueSource for ScanSource {
    fn next_value(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(iter) = self.iter.as_mut() else {
            return Ok(None);
        };
        match iter.next() {
            Some(Ok((_, value))) => Ok(Some(value.to_vec())),
            Some(Err(e)) => {
                self.iter = None;
                Err(e.into())
            }
            None => {
                self.iter = None;
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.iter = None;
        Ok(())
    }
}

/// Values for a resolved set of association keys
pub(crate) struct KeyedSource {
    keys: std::vec::IntoIter<Vec<u8>>,
    locations: Option<sled::Tree>,
}

impl KeyedSource {
    pub(crate) fn new(keys: Vec<Vec<u8>>, locations: sled::Tree) -> Self {
        Self {
            keys: keys.into_iter(),
            locations: Some(locations),
        }
    }
}

impl ValueSource for KeyedSource {
    fn next_value(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(locations) = self.locations.as_ref() else {
            return Ok(None);
        };
        for key in self.keys.by_ref() {
            match locations.get(&key) {
                Ok(Some(value)) => return Ok(Some(value.to_vec())),
                Ok(None) => {
                    log::warn!("Column index points at missing association, skipping");
                }
                Err(e) => {
                    self.locations = None;
                    return Err(e.into());
                }
            }
        }
        self.locations = None;
        Ok(None)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.locations = None;
        self.keys = Vec::new().into_iter();
        Ok(())
    }
}
