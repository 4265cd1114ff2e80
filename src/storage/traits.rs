use crate::error::{StorageError, StorageResult};

pub trait Storage {
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()>;

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    fn exists(&self, key: &[u8]) -> StorageResult<bool>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait StorageExt: Storage {
    fn put_if_not_exists(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()>;

    fn get_or_error(&self, key: &[u8]) -> StorageResult<Vec<u8>>;

    fn update(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()>;

    fn get_many(&self, keys: &[&[u8]]) -> StorageResult<Vec<Option<Vec<u8>>>>;

    fn delete_and_get_old(&mut self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;
}

impl<T: Storage> StorageExt for T {
    fn put_if_not_exists(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()> {
        if self.exists(key)? {
            return Err(StorageError::already_exists(hex_preview(key)));
        }
        self.put(key, value)
    }

    fn get_or_error(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        self.get(key)?
            .ok_or_else(|| StorageError::not_found(hex_preview(key)))
    }

    fn update(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()> {
        if !self.exists(key)? {
            return Err(StorageError::not_found(hex_preview(key)));
        }
        self.put(key, value)
    }

    fn get_many(&self, keys: &[&[u8]]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn delete_and_get_old(&mut self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let value = self.get(key)?;
        self.delete(key)?;
        Ok(value)
    }
}

/// Storage-layer errors carry a human-readable key for diagnostics; since
/// keys here are opaque encoded bytes rather than display strings, render a
/// short hex preview instead of attempting (and failing) a UTF-8 decode.
fn hex_preview(key: &[u8]) -> String {
    let mut s = String::with_capacity(key.len() * 2);
    for b in key.iter().take(16) {
        s.push_str(&format!("{:02x}", b));
    }
    if key.len() > 16 {
        s.push_str("..");
    }
    s
}
