use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use atomic_counter::{AtomicCounter, RelaxedCounter};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// A texture known to the backend. The backend uploads it lazily from `path`.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    handle: TextureHandle,
    path: String,
}

impl Texture {
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('/', "\\").to_lowercase()
}

/// Hands out shared textures: a path requested twice while still in use yields the same texture.
pub struct TextureManager {
    by_path: HashMap<String, Weak<Texture>>,
    by_handle: HashMap<TextureHandle, Weak<Texture>>,
    next_handle: RelaxedCounter,
}

impl TextureManager {
    pub fn new() -> Self {
        Self {
            by_path: HashMap::new(),
            by_handle: HashMap::new(),
            next_handle: RelaxedCounter::new(1),
        }
    }

    pub fn new_texture(&mut self, path: &str) -> Arc<Texture> {
        let key = normalize_path(path);

        if let Some(texture) = self.by_path.get(&key).and_then(Weak::upgrade) {
            return texture;
        }

        let texture = Arc::new(Texture {
            handle: TextureHandle(self.next_handle.inc() as u32),
            path: path.to_owned(),
        });
        trace!("New texture {} ({})", path, texture.handle.raw());

        self.by_path.insert(key, Arc::downgrade(&texture));
        self.by_handle
            .insert(texture.handle, Arc::downgrade(&texture));
        texture
    }

    pub fn item(&self, handle: TextureHandle) -> Option<Arc<Texture>> {
        self.by_handle.get(&handle).and_then(Weak::upgrade)
    }

    /// Forgets the textures nobody holds anymore.
    pub fn purge(&mut self) {
        self.by_path.retain(|_, texture| texture.strong_count() > 0);
        self.by_handle.retain(|_, texture| texture.strong_count() > 0);
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_same_texture() {
        let mut textures = TextureManager::new();

        let first = textures.new_texture("Interface\\Buttons\\WHITE8X8.blp");
        let second = textures.new_texture("interface/buttons/white8x8.blp");
        let other = textures.new_texture("Interface\\Buttons\\Other.blp");

        assert!(Arc::ptr_eq(&first, &second));
        assert_ne!(first.handle(), other.handle());
        assert_eq!(first.path(), "Interface\\Buttons\\WHITE8X8.blp");
    }

    #[test]
    fn test_item_and_purge() {
        let mut textures = TextureManager::new();

        let texture = textures.new_texture("a.blp");
        let handle = texture.handle();
        assert!(textures.item(handle).is_some());

        drop(texture);
        assert!(textures.item(handle).is_none());

        textures.purge();
        assert!(textures.is_empty());

        let reloaded = textures.new_texture("a.blp");
        assert_ne!(reloaded.handle(), handle);
    }
}
