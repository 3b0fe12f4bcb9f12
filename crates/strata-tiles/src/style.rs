use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Side length of floor and wall textures.
pub const TEX_SIZE: usize = 512;
pub const BORDER_TEX_W: usize = 128;
pub const BORDER_TEX_H: usize = 32;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Style {
    pub floor: Arc<[Rgba8]>,
    pub wall: Option<Arc<[Rgba8]>>,
    pub trim: Option<Arc<[Rgba8]>>,
    pub floor_dirty: bool,
    pub wall_dirty: bool,
    pub trim_dirty: bool,
    pub floor_index: u32,
    pub wall_index: u32,
    pub trim_index: u32,
}

/// What the mesher needs to know about a style. `wall` and `trim` are set
/// only when the style carries that texture.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StyleIndices {
    pub floor: u32,
    pub wall: Option<u32>,
    pub trim: Option<u32>,
}

/// Immutable snapshot of style indices handed to mesh jobs.
#[derive(Clone, Debug, Default)]
pub struct StyleTable {
    by_id: HashMap<u32, StyleIndices>,
}

impl StyleTable {
    /// Unknown styles mesh with default indices and no wall or trim.
    #[inline]
    pub fn get(&self, style: u32) -> StyleIndices {
        self.by_id.get(&style).copied().unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// CPU-side layered texture standing in for a GPU texture array.
#[derive(Clone, Debug, Default)]
pub struct TextureArray {
    pub width: usize,
    pub height: usize,
    pub layers: Vec<Vec<Rgba8>>,
}

impl TextureArray {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            width,
            height,
            layers: vec![vec![Rgba8::default(); width * height]; depth],
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn set_layer(&mut self, layer: usize, pixels: &[Rgba8]) {
        if let Some(dst) = self.layers.get_mut(layer) {
            dst.copy_from_slice(pixels);
        }
    }
}

/// Registered styles keyed by id, plus the texture arrays built from them.
#[derive(Debug, Default)]
pub struct StyleCatalog {
    styles: BTreeMap<u32, Style>,
    tex_array: Option<TextureArray>,
    border_array: Option<TextureArray>,
    arrays_dirty: bool,
}

fn check_texture(pixels: &[Rgba8]) {
    assert_eq!(
        pixels.len(),
        TEX_SIZE * TEX_SIZE,
        "texture has {} pixels, needs {TEX_SIZE}x{TEX_SIZE}",
        pixels.len()
    );
}

fn check_border_texture(pixels: &[Rgba8]) {
    assert_eq!(
        pixels.len(),
        BORDER_TEX_W * BORDER_TEX_H,
        "border texture has {} pixels, needs {BORDER_TEX_W}x{BORDER_TEX_H}",
        pixels.len()
    );
}

impl StyleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, style: u32) -> Option<&Style> {
        self.styles.get(&style)
    }

    #[inline]
    pub fn arrays_dirty(&self) -> bool {
        self.arrays_dirty
    }

    pub fn tex_array(&self) -> Option<&TextureArray> {
        self.tex_array.as_ref()
    }

    pub fn border_array(&self) -> Option<&TextureArray> {
        self.border_array.as_ref()
    }

    /// Registers or replaces a style's textures. Returns `true` when the
    /// style gained or lost its wall or trim texture, which changes how
    /// every tile of that style is meshed.
    pub fn set_style_textures(
        &mut self,
        style: u32,
        floor: Arc<[Rgba8]>,
        wall: Option<Arc<[Rgba8]>>,
        trim: Option<Arc<[Rgba8]>>,
    ) -> bool {
        check_texture(&floor);
        if let Some(w) = &wall {
            check_texture(w);
        }
        if let Some(t) = &trim {
            check_border_texture(t);
        }
        self.arrays_dirty = true;
        match self.styles.get_mut(&style) {
            None => {
                self.styles.insert(
                    style,
                    Style {
                        floor,
                        floor_dirty: true,
                        wall_dirty: wall.is_some(),
                        trim_dirty: trim.is_some(),
                        wall,
                        trim,
                        ..Style::default()
                    },
                );
                false
            }
            Some(s) => {
                let rebuild =
                    s.wall.is_some() != wall.is_some() || s.trim.is_some() != trim.is_some();
                if !Arc::ptr_eq(&s.floor, &floor) {
                    s.floor = floor;
                    s.floor_dirty = true;
                }
                if !same_pixels(&s.wall, &wall) {
                    s.wall = wall;
                    s.wall_dirty = true;
                }
                if !same_pixels(&s.trim, &trim) {
                    s.trim = trim;
                    s.trim_dirty = true;
                }
                rebuild
            }
        }
    }

    /// Assigns array slices in id order and uploads every style's pixels.
    /// Arrays are reallocated when their depth changes or `force` is set.
    pub fn create_texture_arrays(&mut self, force: bool) {
        let mut num_main = 0u32;
        let mut num_border = 0u32;
        for s in self.styles.values_mut() {
            s.floor_index = num_main;
            num_main += 1;
            if s.wall.is_some() {
                s.wall_index = num_main;
                num_main += 1;
            }
            if s.trim.is_some() {
                s.trim_index = num_border;
                num_border += 1;
            }
        }

        let main_depth = (num_main as usize).max(1);
        if force || self.tex_array.as_ref().map(|a| a.depth()) != Some(main_depth) {
            self.tex_array = Some(TextureArray::new(TEX_SIZE, TEX_SIZE, main_depth));
        }
        let border_depth = (num_border as usize).max(1);
        if self.border_array.as_ref().map(|a| a.depth()) != Some(border_depth) {
            self.border_array = Some(TextureArray::new(BORDER_TEX_W, BORDER_TEX_H, border_depth));
        }

        let (Some(tex), Some(border)) = (self.tex_array.as_mut(), self.border_array.as_mut())
        else {
            return;
        };
        for s in self.styles.values_mut() {
            tex.set_layer(s.floor_index as usize, &s.floor);
            s.floor_dirty = false;
            if let Some(w) = &s.wall {
                tex.set_layer(s.wall_index as usize, w);
                s.wall_dirty = false;
            }
            if let Some(t) = &s.trim {
                border.set_layer(s.trim_index as usize, t);
                s.trim_dirty = false;
            }
        }
        log::debug!(
            "texture arrays: {} main layers, {} border layers",
            main_depth,
            border_depth
        );
        self.arrays_dirty = false;
    }

    pub fn table(&self) -> StyleTable {
        let by_id = self
            .styles
            .iter()
            .map(|(&id, s)| {
                (
                    id,
                    StyleIndices {
                        floor: s.floor_index,
                        wall: s.wall.as_ref().map(|_| s.wall_index),
                        trim: s.trim.as_ref().map(|_| s.trim_index),
                    },
                )
            })
            .collect();
        StyleTable { by_id }
    }
}

fn same_pixels(a: &Option<Arc<[Rgba8]>>, b: &Option<Arc<[Rgba8]>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(len: usize, c: Rgba8) -> Arc<[Rgba8]> {
        vec![c; len].into()
    }

    fn floor(c: u8) -> Arc<[Rgba8]> {
        solid(TEX_SIZE * TEX_SIZE, Rgba8::opaque(c, c, c))
    }

    #[test]
    fn adding_wall_requests_rebuild() {
        let mut cat = StyleCatalog::new();
        assert!(!cat.set_style_textures(1, floor(10), None, None));
        assert!(cat.arrays_dirty());
        assert!(!cat.set_style_textures(1, floor(20), None, None));
        assert!(cat.set_style_textures(1, floor(20), Some(floor(30)), None));
        let trim = solid(BORDER_TEX_W * BORDER_TEX_H, Rgba8::opaque(1, 2, 3));
        assert!(cat.set_style_textures(1, floor(20), Some(floor(30)), Some(trim)));
    }

    #[test]
    fn slices_follow_style_order() {
        let mut cat = StyleCatalog::new();
        let trim = solid(BORDER_TEX_W * BORDER_TEX_H, Rgba8::opaque(9, 9, 9));
        cat.set_style_textures(7, floor(70), None, Some(trim));
        cat.set_style_textures(2, floor(20), Some(floor(21)), None);
        cat.create_texture_arrays(false);
        assert!(!cat.arrays_dirty());
        let t = cat.table();
        assert_eq!(t.get(2), StyleIndices { floor: 0, wall: Some(1), trim: None });
        assert_eq!(t.get(7), StyleIndices { floor: 2, wall: None, trim: Some(0) });
        assert_eq!(t.get(99), StyleIndices::default());
        let arr = cat.tex_array().unwrap();
        assert_eq!(arr.depth(), 3);
        assert_eq!(arr.layers[1][0], Rgba8::opaque(21, 21, 21));
        assert_eq!(cat.border_array().unwrap().layers[0][5], Rgba8::opaque(9, 9, 9));
    }

    #[test]
    #[should_panic]
    fn wrong_texture_size_panics() {
        let mut cat = StyleCatalog::new();
        cat.set_style_textures(0, solid(16, Rgba8::default()), None, None);
    }
}
