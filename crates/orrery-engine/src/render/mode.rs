//! Render modes: the closed set of vertex layouts the batcher understands,
//! each paired with the shader that draws it.

use std::borrow::Cow;
use std::collections::HashMap;

use super::buffers::Topology;

/// Vertex attribute layout of a render mode.
///
/// Two modes with the same layout can share a physical batch; a layout change
/// forces a flush.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexLayout {
    /// position (xyz) + color (rgba)
    Colored,
    /// position + color + one UV set
    Textured,
    /// position + color + two UV sets
    MultiTextured,
}

impl VertexLayout {
    /// Number of UV sets uploaded for this layout.
    #[inline]
    pub const fn uv_sets(self) -> usize {
        match self {
            VertexLayout::Colored => 0,
            VertexLayout::Textured => 1,
            VertexLayout::MultiTextured => 2,
        }
    }

    /// Index streams drawn by a flush, in draw order.
    #[inline]
    pub const fn topologies(self) -> &'static [Topology] {
        match self {
            VertexLayout::Colored => &[Topology::Lines, Topology::Points, Topology::Triangles],
            VertexLayout::Textured | VertexLayout::MultiTextured => &[Topology::Triangles],
        }
    }
}

/// Shader program used by a render mode.
///
/// Custom WGSL must expose `vs_main`/`fs_main`, read the transform from
/// `@group(0) @binding(0)` and, for textured layouts, the texture/sampler
/// pairs from `@group(1)` (see the built-in shaders).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// The engine's shader for the mode's layout.
    Builtin,
    Wgsl(Cow<'static, str>),
}

/// A vertex-layout/shader configuration.
///
/// Dispatch on the layout is a `match`; the set of layouts is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Colored(ShaderSource),
    Textured(ShaderSource),
    MultiTextured(ShaderSource),
}

impl RenderMode {
    pub const fn colored() -> Self {
        RenderMode::Colored(ShaderSource::Builtin)
    }

    pub const fn textured() -> Self {
        RenderMode::Textured(ShaderSource::Builtin)
    }

    pub const fn multi_textured() -> Self {
        RenderMode::MultiTextured(ShaderSource::Builtin)
    }

    #[inline]
    pub fn layout(&self) -> VertexLayout {
        match self {
            RenderMode::Colored(_) => VertexLayout::Colored,
            RenderMode::Textured(_) => VertexLayout::Textured,
            RenderMode::MultiTextured(_) => VertexLayout::MultiTextured,
        }
    }

    #[inline]
    pub fn shader(&self) -> &ShaderSource {
        match self {
            RenderMode::Colored(s) | RenderMode::Textured(s) | RenderMode::MultiTextured(s) => s,
        }
    }
}

/// Handle to a registered render mode. Only valid for the registry that issued it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RenderModeId(pub(crate) usize);

impl RenderModeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Name → render mode registry.
#[derive(Debug, Default)]
pub struct RenderModes {
    modes: Vec<(String, RenderMode)>,
    by_name: HashMap<String, RenderModeId>,
}

impl RenderModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `mode` under `name`. Re-registering a name replaces the mode
    /// but keeps its id, so handles held by callers stay valid.
    pub fn register(&mut self, name: impl Into<String>, mode: RenderMode) -> RenderModeId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            log::debug!("render mode \"{name}\" re-registered");
            self.modes[id.0].1 = mode;
            return id;
        }

        let id = RenderModeId(self.modes.len());
        self.by_name.insert(name.clone(), id);
        self.modes.push((name, mode));
        id
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<RenderModeId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn get(&self, id: RenderModeId) -> Option<&RenderMode> {
        self.modes.get(id.0).map(|(_, m)| m)
    }

    #[inline]
    pub fn name(&self, id: RenderModeId) -> Option<&str> {
        self.modes.get(id.0).map(|(n, _)| n.as_str())
    }

    /// First registered mode, if any.
    #[inline]
    pub fn first(&self) -> Option<RenderModeId> {
        (!self.modes.is_empty()).then_some(RenderModeId(0))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_report_uv_sets_and_topologies() {
        assert_eq!(VertexLayout::Colored.uv_sets(), 0);
        assert_eq!(VertexLayout::MultiTextured.uv_sets(), 2);
        assert_eq!(VertexLayout::Colored.topologies().len(), 3);
        assert_eq!(VertexLayout::Textured.topologies(), &[Topology::Triangles]);
    }

    #[test]
    fn register_and_lookup() {
        let mut modes = RenderModes::new();
        let world = modes.register("world", RenderMode::colored());
        let font = modes.register("font", RenderMode::textured());

        assert_ne!(world, font);
        assert_eq!(modes.lookup("world"), Some(world));
        assert_eq!(modes.lookup("font"), Some(font));
        assert_eq!(modes.lookup("missing"), None);
        assert_eq!(modes.get(font).map(RenderMode::layout), Some(VertexLayout::Textured));
        assert_eq!(modes.first(), Some(world));
    }

    #[test]
    fn re_register_keeps_id() {
        let mut modes = RenderModes::new();
        let a = modes.register("a", RenderMode::colored());
        let b = modes.register("a", RenderMode::multi_textured());
        assert_eq!(a, b);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes.get(a).map(RenderMode::layout), Some(VertexLayout::MultiTextured));
    }

    #[test]
    fn foreign_id_is_rejected() {
        let modes = RenderModes::new();
        assert!(modes.get(RenderModeId(3)).is_none());
        assert!(modes.first().is_none());
    }
}
