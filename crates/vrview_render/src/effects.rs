//! Post-processing effect pipeline
//!
//! An [`EffectPipeline`] is an ordered chain of [`EffectPass`]es run against
//! the raster surface each frame. Shaders are opaque: a pass names a
//! [`ShaderKind`] and carries its uniform values, and the surface decides how
//! to apply it.

use std::collections::BTreeMap;

use vrview_core::{PerspectiveCamera, SceneGraph};

use crate::error::RenderError;
use crate::surface::RasterSurface;

/// Vignette darkening offset used by the default chain
pub const VIGNETTE_OFFSET: f32 = 0.33;
/// Vignette darkness used by the default chain
pub const VIGNETTE_DARKNESS: f32 = 3.0;

/// A shader uniform value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Color([f32; 3]),
    Bool(bool),
}

/// Catalogue of full-screen shaders a pass can run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vignette,
    Film,
    DotScreen,
    RgbShift,
    Sepia,
    BleachBypass,
    Luminosity,
    Sobel,
    Copy,
    HorizontalBlur,
    VerticalBlur,
    Colorify,
}

impl ShaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShaderKind::Vignette => "vignette",
            ShaderKind::Film => "film",
            ShaderKind::DotScreen => "dot_screen",
            ShaderKind::RgbShift => "rgb_shift",
            ShaderKind::Sepia => "sepia",
            ShaderKind::BleachBypass => "bleach_bypass",
            ShaderKind::Luminosity => "luminosity",
            ShaderKind::Sobel => "sobel",
            ShaderKind::Copy => "copy",
            ShaderKind::HorizontalBlur => "horizontal_blur",
            ShaderKind::VerticalBlur => "vertical_blur",
            ShaderKind::Colorify => "colorify",
        }
    }

    /// Default uniform values for this shader
    pub fn default_uniforms(&self) -> Vec<(&'static str, UniformValue)> {
        use UniformValue::*;
        match self {
            ShaderKind::Vignette => vec![
                ("offset", Float(1.0)),
                ("darkness", Float(1.0)),
            ],
            ShaderKind::Film => vec![
                ("time", Float(0.0)),
                ("noise_intensity", Float(0.5)),
                ("scanline_intensity", Float(0.05)),
                ("scanline_count", Float(4096.0)),
                ("grayscale", Bool(false)),
            ],
            ShaderKind::DotScreen => vec![
                ("center", Vec2([0.5, 0.5])),
                ("angle", Float(1.57)),
                ("scale", Float(1.0)),
            ],
            ShaderKind::RgbShift => vec![
                ("amount", Float(0.005)),
                ("angle", Float(0.0)),
            ],
            ShaderKind::Sepia => vec![("amount", Float(1.0))],
            ShaderKind::BleachBypass => vec![("opacity", Float(1.0))],
            ShaderKind::Luminosity => Vec::new(),
            ShaderKind::Sobel => vec![("resolution", Vec2([0.0, 0.0]))],
            ShaderKind::Copy => vec![("opacity", Float(1.0))],
            ShaderKind::HorizontalBlur => vec![("h", Float(1.0 / 512.0))],
            ShaderKind::VerticalBlur => vec![("v", Float(1.0 / 512.0))],
            ShaderKind::Colorify => vec![("color", Color([1.0, 1.0, 1.0]))],
        }
    }
}

/// What a pass does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    /// Render the scene into the chain
    Scene,
    /// Apply a full-screen shader to the previous result
    Shader(ShaderKind),
}

/// One step of an [`EffectPipeline`]
#[derive(Clone, Debug, PartialEq)]
pub struct EffectPass {
    kind: PassKind,
    uniforms: BTreeMap<String, UniformValue>,
    /// Whether this pass takes part in the chain
    pub enabled: bool,
    /// Whether this pass writes to the visible surface
    pub render_to_screen: bool,
    size: (u32, u32),
}

impl EffectPass {
    /// A pass that renders the scene
    pub fn scene() -> Self {
        Self {
            kind: PassKind::Scene,
            uniforms: BTreeMap::new(),
            enabled: true,
            render_to_screen: false,
            size: (0, 0),
        }
    }

    /// A shader pass with the shader's default uniforms
    pub fn shader(kind: ShaderKind) -> Self {
        let uniforms = kind
            .default_uniforms()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self {
            kind: PassKind::Shader(kind),
            uniforms,
            enabled: true,
            render_to_screen: false,
            size: (0, 0),
        }
    }

    /// Builder: set a uniform
    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.set_uniform(name, value);
        self
    }

    /// Builder: mark as the on-screen pass
    pub fn to_screen(mut self) -> Self {
        self.render_to_screen = true;
        self
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn set_uniform(&mut self, name: impl Into<String>, value: UniformValue) {
        self.uniforms.insert(name.into(), value);
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Size of the pass's render target
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

/// Ordered chain of effect passes
#[derive(Clone, Debug)]
pub struct EffectPipeline {
    passes: Vec<EffectPass>,
    size: (u32, u32),
}

impl EffectPipeline {
    /// Create an empty pipeline sized to the current surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            passes: Vec::new(),
            size: (width, height),
        }
    }

    /// Scene render followed by a vignette written to the screen
    pub fn with_default_chain(width: u32, height: u32) -> Self {
        let mut pipeline = Self::new(width, height);
        pipeline.add_pass(EffectPass::scene());
        pipeline.add_pass(
            EffectPass::shader(ShaderKind::Vignette)
                .with_uniform("offset", UniformValue::Float(VIGNETTE_OFFSET))
                .with_uniform("darkness", UniformValue::Float(VIGNETTE_DARKNESS))
                .to_screen(),
        );
        pipeline
    }

    /// Append a pass, sized to the pipeline
    pub fn add_pass(&mut self, mut pass: EffectPass) {
        pass.set_size(self.size.0, self.size.1);
        self.passes.push(pass);
    }

    /// Resize the pipeline and every pass
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        for pass in &mut self.passes {
            pass.set_size(width, height);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn passes(&self) -> &[EffectPass] {
        &self.passes
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut EffectPass> {
        self.passes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run the enabled passes in order against the raster surface
    ///
    /// A chain without a scene pass still renders the scene first.
    pub fn render(
        &mut self,
        surface: &mut dyn RasterSurface,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        let has_scene_pass = self
            .passes
            .iter()
            .any(|p| p.enabled && p.kind == PassKind::Scene);
        if !has_scene_pass {
            surface.render(scene, camera)?;
        }

        for pass in self.passes.iter().filter(|p| p.enabled) {
            match pass.kind {
                PassKind::Scene => surface.render(scene, camera)?,
                PassKind::Shader(_) => surface.apply_pass(pass)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain() {
        let pipeline = EffectPipeline::with_default_chain(800, 600);
        assert_eq!(pipeline.len(), 2);

        let passes = pipeline.passes();
        assert_eq!(passes[0].kind(), PassKind::Scene);
        assert!(!passes[0].render_to_screen);

        assert_eq!(passes[1].kind(), PassKind::Shader(ShaderKind::Vignette));
        assert!(passes[1].render_to_screen);
        assert_eq!(passes[1].uniform("offset"), Some(UniformValue::Float(0.33)));
        assert_eq!(passes[1].uniform("darkness"), Some(UniformValue::Float(3.0)));
    }

    #[test]
    fn test_passes_sized_on_add_and_resize() {
        let mut pipeline = EffectPipeline::new(320, 240);
        pipeline.add_pass(EffectPass::scene());
        assert_eq!(pipeline.passes()[0].size(), (320, 240));

        pipeline.set_size(1024, 768);
        pipeline.add_pass(EffectPass::shader(ShaderKind::Copy));
        assert_eq!(pipeline.size(), (1024, 768));
        for pass in pipeline.passes() {
            assert_eq!(pass.size(), (1024, 768));
        }
    }

    #[test]
    fn test_shader_defaults() {
        let film = EffectPass::shader(ShaderKind::Film);
        assert_eq!(film.uniform("grayscale"), Some(UniformValue::Bool(false)));
        assert!(EffectPass::shader(ShaderKind::Luminosity).uniforms().next().is_none());
        assert_eq!(ShaderKind::RgbShift.as_str(), "rgb_shift");
    }

    #[test]
    fn test_uniform_override() {
        let mut pipeline = EffectPipeline::with_default_chain(1, 1);
        if let Some(pass) = pipeline.pass_mut(1) {
            pass.set_uniform("darkness", UniformValue::Float(1.5));
        }
        assert_eq!(pipeline.passes()[1].uniform("darkness"), Some(UniformValue::Float(1.5)));
    }
}
