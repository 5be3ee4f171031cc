use std::path::PathBuf;

use glam::Vec3;

/// Surface properties shared by every face that references them.
///
/// Faces and meshes refer to materials by index, so a `Material` is a plain
/// value record.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Specular exponent.
    pub shininess: f32,
    /// Diffuse texture image, resolved by the renderer.
    pub diffuse_texture: Option<PathBuf>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.3),
            specular: Vec3::splat(0.1),
            shininess: 10.0,
            diffuse_texture: None,
        }
    }
}

impl Material {
    /// Creates a material with default colors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn ambient(mut self, ambient: impl Into<Vec3>) -> Self {
        self.ambient = ambient.into();
        self
    }

    pub fn diffuse(mut self, diffuse: impl Into<Vec3>) -> Self {
        self.diffuse = diffuse.into();
        self
    }

    pub fn specular(mut self, specular: impl Into<Vec3>) -> Self {
        self.specular = specular.into();
        self
    }

    pub fn shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn diffuse_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.diffuse_texture = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_function_material() {
        let m = Material::new("stone");
        assert_eq!(m.name, "stone");
        assert_eq!(m.ambient, Vec3::splat(0.1));
        assert_eq!(m.diffuse, Vec3::splat(0.3));
        assert_eq!(m.specular, Vec3::splat(0.1));
        assert_eq!(m.shininess, 10.0);
        assert!(m.diffuse_texture.is_none());
    }

    #[test]
    fn builder_overrides() {
        let m = Material::new("water")
            .diffuse([0.2, 0.3, 0.5])
            .specular(Vec3::new(0.3, 0.6, 0.8))
            .shininess(70.0)
            .diffuse_texture("textures/water.png");

        assert_eq!(m.diffuse, Vec3::new(0.2, 0.3, 0.5));
        assert_eq!(m.shininess, 70.0);
        assert_eq!(m.diffuse_texture, Some(PathBuf::from("textures/water.png")));
    }
}
