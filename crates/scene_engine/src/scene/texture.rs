//! Device textures
//!
//! A [`Texture`] owns one device texture object. Pixel data is uploaded once at
//! construction; the texture is then bound by the draw lists of the geometry
//! that uses it. Decoding image files belongs to the model-loading side, which
//! hands over raw pixel bytes.

use crate::render::device::{
    FilterMode, GraphicsDevice, PixelFormat, TextureHandle, TextureImage, TextureParam, TextureTarget, WrapMode,
};
use crate::render::{RenderError, RenderResult};

/// Parameters applied when none are given
pub const DEFAULT_PARAMS: [TextureParam; 4] = [
    TextureParam::MinFilter(FilterMode::Linear),
    TextureParam::MagFilter(FilterMode::Linear),
    TextureParam::WrapS(WrapMode::Repeat),
    TextureParam::WrapT(WrapMode::Repeat),
];

/// Texture object living on the device
#[derive(Debug, PartialEq)]
pub struct Texture {
    handle: Option<TextureHandle>,
    target: TextureTarget,
    image: TextureImage,
    params: Vec<TextureParam>,
}

impl Texture {
    /// Create a texture and upload `data`
    ///
    /// `data` must hold exactly `width * height * depth * channels` bytes.
    /// With an empty `params` slice [`DEFAULT_PARAMS`] are applied.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        target: TextureTarget,
        image: TextureImage,
        params: &[TextureParam],
        data: &[u8],
    ) -> RenderResult<Self> {
        validate(target, &image, data)?;

        let params = if params.is_empty() { DEFAULT_PARAMS.to_vec() } else { params.to_vec() };

        let handle = device.gen_texture()?;
        let uploaded = upload(device, target, handle, &image, &params, data);
        if let Err(e) = uploaded {
            if let Err(cleanup) = device.delete_texture(handle) {
                log::warn!("Failed to release texture after upload error: {}", cleanup);
            }
            return Err(e);
        }

        log::debug!(
            "Created {:?} texture {:?} ({}x{}x{}, {:?})",
            target,
            handle,
            image.width,
            image.height,
            image.depth,
            image.format
        );
        Ok(Self { handle: Some(handle), target, image, params })
    }

    /// Create a 2D texture
    pub fn new_2d(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        format: PixelFormat,
        mipmap: bool,
        data: &[u8],
    ) -> RenderResult<Self> {
        let image = TextureImage { width, height, depth: 1, format, mipmap };
        Self::new(device, TextureTarget::Texture2D, image, &[], data)
    }

    /// Create a 3D texture
    pub fn new_3d(
        device: &mut dyn GraphicsDevice,
        size: (u32, u32, u32),
        format: PixelFormat,
        mipmap: bool,
        data: &[u8],
    ) -> RenderResult<Self> {
        let (width, height, depth) = size;
        let image = TextureImage { width, height, depth, format, mipmap };
        let mut params = DEFAULT_PARAMS.to_vec();
        params.push(TextureParam::WrapR(WrapMode::Repeat));
        Self::new(device, TextureTarget::Texture3D, image, &params, data)
    }

    /// Device handle, `None` once finalized
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    /// Device handle, or `MissingResource` once finalized
    pub fn require_handle(&self) -> RenderResult<TextureHandle> {
        self.handle
            .ok_or_else(|| RenderError::MissingResource(format!("{:?} texture has been finalized", self.target)))
    }

    /// Binding point
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Parameters applied at creation
    pub fn params(&self) -> &[TextureParam] {
        &self.params
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.image.format
    }

    /// Bytes per texel
    pub fn channels(&self) -> usize {
        self.image.format.channels()
    }

    /// Whether a mip chain was requested
    pub fn is_mipmap(&self) -> bool {
        self.image.mipmap
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.image.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Depth in texels (1 for 2D)
    pub fn depth(&self) -> u32 {
        self.image.depth
    }

    /// `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    /// Width equals height
    pub fn is_square(&self) -> bool {
        self.image.width == self.image.height
    }

    /// Square with an even edge length
    pub fn is_standard(&self) -> bool {
        self.is_square() && self.image.width % 2 == 0
    }

    /// Bind the texture to its target
    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        device.bind_texture(self.target, self.require_handle()?)
    }

    /// Release the device texture; later binds fail with `MissingResource`
    pub fn finalize(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        if let Some(handle) = self.handle.take() {
            device.delete_texture(handle)?;
            log::debug!("Finalized texture {:?}", handle);
        }
        Ok(())
    }
}

fn validate(target: TextureTarget, image: &TextureImage, data: &[u8]) -> RenderResult<()> {
    if image.width == 0 || image.height == 0 || image.depth == 0 {
        return Err(RenderError::InvalidConfiguration(format!(
            "texture dimensions must be non-zero, got {}x{}x{}",
            image.width, image.height, image.depth
        )));
    }
    if target == TextureTarget::Texture2D && image.depth != 1 {
        return Err(RenderError::InvalidConfiguration(format!(
            "2D texture must have depth 1, got {}",
            image.depth
        )));
    }
    if data.len() != image.byte_len() {
        return Err(RenderError::InvalidConfiguration(format!(
            "expected {} bytes of pixel data, got {}",
            image.byte_len(),
            data.len()
        )));
    }
    Ok(())
}

fn upload(
    device: &mut dyn GraphicsDevice,
    target: TextureTarget,
    handle: TextureHandle,
    image: &TextureImage,
    params: &[TextureParam],
    data: &[u8],
) -> RenderResult<()> {
    device.bind_texture(target, handle)?;
    for param in params {
        device.tex_parameter(target, *param)?;
    }
    device.tex_image(target, image, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::DeviceCall;
    use crate::render::RecordingDevice;

    #[test]
    fn test_new_2d_uploads() {
        let mut device = RecordingDevice::new();
        let texture = Texture::new_2d(&mut device, 2, 2, PixelFormat::Rgba, false, &[255; 16]).unwrap();
        let handle = texture.handle().unwrap();

        assert_eq!(texture.channels(), 4);
        assert_eq!(texture.size(), (2, 2));
        assert!(texture.is_square());
        assert!(texture.is_standard());
        assert_eq!(device.bound_texture(TextureTarget::Texture2D), Some(handle));
        assert_eq!(device.texture_image(handle).map(|i| i.width), Some(2));
        assert_eq!(device.texture_params(handle).map(<[_]>::len), Some(DEFAULT_PARAMS.len()));
        assert_eq!(device.calls().first(), Some(&DeviceCall::GenTexture(handle)));
    }

    #[test]
    fn test_shape_queries() {
        let mut device = RecordingDevice::new();
        let odd = Texture::new_2d(&mut device, 3, 3, PixelFormat::Rgb, true, &[0; 27]).unwrap();
        let wide = Texture::new_2d(&mut device, 4, 2, PixelFormat::Rgb, false, &[0; 24]).unwrap();

        assert!(odd.is_square());
        assert!(!odd.is_standard());
        assert!(odd.is_mipmap());
        assert!(!wide.is_square());
        assert_eq!(wide.channels(), 3);
    }

    #[test]
    fn test_3d_texture() {
        let mut device = RecordingDevice::new();
        let texture = Texture::new_3d(&mut device, (2, 2, 2), PixelFormat::Rgb, false, &[7; 24]).unwrap();

        assert_eq!(texture.target(), TextureTarget::Texture3D);
        assert_eq!(texture.depth(), 2);
        assert!(texture.params().contains(&TextureParam::WrapR(WrapMode::Repeat)));
    }

    #[test]
    fn test_data_length_mismatch_rejected() {
        let mut device = RecordingDevice::new();
        let result = Texture::new_2d(&mut device, 2, 2, PixelFormat::Rgb, false, &[0; 16]);

        assert!(matches!(result, Err(RenderError::InvalidConfiguration(_))));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_finalized_texture_is_missing() {
        let mut device = RecordingDevice::new();
        let mut texture = Texture::new_2d(&mut device, 1, 1, PixelFormat::Rgba, false, &[0; 4]).unwrap();

        texture.finalize(&mut device).unwrap();

        assert!(texture.handle().is_none());
        assert_eq!(device.live_textures(), 0);
        assert!(matches!(texture.bind(&mut device), Err(RenderError::MissingResource(_))));
        // A second finalize is a no-op
        texture.finalize(&mut device).unwrap();
    }
}
