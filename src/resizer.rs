//! ラスタ画像のリサイズ/切り抜きプリミティブ
//!
//! `open → resize/crop → save` のチェーンでサムネイル生成と
//! 編集セッションの両方から使われる。

use crate::error::Result;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use std::path::Path;

/// リサイズモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// 枠内に収まるよう縦横比を維持して縮小
    Auto,
    /// 枠を埋めるよう縮小して中央で切り抜き
    Crop,
    /// 縦横比を無視して指定寸法に強制
    Exact,
}

impl std::str::FromStr for ResizeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ResizeMode::Auto),
            "crop" => Ok(ResizeMode::Crop),
            "exact" => Ok(ResizeMode::Exact),
            _ => Err(format!("Unknown resize mode: {}. Use auto, crop, or exact", s)),
        }
    }
}

impl std::fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResizeMode::Auto => write!(f, "auto"),
            ResizeMode::Crop => write!(f, "crop"),
            ResizeMode::Exact => write!(f, "exact"),
        }
    }
}

pub struct Resizer {
    image: DynamicImage,
}

impl Resizer {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            image: image::open(path)?,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 指定寸法へリサイズする
    ///
    /// 片方が0の場合はもう片方を基準に縦横比から算出する。
    pub fn resize(mut self, width: u32, height: u32, mode: ResizeMode) -> Self {
        if width == 0 && height == 0 {
            return self;
        }

        self.image = match (width, height) {
            (w, 0) => self.image.resize(w, u32::MAX, FilterType::Lanczos3),
            (0, h) => self.image.resize(u32::MAX, h, FilterType::Lanczos3),
            (w, h) => match mode {
                ResizeMode::Auto => self.image.resize(w, h, FilterType::Lanczos3),
                ResizeMode::Crop => self.image.resize_to_fill(w, h, FilterType::Lanczos3),
                ResizeMode::Exact => self.image.resize_exact(w, h, FilterType::Lanczos3),
            },
        };

        self
    }

    /// 指定範囲を切り抜き、目標寸法へリサイズする
    pub fn crop(
        mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        self.image = self.image.crop_imm(x, y, width, height);

        if (target_width, target_height) != (width, height) {
            self.image = self
                .image
                .resize_exact(target_width, target_height, FilterType::Lanczos3);
        }

        self
    }

    /// 拡張子に応じた形式で保存する
    ///
    /// JPEGはアルファ非対応のためRGBへ落としてから書き出す。
    pub fn save(&self, path: &Path) -> Result<()> {
        let is_jpeg = path
            .extension()
            .map(|e| {
                let e = e.to_string_lossy().to_lowercase();
                e == "jpg" || e == "jpeg"
            })
            .unwrap_or(false);

        if is_jpeg {
            DynamicImage::ImageRgb8(self.image.to_rgb8()).save(path)?;
        } else {
            self.image.save(path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_resize_auto_fits_box() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        write_png(&src, 400, 200);

        let resizer = Resizer::open(&src).unwrap().resize(100, 100, ResizeMode::Auto);
        assert_eq!(resizer.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_crop_fills_box() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        write_png(&src, 400, 200);

        let resizer = Resizer::open(&src).unwrap().resize(100, 100, ResizeMode::Crop);
        assert_eq!(resizer.dimensions(), (100, 100));
    }

    #[test]
    fn test_resize_exact_ignores_ratio() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        write_png(&src, 400, 200);

        let resizer = Resizer::open(&src).unwrap().resize(80, 120, ResizeMode::Exact);
        assert_eq!(resizer.dimensions(), (80, 120));
    }

    #[test]
    fn test_resize_single_axis() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        write_png(&src, 400, 200);

        let resizer = Resizer::open(&src).unwrap().resize(100, 0, ResizeMode::Auto);
        assert_eq!(resizer.dimensions(), (100, 50));
    }

    #[test]
    fn test_crop_bounds() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        write_png(&src, 400, 200);

        let resizer = Resizer::open(&src).unwrap().crop(10, 10, 50, 40, 50, 40);
        assert_eq!(resizer.dimensions(), (50, 40));
    }

    #[test]
    fn test_save_jpeg_from_alpha() {
        let dir = tempdir().expect("Failed to create temp dir");
        let src = dir.path().join("src.png");
        image::RgbaImage::new(20, 20).save(&src).unwrap();

        let dest = dir.path().join("out.jpg");
        Resizer::open(&src).unwrap().save(&dest).unwrap();
        assert!(dest.is_file());
    }
}
