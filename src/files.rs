use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::gallery::Photo;

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tga", "tiff", "tif", "webp", "ico", "pnm", "pbm",
    "pgm", "ppm", "pam", "dds", "hdr", "exr", "ff", "qoi",
];

fn is_photo_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PHOTO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collects the photo sequence up front. The gallery never grows or shrinks
/// after this: the engine is handed a fixed, sorted list.
pub fn collect_photos(
    paths: &[PathBuf],
    file_list: Option<&PathBuf>,
    recursive: bool,
) -> Vec<Photo> {
    let start_time = Instant::now();
    let mut found: Vec<PathBuf> = Vec::new();

    if let Some(list_path) = file_list {
        match fs::File::open(list_path) {
            Ok(file) => {
                for line in io::BufReader::new(file).lines().map_while(Result::ok) {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let p = PathBuf::from(trimmed);
                    if p.is_file() && is_photo_file(&p) {
                        found.push(p);
                    }
                }
            }
            Err(e) => log::error!("Cannot read file list {}: {}", list_path.display(), e),
        }
    }

    for path in paths {
        if path.is_dir() {
            scan_dir(path, recursive, &mut found);
        } else if path.is_file() && is_photo_file(path) {
            found.push(path.clone());
        } else {
            log::warn!("Skipping {}: not a photo file", path.display());
        }
    }

    found.sort();
    found.dedup();

    let photos: Vec<Photo> = found
        .into_iter()
        .map(|source| {
            let caption = exif_caption(&source);
            Photo { source, caption }
        })
        .collect();

    log::info!(
        "Collected {} photos in {:.2}s",
        photos.len(),
        start_time.elapsed().as_secs_f64()
    );
    photos
}

fn scan_dir(dir: &Path, recursive: bool, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        log::warn!("Cannot read directory {}", dir.display());
        return;
    };
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && is_photo_file(&p) {
            found.push(p);
        } else if recursive && p.is_dir() {
            subdirs.push(p);
        }
    }

    subdirs.sort();
    for sub in subdirs {
        scan_dir(&sub, true, found);
    }
}

/// Caption from the EXIF ImageDescription tag, if the file carries one.
fn exif_caption(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut reader = io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::ImageDescription, exif::In::PRIMARY)?;
    let text = match &field.value {
        exif::Value::Ascii(parts) => parts
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.display_as(exif::Tag::ImageDescription).to_string(),
    };
    let text = text.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// What to show under a photo: its caption, or the file stem as a fallback.
pub fn display_label(photo: &Photo) -> String {
    if let Some(caption) = &photo.caption {
        return caption.clone();
    }
    photo
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter() {
        assert!(is_photo_file(Path::new("a/b/c.JPG")));
        assert!(is_photo_file(Path::new("x.webp")));
        assert!(!is_photo_file(Path::new("x.txt")));
        assert!(!is_photo_file(Path::new("noext")));
    }

    #[test]
    fn label_prefers_caption() {
        let with = Photo {
            source: PathBuf::from("dir/sunset_beach-01.jpg"),
            caption: Some("Sunset".into()),
        };
        let without = Photo {
            source: PathBuf::from("dir/sunset_beach-01.jpg"),
            caption: None,
        };
        assert_eq!(display_label(&with), "Sunset");
        assert_eq!(display_label(&without), "sunset beach 01");
    }
}
