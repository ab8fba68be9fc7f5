//! ID3 tag container handling for the produced MP3.

use id3::frame::{Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;

use crate::download::error::FetchError;
use crate::download::thumbnail::detect_image_format;

/// Opens the file's tag, or starts an empty one if the file has no header yet.
fn open_or_init(path: &Path) -> Result<Tag, id3::Error> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(Tag::new()),
        Err(e) => Err(e),
    }
}

fn apply_title_artist(mut tag: Tag, path: &Path, title: &str, artist: &str) -> Result<(), id3::Error> {
    tag.set_title(title);
    tag.set_artist(artist);
    tag.write_to_path(path, Version::Id3v24)
}

/// Writes title and artist into the file's tag container.
///
/// A failed first attempt is retried once with a freshly initialized tag,
/// which replaces an unreadable header. A second failure is `TaggingFailed`.
pub fn write_title_artist(path: &Path, title: &str, artist: &str) -> Result<(), FetchError> {
    let first = open_or_init(path).and_then(|tag| apply_title_artist(tag, path, title, artist));

    match first {
        Ok(()) => Ok(()),
        Err(first_err) => {
            log::warn!(
                "Tag write failed for {} ({}), retrying with a new tag",
                path.display(),
                first_err
            );
            apply_title_artist(Tag::new(), path, title, artist)
                .map_err(|e| FetchError::TaggingFailed(format!("{} (first attempt: {})", e, first_err)))
        }
    }
}

/// Embeds `image` as the front-cover picture, replacing any previous one.
pub fn embed_cover_art(path: &Path, image: &[u8]) -> Result<(), id3::Error> {
    let mut tag = open_or_init(path)?;
    tag.remove_picture_by_type(PictureType::CoverFront);
    tag.add_frame(Picture {
        mime_type: detect_image_format(image).mime_type().to_string(),
        picture_type: PictureType::CoverFront,
        description: "Cover".to_string(),
        data: image.to_vec(),
    });
    tag.write_to_path(path, Version::Id3v24)
}

/// Title and artist as stored in the file's tag.
pub fn read_title_artist(path: &Path) -> Result<(Option<String>, Option<String>), id3::Error> {
    let tag = Tag::read_from_path(path)?;
    Ok((tag.title().map(str::to_string), tag.artist().map(str::to_string)))
}

/// Raw bytes of the embedded front cover, if any.
pub fn read_cover_art(path: &Path) -> Result<Option<Vec<u8>>, id3::Error> {
    let tag = Tag::read_from_path(path)?;
    let cover = tag
        .pictures()
        .find(|picture| picture.picture_type == PictureType::CoverFront)
        .map(|picture| picture.data.clone());
    Ok(cover)
}
