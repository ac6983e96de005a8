use tracing::warn;
use url::Url;

pub const FALLBACK_IMAGES: [&str; 10] = [
    "https://images.unsplash.com/photo-1504674900242-4197e29bdab7?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1512621776951-a57141f2eefd?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1540189549336-e6e99c3679fe?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1567620905732-2d1ec7ab7445?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1565299507177-b0ac66763828?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1551782450-a2132b4ba21d?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1565958011703-44f9829ba187?w=400&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1565299507177-b0ac66763828?w=400&h=600&fit=crop&q=80",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
            quality: 80,
        }
    }
}

/// Rewrites known image hosts to serve a card-sized rendition.
///
/// Unknown hosts and unparsable URLs come back unchanged.
pub fn optimize_image_url(original: &str, size: ImageSize) -> String {
    if original.contains("pinimg.com") {
        return resize_pinterest(original, size);
    }
    if original.contains("unsplash.com") {
        return match resize_unsplash(original, size) {
            Ok(url) => url,
            Err(err) => {
                warn!(url = original, error = %err, "failed to optimize image url");
                original.to_owned()
            }
        };
    }
    original.to_owned()
}

// https://i.pinimg.com/1200x/c1/14/28/hash.jpg -> https://i.pinimg.com/400x600/c1/14/28/hash.jpg
fn resize_pinterest(original: &str, size: ImageSize) -> String {
    let replacement = format!("{}x{}", size.width, size.height);
    let mut parts: Vec<&str> = original.split('/').collect();
    let has_size = parts.get(3).is_some_and(|segment| segment.contains('x'));
    if !has_size {
        return original.to_owned();
    }
    parts[3] = &replacement;
    parts.join("/")
}

fn resize_unsplash(original: &str, size: ImageSize) -> Result<String, url::ParseError> {
    let mut url = Url::parse(original)?;
    let overrides = [
        ("w", size.width.to_string()),
        ("h", size.height.to_string()),
        ("fit", "crop".to_owned()),
        ("q", size.quality.to_string()),
    ];
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !overrides.iter().any(|(name, _)| *name == key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        for (key, value) in &overrides {
            query.append_pair(key, value);
        }
    }
    Ok(url.to_string())
}

/// Picks a stand-in image for a URL that failed to load. The same URL
/// always maps to the same fallback.
pub fn fallback_image(original: &str) -> &'static str {
    let hash = original
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));
    let index = hash.unsigned_abs() as usize % FALLBACK_IMAGES.len();
    FALLBACK_IMAGES[index]
}
