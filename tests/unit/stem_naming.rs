//! Unit tests for image filename stems

use reddit_images::output::{sanitize_title, stem_of_file_name, DownloadStem};
use reddit_images::{GalleryItem, Post};
use std::path::Path;

fn post(title: &str, created: f64, id: &str) -> Post {
    Post {
        title: title.to_string(),
        author: "someone".to_string(),
        external_url: String::new(),
        overridden_url: String::new(),
        created_at: created,
        id: id.to_string(),
    }
}

#[test]
fn test_sanitized_titles_are_filename_safe() {
    let titles = [
        "Sunset over the bay",
        "../../etc/passwd",
        "C:\\Windows\\System32",
        "what? <really> \"yes\" | no; a,b *",
        "Café au lait ☕ with friends and a very long tail",
        "\t\n\r",
        "",
        "???",
    ];

    for title in titles {
        let short = sanitize_title(title);
        assert!(!short.is_empty(), "{title:?}");
        assert!(short.len() <= 32, "{title:?} -> {short:?}");
        assert!(
            short
                .chars()
                .all(|c| c.is_ascii() && !c.is_ascii_control() && c != ' '),
            "{title:?} -> {short:?}"
        );
        for forbidden in ['/', '\\', ':', '*', '?', '"', '<', '>', '|', ',', ';'] {
            assert!(!short.contains(forbidden), "{title:?} -> {short:?}");
        }
    }
}

#[test]
fn test_empty_title_gets_placeholder() {
    assert_eq!(sanitize_title(""), "unnamed_file");
    assert_eq!(sanitize_title("<>|"), "unnamed_file");
}

#[test]
fn test_multibyte_title_is_cut_on_char_boundary() {
    // 31 ASCII bytes then a 2-byte char straddling the limit
    let title = format!("{}é and more", "a".repeat(31));
    assert_eq!(sanitize_title(&title), "a".repeat(31));
}

#[test]
fn test_stem_is_deterministic() {
    let p = post("Morning fog: lake", 1700000123.9, "18abc");

    let first = DownloadStem::for_post(&p);
    let second = DownloadStem::for_post(&p.clone());

    assert_eq!(first, second);
    assert_eq!(first.as_str(), "1700000123_Morning-fog-lake_18abc");
}

#[test]
fn test_gallery_stems_use_media_id() {
    let p = post("Album", 1700000000.0, "g1");
    let a = GalleryItem {
        media_id: "m1".to_string(),
        mime_type: "image/png".to_string(),
    };
    let b = GalleryItem {
        media_id: "m2".to_string(),
        mime_type: "image/png".to_string(),
    };

    let stem_a = DownloadStem::for_gallery_item(&p, &a);
    let stem_b = DownloadStem::for_gallery_item(&p, &b);

    assert_eq!(stem_a.as_str(), "1700000000_Album_m1");
    assert_ne!(stem_a, stem_b);
}

#[test]
fn test_file_name_and_stem_round_trip() {
    let stem = DownloadStem::new(1, "a.b", "c");
    let name = stem.file_name("jpg");

    assert_eq!(name, "1_a.b_c.jpg");
    assert_eq!(stem_of_file_name(&name), stem.as_str());
    assert_eq!(
        stem.path_in(Path::new("subreddits/pics"), "jpg"),
        Path::new("subreddits/pics/1_a.b_c.jpg")
    );
}
