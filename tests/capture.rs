use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use golazo_terminal::capture::{expand_home, load_image_payload};

fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("golazo-capture-{}-{name}", std::process::id()));
    fs::write(&path, bytes).expect("temp file should be writable");
    path
}

#[test]
fn magic_bytes_win_over_extension() {
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    let path = temp_file("header.txt", &png);
    let payload = load_image_payload(path.to_str().expect("utf8 path")).expect("payload loads");
    assert_eq!(payload.mime, "image/png");
    assert_eq!(payload.data, BASE64.encode(png));
    fs::remove_file(path).ok();
}

#[test]
fn extension_fallback_when_header_is_unknown() {
    let path = temp_file("captura.jpg", b"not really a jpeg");
    let payload = load_image_payload(path.to_str().expect("utf8 path")).expect("payload loads");
    assert_eq!(payload.mime, "image/jpeg");
    fs::remove_file(path).ok();
}

#[test]
fn unsupported_file_is_rejected() {
    let path = temp_file("notas.txt", b"plain text");
    assert!(load_image_payload(path.to_str().expect("utf8 path")).is_err());
    fs::remove_file(path).ok();
}

#[test]
fn missing_or_blank_path_is_rejected() {
    assert!(load_image_payload("/no/such/golazo-captura.png").is_err());
    assert!(load_image_payload("   ").is_err());
}

#[test]
fn quoted_path_with_spaces_reaches_the_file() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    let path = temp_file("con espacio.jpeg", &jpeg);
    let quoted = format!("\"{}\"", path.display());
    let payload = load_image_payload(&quoted).expect("quoted path loads");
    assert_eq!(payload.mime, "image/jpeg");
    fs::remove_file(path).ok();
}

#[test]
fn home_expansion_prefixes_home_dir() {
    if let Ok(home) = std::env::var("HOME") {
        assert_eq!(
            expand_home("~/captura.png"),
            PathBuf::from(home).join("captura.png")
        );
    }
    assert_eq!(
        expand_home("/abs/captura.png"),
        PathBuf::from("/abs/captura.png")
    );
}
