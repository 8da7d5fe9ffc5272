//! Terminal rendering of the pairing QR code.

use qrcode::{Color, QrCode};

/// Light modules kept around the code so scanners find its edges.
const QUIET_ZONE: usize = 2;

/// Render `data` as rows of Unicode half blocks, two module rows per line.
///
/// Returns `None` when the data does not fit in a QR code.
pub fn render_qr_unicode(data: &str) -> Option<String> {
    let code = QrCode::new(data.as_bytes()).ok()?;
    let width = code.width();
    let colors = code.to_colors();

    let size = width + QUIET_ZONE * 2;
    let dark = |x: usize, y: usize| -> bool {
        if x < QUIET_ZONE || y < QUIET_ZONE {
            return false;
        }
        let (cx, cy) = (x - QUIET_ZONE, y - QUIET_ZONE);
        cx < width && cy < width && colors[cy * width + cx] == Color::Dark
    };

    let mut out = String::with_capacity((size + 3) * size.div_ceil(2) * 3);
    for y in (0..size).step_by(2) {
        out.push_str("  ");
        for x in 0..size {
            out.push(match (dark(x, y), dark(x, y + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_half_rows_with_quiet_zone() {
        let text = render_qr_unicode(r#"{"ip":"192.168.1.20","port":8888,"pin":"4821"}"#).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        let code = QrCode::new(br#"{"ip":"192.168.1.20","port":8888,"pin":"4821"}"#).unwrap();
        let size = code.width() + QUIET_ZONE * 2;
        assert_eq!(lines.len(), size.div_ceil(2));
        for line in &lines {
            assert!(line.starts_with("  "));
            assert_eq!(line.chars().count(), size + 2);
        }
        // The first line is all quiet zone.
        assert!(lines[0].trim().is_empty());
        assert!(text.contains('█'));
    }

    #[test]
    fn oversized_data_is_none() {
        let data = "x".repeat(8_000);
        assert!(render_qr_unicode(&data).is_none());
    }
}
