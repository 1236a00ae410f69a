//! YOLO label files: one line per box,
//! `<class> <x_center> <y_center> <width> <height>`, coordinates normalized
//! to the image size and written with six fractional digits.

use crate::error::SprucelabelError;
use crate::model::{AnnotationRecord, YoloBox};

/// A label line read back from a YOLO label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedLabel {
    pub class_id: u8,
    pub bbox: YoloBox,
}

/// Encodes one image's annotations as a YOLO label file.
///
/// Lines keep the input order and are joined with `\n` without a trailing
/// newline, so an image with no annotations yields an empty string. A
/// `label_class` of `None` is written as class `0`.
///
/// `image_width` and `image_height` must be non-zero.
pub fn encode_labels(
    annotations: &[AnnotationRecord],
    image_width: u32,
    image_height: u32,
) -> String {
    annotations
        .iter()
        .map(|ann| {
            let b = ann.bbox.to_yolo(image_width, image_height);
            format!(
                "{} {:.6} {:.6} {:.6} {:.6}",
                ann.label_class.unwrap_or(0),
                b.x_center,
                b.y_center,
                b.width,
                b.height
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads a YOLO label file back into classes and normalized boxes.
///
/// Blank lines are skipped. Anything else must be exactly five tokens.
pub fn decode_labels(content: &str) -> Result<Vec<DecodedLabel>, SprucelabelError> {
    let mut labels = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(label) = parse_label_line(line, line_idx + 1)? {
            labels.push(label);
        }
    }
    Ok(labels)
}

fn parse_label_line(line: &str, line_num: usize) -> Result<Option<DecodedLabel>, SprucelabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        return Err(SprucelabelError::YoloLabelParse {
            line: line_num,
            message: if tokens.len() < 5 {
                format!("expected 5 tokens, found {}", tokens.len())
            } else {
                "expected 5 tokens, found more; only bounding boxes are supported".to_string()
            },
        });
    }

    let class_id = tokens[0]
        .parse::<u8>()
        .map_err(|_| SprucelabelError::YoloLabelParse {
            line: line_num,
            message: format!("invalid class '{}'; expected integer 0-255", tokens[0]),
        })?;

    Ok(Some(DecodedLabel {
        class_id,
        bbox: YoloBox {
            x_center: parse_f64_token(tokens[1], "x_center", line_num)?,
            y_center: parse_f64_token(tokens[2], "y_center", line_num)?,
            width: parse_f64_token(tokens[3], "width", line_num)?,
            height: parse_f64_token(tokens[4], "height", line_num)?,
        },
    }))
}

fn parse_f64_token(raw: &str, field_name: &str, line_num: usize) -> Result<f64, SprucelabelError> {
    raw.parse::<f64>()
        .map_err(|_| SprucelabelError::YoloLabelParse {
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Fuzz-only entrypoint for YOLO single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), SprucelabelError> {
    let _ = parse_label_line(input, 1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PixelBox;

    fn ann(id: u64, bbox: PixelBox, class: Option<u8>) -> AnnotationRecord {
        AnnotationRecord::new(id, 1u64, bbox).with_label_class(class)
    }

    #[test]
    fn encodes_reference_line() {
        let anns = vec![ann(1, PixelBox::new(100, 200, 50, 60), Some(2))];
        assert_eq!(
            encode_labels(&anns, 1000, 800),
            "2 0.125000 0.287500 0.050000 0.075000"
        );
    }

    #[test]
    fn empty_annotations_encode_to_empty_string() {
        assert_eq!(encode_labels(&[], 640, 480), "");
    }

    #[test]
    fn preserves_order_without_trailing_newline() {
        let anns = vec![
            ann(5, PixelBox::new(0, 0, 10, 10), Some(1)),
            ann(2, PixelBox::new(50, 50, 10, 10), Some(0)),
        ];
        let text = encode_labels(&anns, 100, 100);

        assert!(!text.ends_with('\n'));
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(
            lines,
            vec![
                "1 0.050000 0.050000 0.100000 0.100000",
                "0 0.550000 0.550000 0.100000 0.100000"
            ]
        );
    }

    #[test]
    fn missing_class_is_written_as_zero() {
        let anns = vec![ann(1, PixelBox::new(0, 0, 10, 10), None)];
        assert!(encode_labels(&anns, 100, 100).starts_with("0 "));
    }

    #[test]
    fn decode_reads_encoded_lines() {
        let anns = vec![ann(1, PixelBox::new(100, 200, 50, 60), Some(2))];
        let decoded = decode_labels(&encode_labels(&anns, 1000, 800)).expect("decode");

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].class_id, 2);
        let (x, y, w, h) = decoded[0].bbox.to_pixel(1000, 800);
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 200.0).abs() < 1e-3);
        assert!((w - 50.0).abs() < 1e-3);
        assert!((h - 60.0).abs() < 1e-3);
    }

    #[test]
    fn decode_skips_blank_lines() {
        let decoded = decode_labels("\n0 0.5 0.5 0.1 0.1\n   \n").expect("decode");
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn decode_rejects_short_and_long_rows() {
        let err = decode_labels("0 0.1 0.2").unwrap_err();
        assert!(matches!(err, SprucelabelError::YoloLabelParse { line: 1, .. }));

        let err = decode_labels("0 0.5 0.5 0.1 0.1\n0 0.1 0.2 0.3 0.4 0.5").unwrap_err();
        assert!(matches!(err, SprucelabelError::YoloLabelParse { line: 2, .. }));
    }

    #[test]
    fn decode_rejects_bad_tokens() {
        assert!(decode_labels("x 0.1 0.2 0.3 0.4").is_err());
        assert!(decode_labels("-1 0.1 0.2 0.3 0.4").is_err());
        assert!(decode_labels("0 0.1 abc 0.3 0.4").is_err());
    }
}
