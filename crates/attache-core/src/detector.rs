use crate::config::{BoundaryConnector, ConnectorScheme, Settings};
use crate::naming::{BOUNDARY_HASH, BOUNDARY_INDEX, BOUNDARY_LABEL, BOUNDARY_TIME};
use chrono::NaiveDateTime;

/// Decide whether a base name (extension stripped) already matches the
/// canonical shape the naming engine produces for *some* note under
/// the active scheme. Shapes carrying a note-title segment only count
/// when that segment differs from the current note's title; a name
/// carrying the current title falls through to a fresh rename, which
/// keeps the pass idempotent.
///
/// Any shape or content mismatch yields `false` - the safe default,
/// causing a fresh rename rather than a skip.
pub fn is_formatted(stem: &str, note_title: &str, label: &str, settings: &Settings) -> bool {
    match &settings.connector {
        ConnectorScheme::Single { connector } => {
            is_formatted_single(stem, note_title, label, connector)
        }
        ConnectorScheme::Multiple { connectors } => is_formatted_multiple(
            stem,
            note_title,
            label,
            connectors,
            settings.include_time,
            settings.include_path_hash,
            settings.exclude_note_name,
        ),
    }
}

fn is_formatted_single(stem: &str, note_title: &str, label: &str, connector: &str) -> bool {
    let segments: Vec<&str> = stem.split(connector).collect();

    match segments.len() {
        3 => {
            // title/label/index, renamed under another note
            (segments[0] != note_title && segments[1] == label)
                // label/index/time
                || (segments[0] == label && is_timestamp(segments[2]))
                // label/index/hash
                || (segments[0] == label && is_hash(segments[2]))
        }
        4 => {
            // title/label/index/time
            (segments[0] != note_title && segments[1] == label && is_timestamp(segments[3]))
                // title/label/index/hash
                || (segments[0] != note_title && segments[1] == label && is_hash(segments[3]))
            // label/index/time/hash is deliberately not recognized:
            // a fresh rename is the safe outcome for that shape.
        }
        5 => {
            // title/label/index/time/hash
            segments[0] != note_title
                && segments[1] == label
                && is_timestamp(segments[3])
                && is_hash(segments[4])
        }
        _ => false,
    }
}

/// Multiple-connector names cannot be split on one separator, so the
/// expected components are stripped off progressively: title prefix,
/// label, then hash and timestamp from the tail, leaving the index.
fn is_formatted_multiple(
    stem: &str,
    note_title: &str,
    label: &str,
    connectors: &[BoundaryConnector; 4],
    include_time: bool,
    include_hash: bool,
    exclude_note_name: bool,
) -> bool {
    let mut rest = stem;

    if !exclude_note_name {
        let Some(pos) = rest.rfind(label) else {
            return false;
        };
        let mut title = &rest[..pos];
        let boundary = &connectors[BOUNDARY_LABEL];
        if boundary.enabled {
            match title.strip_suffix(boundary.value.as_str()) {
                Some(t) => title = t,
                None => return false,
            }
        }
        if title.is_empty() || title == note_title {
            return false;
        }
        rest = &rest[pos..];
    }

    match rest.strip_prefix(label) {
        Some(r) => rest = r,
        None => return false,
    }

    if include_hash {
        let boundary = &connectors[BOUNDARY_HASH];
        if boundary.enabled {
            let Some(pos) = rest.rfind(boundary.value.as_str()) else {
                return false;
            };
            if !is_hash(&rest[pos + boundary.value.len()..]) {
                return false;
            }
            rest = &rest[..pos];
        } else {
            if rest.len() < 8 || !rest.is_char_boundary(rest.len() - 8) {
                return false;
            }
            let (head, tail) = rest.split_at(rest.len() - 8);
            if !is_hash(tail) {
                return false;
            }
            rest = head;
        }
    }

    if include_time {
        if rest.len() < 14 || !rest.is_char_boundary(rest.len() - 14) {
            return false;
        }
        let (head, tail) = rest.split_at(rest.len() - 14);
        if !is_timestamp(tail) {
            return false;
        }
        rest = head;
        let boundary = &connectors[BOUNDARY_TIME];
        if boundary.enabled {
            match rest.strip_suffix(boundary.value.as_str()) {
                Some(r) => rest = r,
                None => return false,
            }
        }
    }

    let boundary = &connectors[BOUNDARY_INDEX];
    if boundary.enabled {
        match rest.strip_prefix(boundary.value.as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

/// A fixed-width `YYYYMMDDHHMMSS` stamp naming a valid calendar date.
fn is_timestamp(s: &str) -> bool {
    s.len() == 14
        && s.bytes().all(|b| b.is_ascii_digit())
        && NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").is_ok()
}

fn is_hash(s: &str) -> bool {
    s.len() == 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{folder_hash, NamePattern};
    use chrono::{Local, TimeZone};
    use std::path::Path;

    fn single(connector: &str) -> Settings {
        let mut settings = Settings::default();
        settings.connector = ConnectorScheme::Single {
            connector: connector.to_string(),
        };
        settings
    }

    #[test]
    fn recognizes_another_notes_rename() {
        let settings = single("_");
        assert!(is_formatted("OtherNote_image_1", "Trip", "image", &settings));
    }

    #[test]
    fn own_rename_is_not_another_notes() {
        let settings = single("_");
        assert!(!is_formatted("Trip_image_1", "Trip", "image", &settings));
    }

    #[test]
    fn label_mismatch_is_not_formatted() {
        let settings = single("_");
        assert!(!is_formatted("OtherNote_photo_1", "Trip", "image", &settings));
        assert!(!is_formatted("shot 1", "Trip", "image", &settings));
    }

    #[test]
    fn titleless_shapes_need_a_valid_component() {
        let settings = single("_");
        // label/index/time
        assert!(is_formatted("image_1_20260314150926", "Trip", "image", &settings));
        // label/index/hash
        assert!(is_formatted("image_1_a1b2c3d4", "Trip", "image", &settings));
        // month 13 is not a calendar date, and 7 chars are not a hash
        assert!(!is_formatted("image_1_20261301000000", "Trip", "image", &settings));
        assert!(!is_formatted("image_1_a1b2c3d", "Trip", "image", &settings));
    }

    #[test]
    fn four_segment_shapes() {
        let settings = single("_");
        assert!(is_formatted(
            "Other_image_1_20260314150926",
            "Trip",
            "image",
            &settings
        ));
        assert!(is_formatted("Other_image_1_a1b2c3d4", "Trip", "image", &settings));
        // Leap-day handling comes from the calendar parse.
        assert!(is_formatted(
            "Other_image_1_20240229120000",
            "Trip",
            "image",
            &settings
        ));
        assert!(!is_formatted(
            "Other_image_1_20230229120000",
            "Trip",
            "image",
            &settings
        ));
    }

    #[test]
    fn titleless_time_and_hash_shape_is_never_matched() {
        // The four-segment label/index/time/hash shape is resolved to
        // "not formatted": the attachment gets a fresh rename.
        let settings = single("_");
        assert!(!is_formatted(
            "image_1_20260314150926_a1b2c3d4",
            "Trip",
            "image",
            &settings
        ));
    }

    #[test]
    fn five_segment_shape() {
        let settings = single("_");
        assert!(is_formatted(
            "Other_image_1_20260314150926_a1b2c3d4",
            "Trip",
            "image",
            &settings
        ));
        assert!(!is_formatted(
            "Trip_image_1_20260314150926_a1b2c3d4",
            "Trip",
            "image",
            &settings
        ));
    }

    #[test]
    fn built_names_round_trip_through_the_detector() {
        // Every name the engine builds under note A must be recognized
        // when note B inspects it with the same scheme.
        let pass_start = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let configs: &[(bool, bool, bool)] = &[
            (false, false, false),
            (true, false, false),
            (false, true, false),
            (true, true, false),
            (true, false, true),
            (true, true, true),
        ];

        for &(time, hash, exclude) in configs {
            let mut settings = Settings::default();
            settings.include_time = time;
            settings.include_path_hash = hash;
            settings.exclude_note_name = exclude;
            settings.normalize();

            let pattern = NamePattern::new(&settings, pass_start, Path::new("notes"));
            let name = pattern.build("OtherNote", "image", 7, "png");
            let stem = name.strip_suffix(".png").unwrap();

            // The title/time/hash four-segment shape aside, which is
            // deliberately unmatched when titleless:
            let expect = !(exclude && time && hash);
            assert_eq!(
                is_formatted(stem, "Trip", "image", &settings),
                expect,
                "time={} hash={} exclude={} name={}",
                time,
                hash,
                exclude,
                name
            );
        }
    }

    #[test]
    fn multiple_connector_round_trip() {
        let mut settings = Settings::default();
        settings.include_time = true;
        settings.connector = ConnectorScheme::Multiple {
            connectors: [
                BoundaryConnector {
                    value: "-".to_string(),
                    enabled: true,
                },
                BoundaryConnector {
                    value: "_".to_string(),
                    enabled: true,
                },
                BoundaryConnector {
                    value: ".".to_string(),
                    enabled: false,
                },
                BoundaryConnector::default(),
            ],
        };

        let pass_start = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let pattern = NamePattern::new(&settings, pass_start, Path::new(""));
        let name = pattern.build("OtherNote", "image", 2, "png");
        assert_eq!(name, "OtherNote-image_220260314150926.png");

        let stem = name.strip_suffix(".png").unwrap();
        assert!(is_formatted(stem, "Trip", "image", &settings));
        assert!(!is_formatted(stem, "OtherNote", "image", &settings));
    }

    #[test]
    fn multiple_connector_requires_the_expected_pieces() {
        let mut settings = Settings::default();
        settings.include_time = true;
        settings.include_path_hash = true;
        settings.connector = ConnectorScheme::Multiple {
            connectors: Default::default(),
        };

        let hash = folder_hash(Path::new("notes"));
        let good = format!("Other_image_3_20260314150926_{}", hash);
        assert!(is_formatted(&good, "Trip", "image", &settings));

        // Missing timestamp, truncated hash, absent label.
        assert!(!is_formatted("Other_image_3", "Trip", "image", &settings));
        let short = format!("Other_image_3_20260314150926_{}", &hash[..6]);
        assert!(!is_formatted(&short, "Trip", "image", &settings));
        assert!(!is_formatted("Other_3_20260314150926_aabbccdd", "Trip", "photo", &settings));
    }
}
