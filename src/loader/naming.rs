//! Mesh-name conventions: which nodes are doors and what label a node gets
//! in the destination list.

/// Raw names this short are never destinations.
pub const MIN_ANCHOR_NAME_LEN: usize = 2;

/// What a mesh node is used for, derived from its name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRoles {
    /// Every mesh is walkable.
    pub ground: bool,
    pub door: bool,
    /// Human label if the node should become a destination.
    pub anchor_label: Option<String>,
}

/// Turn a raw node identifier into a display label.
///
/// Underscores and hyphens become spaces, digits are dropped, runs of
/// whitespace collapse to one space and the result is trimmed:
/// `"Room_12B"` becomes `"Room B"`.
#[must_use]
pub fn format_label(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive "door" substring match.
#[must_use]
pub fn is_door_name(raw: &str) -> bool {
    raw.to_lowercase().contains("door")
}

#[must_use]
pub fn classify(raw: &str) -> MeshRoles {
    let anchor_label = (raw.chars().count() > MIN_ANCHOR_NAME_LEN)
        .then(|| format_label(raw))
        .filter(|label| !label.is_empty());
    MeshRoles { ground: true, door: is_door_name(raw), anchor_label }
}

/// Key used to decide whether two labels name the same place.
#[must_use]
pub fn label_key(label: &str) -> String {
    label.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_room_names() {
        assert_eq!(format_label("Room_12B"), "Room B");
        assert_eq!(format_label("Door_01"), "Door");
        assert_eq!(format_label("  main--hall__2 "), "main hall");
        assert_eq!(format_label("1234"), "");
    }

    #[test]
    fn door_match_is_case_insensitive() {
        assert!(is_door_name("FrontDOOR_2"));
        assert!(is_door_name("indoor_plant"));
        assert!(!is_door_name("Window_3"));
    }

    #[test]
    fn short_or_numeric_names_are_not_anchors() {
        assert_eq!(classify("A1").anchor_label, None);
        assert_eq!(classify("007").anchor_label, None);
        assert_eq!(classify("Lab").anchor_label.as_deref(), Some("Lab"));
        assert!(classify("A1").ground);
    }

    #[test]
    fn doors_are_also_anchors() {
        let roles = classify("Door_01");
        assert!(roles.door);
        assert_eq!(roles.anchor_label.as_deref(), Some("Door"));
    }
}
