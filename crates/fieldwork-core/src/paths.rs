//! Collection path builders
//!
//! Paths are plain `/`-separated strings; a document path is its collection
//! path plus one trailing id segment.

pub const LINKS: &str = "links";

pub fn territories(congregation: &str) -> String {
    format!("congregations/{}/territories", congregation)
}

/// Addresses ("maps") of a congregation.
pub fn maps(congregation: &str) -> String {
    format!("congregations/{}/maps", congregation)
}

/// Units of a congregation. The collection name is historical.
pub fn addresses(congregation: &str) -> String {
    format!("congregations/{}/addresses", congregation)
}

pub fn options(congregation: &str) -> String {
    format!("congregations/{}/options", congregation)
}

pub fn links() -> String {
    LINKS.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(territories("c1"), "congregations/c1/territories");
        assert_eq!(maps("c1"), "congregations/c1/maps");
        assert_eq!(addresses("c1"), "congregations/c1/addresses");
        assert_eq!(options("c1"), "congregations/c1/options");
        assert_eq!(links(), "links");
    }
}
