//! Content directory layouts

use std::path::PathBuf;

/// How an emulator lays out installed NCA content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentLayout {
    /// One directory per content id holding a single file named `00`
    /// (Ryujinx's registered store)
    Registered,
    /// One file per content id (yuzu's NAND contents directory)
    Flat,
}

/// Switch data locations inside an emulator's user directory
#[derive(Debug, Clone)]
pub struct SwitchPaths {
    pub firmware_dir: PathBuf,
    pub key_dir: PathBuf,
    pub layout: ContentLayout,
}

impl SwitchPaths {
    pub fn new(firmware_dir: PathBuf, key_dir: PathBuf, layout: ContentLayout) -> Self {
        Self {
            firmware_dir,
            key_dir,
            layout,
        }
    }
}

/// Content id for a firmware archive entry
///
/// Accepts `<id>.nca` and pre-laid-out `<id>.nca/00` names, with `.cnmt`
/// stripped from the id. Anything else (directories, stray files) yields
/// `None` and is skipped by the installer.
pub(crate) fn nca_id(entry_name: &str) -> Option<String> {
    if !(entry_name.ends_with(".nca") || entry_name.ends_with(".nca/00")) {
        return None;
    }

    let cleaned = entry_name.replace(".cnmt", "");
    let mut components = cleaned.split('/').rev().filter(|c| !c.is_empty());

    let mut id = components.next()?;
    if id == "00" {
        id = components.next()?;
    }
    if !id.contains(".nca") {
        return None;
    }

    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_nca() {
        assert_eq!(nca_id("abcd1234.nca"), Some("abcd1234.nca".to_string()));
    }

    #[test]
    fn test_cnmt_is_stripped() {
        assert_eq!(
            nca_id("abcd1234.cnmt.nca"),
            Some("abcd1234.nca".to_string())
        );
    }

    #[test]
    fn test_prelaid_out_entry() {
        assert_eq!(
            nca_id("abcd1234.nca/00"),
            Some("abcd1234.nca".to_string())
        );
    }

    #[test]
    fn test_nested_path_uses_last_component() {
        assert_eq!(
            nca_id("registered/abcd1234.nca"),
            Some("abcd1234.nca".to_string())
        );
    }

    #[test]
    fn test_foreign_entries_are_rejected() {
        assert_eq!(nca_id("readme.txt"), None);
        assert_eq!(nca_id("some/dir/"), None);
        assert_eq!(nca_id("00"), None);
    }
}
